// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: points, quadrilaterals, detections, and the guidance
// states shown to the person holding the camera.

use serde::{Deserialize, Serialize};

/// Hint shown when no rectangle was found (or the frame could not be used).
pub const HINT_NO_DETECTION: &str = "Can't Detect Rectangle: Change background Or Adjust Angle";
/// Hint for a quadrilateral whose top edge is short.
pub const HINT_TOO_FAR: &str = "Move Closer";
/// Hint for a quadrilateral whose top edge spans almost the whole frame.
pub const HINT_TOO_CLOSE: &str = "Move Away";
/// Hint for a quadrilateral whose top and bottom edges differ too much.
pub const HINT_SKEWED: &str = "Adjust Angle";
/// Hint for a quadrilateral that is ready to capture.
pub const HINT_READY: &str = "Hold still and Capture";

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Four-corner polygon approximating a detected document edge.
///
/// Detector output is normalized to the unit square with the origin at the
/// bottom-left of the frame, so "top" corners have the larger `y`. No
/// convexity invariant is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Quadrilateral {
    pub fn new(top_left: Point, top_right: Point, bottom_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Build from eight coordinates in `TL, TR, BL, BR` order.
    pub fn from_coords(coords: [f32; 8]) -> Self {
        Self::new(
            Point::new(coords[0], coords[1]),
            Point::new(coords[2], coords[3]),
            Point::new(coords[4], coords[5]),
            Point::new(coords[6], coords[7]),
        )
    }

    /// Corners in perimeter order: `[TL, TR, BR, BL]`.
    pub fn perimeter(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Length of the top edge (`TL`–`TR`).
    pub fn distance_top(&self) -> f32 {
        self.top_left.distance_to(self.top_right)
    }

    /// Length of the bottom edge (`BL`–`BR`).
    pub fn distance_bottom(&self) -> f32 {
        self.bottom_left.distance_to(self.bottom_right)
    }

    /// Length of the left edge (`TL`–`BL`).
    pub fn distance_left(&self) -> f32 {
        self.top_left.distance_to(self.bottom_left)
    }

    /// Length of the right edge (`TR`–`BR`).
    pub fn distance_right(&self) -> f32 {
        self.top_right.distance_to(self.bottom_right)
    }

    pub fn is_finite(&self) -> bool {
        self.perimeter().iter().all(Point::is_finite)
    }

    /// Apply `f` to every corner.
    pub fn map(&self, f: impl Fn(Point) -> Point) -> Self {
        Self::new(
            f(self.top_left),
            f(self.top_right),
            f(self.bottom_left),
            f(self.bottom_right),
        )
    }

    /// Scale normalized corners by the frame extent, staying in the
    /// detector's bottom-left-origin convention.
    pub fn scaled(&self, width: f32, height: f32) -> Self {
        self.map(|p| Point::new(p.x * width, p.y * height))
    }

    /// Scale normalized corners into raster pixel coordinates (row 0 at the
    /// top of the image).
    pub fn to_raster(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        self.scaled(w, h).map(|p| Point::new(p.x, h - p.y))
    }

    /// Convert raster pixel corners (row 0 at the top) back to the normalized
    /// bottom-left convention.
    pub fn from_raster(raster: &Quadrilateral, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        raster.map(|p| Point::new(p.x / w, (h - p.y) / h))
    }

    /// Axis-aligned bounding box of the corners, in the same coordinate
    /// space as the corners.
    pub fn bounding_box(&self) -> NormalizedRect {
        let corners = self.perimeter();
        let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        NormalizedRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

/// Axis-aligned rectangle with a bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    /// Scale to a view of `view_width` x `view_height` and flip to a
    /// top-left origin, the way overlays are laid out on screen.
    pub fn to_display(&self, view_width: f32, view_height: f32) -> DisplayRect {
        DisplayRect {
            x: self.x * view_width,
            y: view_height - (self.y + self.height) * view_height,
            width: self.width * view_width,
            height: self.height * view_height,
        }
    }
}

/// Overlay rectangle in display coordinates (top-left origin, view units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A single observation from the upstream rectangle detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Corners in the normalized bottom-left convention.
    pub quad: Quadrilateral,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Discrete feedback label shown to help align the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuidanceState {
    NoDetection,
    TooClose,
    TooFar,
    Skewed,
    Ready,
}

impl GuidanceState {
    /// Human-readable hint for this state.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::NoDetection => HINT_NO_DETECTION,
            Self::TooClose => HINT_TOO_CLOSE,
            Self::TooFar => HINT_TOO_FAR,
            Self::Skewed => HINT_SKEWED,
            Self::Ready => HINT_READY,
        }
    }

    /// Colour tag used by the overlay renderer.
    pub fn color(&self) -> ColorTag {
        match self {
            Self::Ready => ColorTag::Affirmative,
            _ => ColorTag::Warning,
        }
    }
}

impl std::fmt::Display for GuidanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoDetection => "no-detection",
            Self::TooClose => "too-close",
            Self::TooFar => "too-far",
            Self::Skewed => "skewed",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Display colour tag (red/green in the camera overlay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorTag {
    Warning,
    Affirmative,
}

/// Outcome of classifying one frame's quadrilateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub state: GuidanceState,
    pub hint: String,
    pub color: ColorTag,
}

impl ClassificationResult {
    pub fn new(state: GuidanceState) -> Self {
        Self {
            state,
            hint: state.hint().to_string(),
            color: state.color(),
        }
    }

    pub fn no_detection() -> Self {
        Self::new(GuidanceState::NoDetection)
    }

    /// Whether a capture may be taken on this frame.
    pub fn has_detection(&self) -> bool {
        self.state != GuidanceState::NoDetection
    }
}

/// Everything the overlay renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameGuidance {
    /// Sequence number of the frame this guidance belongs to.
    pub sequence: u64,
    pub result: ClassificationResult,
    /// Bounding box of the detection in normalized bottom-left coordinates.
    /// The renderer maps it to its view with [`NormalizedRect::to_display`].
    pub bounds: Option<NormalizedRect>,
}

impl FrameGuidance {
    /// Overlay rectangle for a view of the given size, if anything was
    /// detected.
    pub fn display_bounds(&self, view_width: f32, view_height: f32) -> Option<DisplayRect> {
        self.bounds
            .map(|bounds| bounds.to_display(view_width, view_height))
    }
}
