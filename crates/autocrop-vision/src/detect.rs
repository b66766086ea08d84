// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CPU rectangle detector — finds a single document-like quadrilateral with
// edge detection and the Hough line transform, for platforms without a
// native vision framework.

use autocrop_bridge::RectangleDetector;
use autocrop_core::error::{AutoCropError, Result};
use autocrop_core::{Detection, DetectorConfig, Point, Quadrilateral};
use image::{GrayImage, RgbaImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use tracing::{debug, instrument, trace};

use crate::geometry::{aspect_ratio, ensure_non_degenerate, max_right_angle_deviation};

const BLUR_SIGMA: f32 = 2.0;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const SUPPRESSION_RADIUS: u32 = 8;
const MIN_VOTES: u32 = 30;
/// Distance in pixels within which an edge pixel supports a perimeter sample.
const SUPPORT_RADIUS: i64 = 2;
/// Spacing in pixels between perimeter samples.
const SAMPLE_SPACING: f32 = 2.0;
/// Corners may sit this many pixels outside the frame (Hough quantization).
const CORNER_MARGIN: f32 = 3.0;

/// Rectangle detector built on Canny edges and Hough lines.
///
/// ## Pipeline
///
/// 1. Convert to grayscale
/// 2. Gaussian blur (sigma 2.0) for noise reduction
/// 3. Canny edge detection
/// 4. Hough line detection; the vote threshold follows the shortest side the
///    configuration accepts
/// 5. Split lines into roughly horizontal and roughly vertical families
/// 6. Take the outermost line of each family on each side
/// 7. Intersect them pairwise to get four corners
/// 8. Reject candidates outside the configured aspect ratio, size,
///    quadrature, and confidence limits
///
/// Confidence is the fraction of perimeter samples that lie on (or within two
/// pixels of) a Canny edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoughDetector {
    config: DetectorConfig,
}

/// Which family a Hough line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineFamily {
    Horizontal,
    Vertical,
}

impl HoughDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run the pipeline and return at most one detection, in normalized
    /// bottom-left coordinates.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn find_rectangle(&self, frame: &RgbaImage) -> Option<Detection> {
        let (w, h) = frame.dimensions();
        let min_side = self.config.min_size * w.min(h) as f32;

        let gray = image::imageops::grayscale(frame);
        let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
        let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);

        // A side of length L collects roughly L votes; allow some slack for
        // corners rounded by the blur.
        let vote_threshold = ((min_side * 0.75) as u32).max(MIN_VOTES);
        let options = LineDetectionOptions {
            vote_threshold,
            suppression_radius: SUPPRESSION_RADIUS,
        };
        let lines = detect_lines(&edges, options);
        debug!(line_count = lines.len(), vote_threshold, "Hough lines detected");

        let (horizontal, vertical) = split_families(&lines);
        if horizontal.len() < 2 || vertical.len() < 2 {
            debug!(
                horizontal = horizontal.len(),
                vertical = vertical.len(),
                "Insufficient horizontal/vertical lines"
            );
            return None;
        }

        let center = (w as f32 / 2.0, h as f32 / 2.0);
        let (top, bottom) = outermost(&horizontal, LineFamily::Horizontal, center)?;
        let (left, right) = outermost(&vertical, LineFamily::Vertical, center)?;

        let raster = Quadrilateral::new(
            intersect_polar_lines(&top, &left)?,
            intersect_polar_lines(&top, &right)?,
            intersect_polar_lines(&bottom, &left)?,
            intersect_polar_lines(&bottom, &right)?,
        );
        debug!(
            top_left = ?raster.top_left,
            top_right = ?raster.top_right,
            bottom_right = ?raster.bottom_right,
            bottom_left = ?raster.bottom_left,
            "Quadrilateral corners computed"
        );

        if !self.accepts(&raster, w, h) {
            return None;
        }

        let confidence = edge_support(&edges, &raster);
        if confidence < self.config.min_confidence {
            debug!(confidence, min = self.config.min_confidence, "Confidence below minimum");
            return None;
        }

        Some(Detection {
            quad: Quadrilateral::from_raster(&raster, w, h),
            confidence,
        })
    }

    /// Apply the geometric tuning limits to a candidate in raster pixels.
    fn accepts(&self, raster: &Quadrilateral, width: u32, height: u32) -> bool {
        let inside = raster.perimeter().iter().all(|p| {
            p.x >= -CORNER_MARGIN
                && p.y >= -CORNER_MARGIN
                && p.x <= width as f32 + CORNER_MARGIN
                && p.y <= height as f32 + CORNER_MARGIN
        });
        if !inside {
            debug!("Corners fall outside the frame");
            return false;
        }
        if ensure_non_degenerate(raster).is_err() {
            debug!("Degenerate corner layout");
            return false;
        }

        let ratio = aspect_ratio(raster);
        if ratio < self.config.min_aspect_ratio || ratio > self.config.max_aspect_ratio {
            debug!(ratio, "Aspect ratio out of range");
            return false;
        }

        let shortest = [
            raster.distance_top(),
            raster.distance_bottom(),
            raster.distance_left(),
            raster.distance_right(),
        ]
        .into_iter()
        .fold(f32::INFINITY, f32::min);
        let min_side = self.config.min_size * width.min(height) as f32;
        if shortest < min_side {
            debug!(shortest, min_side, "Quadrilateral too small");
            return false;
        }

        let deviation = max_right_angle_deviation(raster);
        if deviation > self.config.quadrature_tolerance_deg {
            debug!(deviation, "Corner angles too far from square");
            return false;
        }
        true
    }
}

impl RectangleDetector for HoughDetector {
    fn name(&self) -> &str {
        "hough"
    }

    fn detect(&self, frame: &RgbaImage) -> Result<Option<Detection>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(AutoCropError::DetectionFailed("frame has zero extent".into()));
        }
        Ok(self.find_rectangle(frame))
    }
}

/// Split Hough lines into roughly horizontal and roughly vertical families.
///
/// `angle_in_degrees` is the angle of the line's normal, so a normal near 90
/// degrees is a horizontal line and a normal near 0 or 180 degrees is a
/// vertical one. Lines within 30 degrees of either axis are kept; the rest
/// are discarded.
fn split_families(lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for line in lines {
        let angle = line.angle_in_degrees;
        if (60..=120).contains(&angle) {
            horizontal.push(*line);
        } else if angle <= 30 || angle >= 150 {
            vertical.push(*line);
        }
    }

    (horizontal, vertical)
}

/// Where a line crosses the frame's centre column (horizontal lines) or
/// centre row (vertical lines).
fn position(line: &PolarLine, family: LineFamily, center: (f32, f32)) -> f32 {
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    match family {
        // x cos + y sin = r, solved for y at x = cx. sin >= sin(60).
        LineFamily::Horizontal => (line.r - center.0 * cos) / sin,
        // Solved for x at y = cy. |cos| >= cos(30).
        LineFamily::Vertical => (line.r - center.1 * sin) / cos,
    }
}

/// The lines with the smallest and largest crossing position.
fn outermost(
    lines: &[PolarLine],
    family: LineFamily,
    center: (f32, f32),
) -> Option<(PolarLine, PolarLine)> {
    let by_position = |a: &&PolarLine, b: &&PolarLine| {
        position(a, family, center).total_cmp(&position(b, family, center))
    };
    let first = lines.iter().min_by(by_position)?;
    let last = lines.iter().max_by(by_position)?;
    trace!(?family, first = ?first, last = ?last, "Outermost lines");
    Some((*first, *last))
}

/// Compute the intersection of two lines given in polar (Hough) form.
///
/// A `PolarLine` with parameters `(r, theta)` represents the line
///   `x * cos(theta) + y * sin(theta) = r`
///
/// Returns `None` if the lines are (nearly) parallel.
fn intersect_polar_lines(a: &PolarLine, b: &PolarLine) -> Option<Point> {
    let theta_a = (a.angle_in_degrees as f64).to_radians();
    let theta_b = (b.angle_in_degrees as f64).to_radians();

    let (sin_a, cos_a) = theta_a.sin_cos();
    let (sin_b, cos_b) = theta_b.sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let r_a = a.r as f64;
    let r_b = b.r as f64;

    let x = (r_a * sin_b - r_b * sin_a) / denom;
    let y = (r_b * cos_a - r_a * cos_b) / denom;

    Some(Point::new(x as f32, y as f32))
}

/// Fraction of evenly spaced perimeter samples with an edge pixel nearby.
fn edge_support(edges: &GrayImage, quad: &Quadrilateral) -> f32 {
    let (w, h) = edges.dimensions();
    let corners = quad.perimeter();
    let mut total = 0u32;
    let mut hits = 0u32;

    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let steps = (a.distance_to(b) / SAMPLE_SPACING).ceil().max(1.0) as u32;
        for s in 0..steps {
            let t = s as f32 / steps as f32;
            let x = (a.x + (b.x - a.x) * t).round() as i64;
            let y = (a.y + (b.y - a.y) * t).round() as i64;
            total += 1;

            let supported = (-SUPPORT_RADIUS..=SUPPORT_RADIUS).any(|dy| {
                (-SUPPORT_RADIUS..=SUPPORT_RADIUS).any(|dx| {
                    let (px, py) = (x + dx, y + dy);
                    px >= 0
                        && py >= 0
                        && px < w as i64
                        && py < h as i64
                        && edges.get_pixel(px as u32, py as u32).0[0] > 0
                })
            });
            if supported {
                hits += 1;
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        hits as f32 / total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    /// Dark frame with a bright axis-aligned rectangle spanning
    /// `x0..x1` x `y0..y1` (raster coordinates).
    fn synthetic_frame(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Rgba([240, 240, 240, 255])
            } else {
                Rgba([30, 30, 30, 255])
            }
        })
    }

    #[test]
    fn blank_frame_has_no_detection() {
        let frame = RgbaImage::from_pixel(200, 300, Rgba([200, 200, 200, 255]));
        let detector = HoughDetector::default();
        assert!(detector.detect(&frame).expect("detect").is_none());
    }

    #[test]
    fn empty_frame_is_a_detection_failure() {
        let detector = HoughDetector::default();
        assert!(matches!(
            detector.detect(&RgbaImage::new(0, 0)),
            Err(AutoCropError::DetectionFailed(_))
        ));
    }

    #[test]
    fn finds_synthetic_rectangle() {
        let (w, h) = (240u32, 200u32);
        let frame = synthetic_frame(w, h, 40, 50, 200, 150);
        let detection = HoughDetector::default()
            .detect(&frame)
            .expect("detect")
            .expect("rectangle should be found");

        let tol = 0.03;
        let quad = detection.quad;
        // Raster (40, 50) is normalized (0.167, 0.75) with a bottom-left origin.
        assert!((quad.top_left.x - 40.0 / 240.0).abs() < tol, "{quad:?}");
        assert!((quad.top_left.y - 0.75).abs() < tol, "{quad:?}");
        assert!((quad.top_right.x - 200.0 / 240.0).abs() < tol, "{quad:?}");
        assert!((quad.bottom_left.y - 0.25).abs() < tol, "{quad:?}");
        assert!((quad.bottom_right.x - 200.0 / 240.0).abs() < tol, "{quad:?}");
        assert!(detection.confidence >= 0.6, "confidence {}", detection.confidence);
    }

    #[test]
    fn rejects_rectangle_below_min_size() {
        // 40 px short side is below 0.3 * 200.
        let frame = synthetic_frame(240, 200, 100, 80, 160, 120);
        let detector = HoughDetector::default();
        assert!(detector.detect(&frame).expect("detect").is_none());
    }

    #[test]
    fn aspect_ratio_bounds_come_from_config() {
        // A square has aspect ratio 1.0, above the default 0.9 maximum.
        let frame = synthetic_frame(240, 240, 50, 50, 190, 190);
        assert!(HoughDetector::default().detect(&frame).expect("detect").is_none());

        let config = DetectorConfig {
            max_aspect_ratio: 1.0,
            ..DetectorConfig::default()
        };
        assert!(HoughDetector::new(config).detect(&frame).expect("detect").is_some());
    }

    #[test]
    fn split_families_uses_normal_angle() {
        let lines = vec![
            PolarLine { r: 10.0, angle_in_degrees: 90 },  // horizontal
            PolarLine { r: 20.0, angle_in_degrees: 85 },  // horizontal
            PolarLine { r: 30.0, angle_in_degrees: 0 },   // vertical
            PolarLine { r: 40.0, angle_in_degrees: 5 },   // vertical
            PolarLine { r: 50.0, angle_in_degrees: 45 },  // diagonal, discarded
            PolarLine { r: -60.0, angle_in_degrees: 170 }, // vertical
        ];

        let (horiz, vert) = split_families(&lines);
        assert_eq!(horiz.len(), 2);
        assert_eq!(vert.len(), 3);
    }

    #[test]
    fn intersect_polar_lines_perpendicular() {
        // Horizontal line at y=100: angle=90, r=100.
        let h = PolarLine { r: 100.0, angle_in_degrees: 90 };
        // Vertical line at x=50: angle=0, r=50.
        let v = PolarLine { r: 50.0, angle_in_degrees: 0 };

        let pt = intersect_polar_lines(&h, &v).expect("should intersect");
        assert!(
            (pt.x - 50.0).abs() < 0.5 && (pt.y - 100.0).abs() < 0.5,
            "Expected (~50, ~100), got {:?}",
            pt
        );
    }

    #[test]
    fn intersect_polar_lines_parallel_returns_none() {
        let a = PolarLine { r: 50.0, angle_in_degrees: 0 };
        let b = PolarLine { r: 100.0, angle_in_degrees: 0 };
        assert!(intersect_polar_lines(&a, &b).is_none());
    }

    #[test]
    fn outermost_handles_negative_radius_verticals() {
        // x = 40 expressed with a normal at 180 degrees has r = -40.
        let lines = [
            PolarLine { r: -40.0, angle_in_degrees: 180 - 1 },
            PolarLine { r: 200.0, angle_in_degrees: 0 },
            PolarLine { r: 120.0, angle_in_degrees: 0 },
        ];
        let (left, right) =
            outermost(&lines, LineFamily::Vertical, (120.0, 100.0)).expect("lines");
        assert_eq!(left.r, -40.0);
        assert_eq!(right.r, 200.0);
    }

    #[test]
    fn edge_support_counts_nearby_edges() {
        let mut edges = GrayImage::new(50, 50);
        for i in 10..40 {
            edges.put_pixel(i, 10, Luma([255]));
            edges.put_pixel(i, 40, Luma([255]));
        }
        let quad = Quadrilateral::new(
            Point::new(10.0, 10.0),
            Point::new(40.0, 10.0),
            Point::new(10.0, 40.0),
            Point::new(40.0, 40.0),
        );
        // Only the top and bottom edges are present.
        let support = edge_support(&edges, &quad);
        assert!(support > 0.45 && support < 0.7, "support {support}");

        for i in 10..=40 {
            edges.put_pixel(10, i, Luma([255]));
            edges.put_pixel(40, i, Luma([255]));
        }
        assert_eq!(edge_support(&edges, &quad), 1.0);
    }
}
