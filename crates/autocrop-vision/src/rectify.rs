// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectifier — maps a detected quadrilateral onto an upright
// rectangle and resamples the frame through the inverse homography.

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument};

use autocrop_core::Quadrilateral;
use autocrop_core::error::{AutoCropError, Result};

use crate::geometry::{ensure_non_degenerate, output_extent};

/// Largest side length of a rectified output, in pixels. This is a memory
/// limit, not a geometric one: a valid quadrilateral on a very large frame
/// can still exceed it.
const MAX_OUTPUT_SIDE: u32 = 16_384;

/// Fill for destination pixels whose source falls outside the frame.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A perspective-corrected crop of one frame.
#[derive(Debug, Clone)]
pub struct RectifiedImage {
    /// The flattened, upright crop.
    image: RgbaImage,
    /// Corners the crop was taken from, in raster pixels of the source frame.
    source_corners: Quadrilateral,
    /// When the rectification finished.
    captured_at: DateTime<Utc>,
}

impl RectifiedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the rectified raster.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consume and return the rectified raster.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn source_corners(&self) -> &Quadrilateral {
        &self.source_corners
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Encode as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| AutoCropError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the file
    /// extension; JPEG output drops the alpha channel.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"));

        let result = if is_jpeg {
            DynamicImage::ImageRgba8(self.image.clone()).to_rgb8().save(path)
        } else {
            self.image.save(path)
        };
        result.map_err(|err| {
            AutoCropError::ImageError(format!(
                "failed to save image to {}: {}",
                path.display(),
                err
            ))
        })
    }
}

/// Rectify the region of `frame` enclosed by `quad`.
///
/// `quad` is in normalized detector coordinates (unit square, bottom-left
/// origin). Corners are scaled to the frame's pixel extent and mapped onto
/// the corners of an upright rectangle whose sides are the longer of each
/// pair of opposite edges. Every destination pixel is sampled from the frame
/// through the inverse projection with bilinear interpolation.
///
/// # Errors
///
/// Returns [`AutoCropError::InvalidGeometry`] when the quadrilateral is
/// degenerate (coincident or collinear corners, non-finite coordinates),
/// would produce an empty output, or admits no projective transform. The
/// same variant reports an output wider or taller than 16384 pixels; its
/// message names the size limit. The frame is never modified.
#[instrument(skip_all, fields(frame_w = frame.width(), frame_h = frame.height()))]
pub fn rectify(quad: &Quadrilateral, frame: &RgbaImage) -> Result<RectifiedImage> {
    let (frame_w, frame_h) = frame.dimensions();
    if frame_w == 0 || frame_h == 0 {
        return Err(AutoCropError::InvalidGeometry("frame has zero extent".into()));
    }
    let corners = quad.to_raster(frame_w, frame_h);
    rectify_pixels(&corners, frame)
}

/// Rectify using corners already in raster pixel coordinates (row 0 at the
/// top of `frame`).
#[instrument(skip_all, fields(frame_w = frame.width(), frame_h = frame.height()))]
pub fn rectify_pixels(corners: &Quadrilateral, frame: &RgbaImage) -> Result<RectifiedImage> {
    ensure_non_degenerate(corners)?;

    let (out_w, out_h) = output_extent(corners);
    if out_w == 0 || out_h == 0 {
        return Err(AutoCropError::InvalidGeometry(format!(
            "quadrilateral flattens to an empty {out_w}x{out_h} image"
        )));
    }
    if out_w > MAX_OUTPUT_SIDE || out_h > MAX_OUTPUT_SIDE {
        return Err(AutoCropError::InvalidGeometry(format!(
            "output of {out_w}x{out_h} exceeds the {MAX_OUTPUT_SIDE} pixel size limit"
        )));
    }

    debug!(
        top_left = ?corners.top_left,
        top_right = ?corners.top_right,
        bottom_right = ?corners.bottom_right,
        bottom_left = ?corners.bottom_left,
        out_w,
        out_h,
        "Source corners scaled to pixels"
    );

    let src: [(f32, f32); 4] = [
        corners.top_left.into(),
        corners.top_right.into(),
        corners.bottom_right.into(),
        corners.bottom_left.into(),
    ];
    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),                   // top-left
        (out_w as f32, 0.0),          // top-right
        (out_w as f32, out_h as f32), // bottom-right
        (0.0, out_h as f32),          // bottom-left
    ];

    // from_control_points solves for H with H * src_i = dest_i; warp_into
    // samples through its inverse.
    let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
        AutoCropError::InvalidGeometry("no projective transform maps the corners to a rectangle".into())
    })?;

    let mut output = RgbaImage::new(out_w, out_h);
    warp_into(frame, &projection, Interpolation::Bilinear, BACKGROUND, &mut output);

    info!(out_w, out_h, "Perspective correction applied");

    Ok(RectifiedImage {
        image: output,
        source_corners: *corners,
        captured_at: Utc::now(),
    })
}
