// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame import — camera pixel buffers and image files into RGBA rasters.

use autocrop_core::error::{AutoCropError, Result};
use image::RgbaImage;
use tracing::{debug, info, instrument};

/// Convert a 32-bit BGRA camera buffer into an RGBA raster.
///
/// `bytes_per_row` may exceed `width * 4` when the capture pipeline pads
/// rows; padding bytes are skipped.
pub fn from_bgra(width: u32, height: u32, bytes_per_row: usize, data: &[u8]) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(AutoCropError::ImageError(format!(
            "frame has zero extent ({width}x{height})"
        )));
    }
    let row_bytes = width as usize * 4;
    if bytes_per_row < row_bytes {
        return Err(AutoCropError::ImageError(format!(
            "row stride {bytes_per_row} is shorter than {row_bytes} bytes of pixels"
        )));
    }
    let required = bytes_per_row * (height as usize - 1) + row_bytes;
    if data.len() < required {
        return Err(AutoCropError::ImageError(format!(
            "BGRA buffer holds {} bytes, {required} needed",
            data.len()
        )));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(bytes_per_row).take(height as usize) {
        for bgra in row[..row_bytes].chunks_exact(4) {
            pixels.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
        }
    }

    RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        AutoCropError::ImageError("converted buffer does not match frame extent".into())
    })
}

/// Load an image file (JPEG, PNG, etc.) as an RGBA raster.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<std::path::Path>) -> Result<RgbaImage> {
    let img = image::open(path.as_ref()).map_err(|err| {
        AutoCropError::ImageError(format!(
            "failed to open {}: {}",
            path.as_ref().display(),
            err
        ))
    })?;
    info!(width = img.width(), height = img.height(), "Frame loaded");
    Ok(img.to_rgba8())
}

/// Decode an in-memory image (JPEG, PNG, etc.) as an RGBA raster.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn from_bytes(data: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(data).map_err(|err| {
        AutoCropError::ImageError(format!("failed to decode frame: {}", err))
    })?;
    debug!(width = img.width(), height = img.height(), "Frame decoded from bytes");
    Ok(img.to_rgba8())
}
