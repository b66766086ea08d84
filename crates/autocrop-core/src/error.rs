// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for AutoCrop.

use thiserror::Error;

/// Top-level error type for all AutoCrop operations.
///
/// Every variant is recoverable at the frame level: a failure on one frame
/// never stops the next one from being classified.
#[derive(Debug, Error)]
pub enum AutoCropError {
    // -- Vision errors --
    #[error("rectangle detection failed: {0}")]
    DetectionFailed(String),

    #[error("invalid quadrilateral geometry: {0}")]
    InvalidGeometry(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Session --
    #[error("scan session is not running")]
    SessionClosed,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AutoCropError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = AutoCropError::InvalidGeometry("collinear corners".into());
        assert_eq!(err.to_string(), "invalid quadrilateral geometry: collinear corners");
        assert_eq!(
            AutoCropError::SessionClosed.to_string(),
            "scan session is not running"
        );
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn open() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))?;
            Ok(())
        }
        let err = open().unwrap_err();
        assert!(matches!(err, AutoCropError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }
}
