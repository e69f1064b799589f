//! Error types for incline.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// Why an operation was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyReason {
    /// A launch is still animating.
    Animating,
    /// Ramps are being edited.
    Editing,
}

impl fmt::Display for BusyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Animating => f.write_str("a launch is still animating"),
            Self::Editing => f.write_str("edit mode is active"),
        }
    }
}

/// Errors that can occur in incline.
///
/// Degenerate geometry, unknown ramp ids and out-of-range dimensions are
/// not errors; they are absorbed with fallback values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Editing and animating are mutually exclusive.
    #[error("busy: {0}")]
    Busy(BusyReason),

    /// Control points can only be moved in edit mode.
    #[error("control points can only be moved in edit mode")]
    NotEditing,

    /// I/O error while reading or writing persisted state.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Persisted state could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for [`Error::Busy`].
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

/// Result type for incline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_display() {
        let e = Error::Busy(BusyReason::Animating);
        assert_eq!(e.to_string(), "busy: a launch is still animating");
        assert!(e.is_busy());
    }

    #[test]
    fn test_io_from() {
        let e: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, Error::Io(_)));
        assert!(!e.is_busy());
    }
}
