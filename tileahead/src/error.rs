//! Crate error types.
//!
//! Each concern owns its error enum; this module holds the request-level
//! [`PrefetchError`] and re-exports the others so callers can import every
//! error from one place.

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::fetch::FetchError;

/// Errors returned when submitting a prefetch request.
///
/// Prefetching is best-effort: failures of individual tile fetches are
/// counted in the report and never surface here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrefetchError {
    /// A camera pose contained a non-finite number.
    #[error("Invalid camera pose: {field} = {value}")]
    InvalidPose { field: &'static str, value: f64 },

    /// Configuration values are out of range.
    #[error("Invalid prefetch configuration: {0}")]
    InvalidConfig(String),

    /// The async runtime could not run the request.
    #[error("Prefetch runtime error: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pose_display() {
        let err = PrefetchError::InvalidPose {
            field: "zoom",
            value: f64::NAN,
        };
        assert_eq!(err.to_string(), "Invalid camera pose: zoom = NaN");
    }

    #[test]
    fn test_invalid_config_display() {
        let err = PrefetchError::InvalidConfig("fps must be positive".to_string());
        assert!(err.to_string().contains("fps must be positive"));
    }
}
