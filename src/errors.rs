use crate::hardware::HardwareError;
use thiserror::Error;

/// Flat classification of [`CameraError`], for callers that map errors onto
/// transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CameraUnavailable,
    InvalidParameter,
    ConfigurationFailed,
    StreamingFailed,
    Internal,
}

#[derive(Debug, Error)]
pub enum CameraError {
    /// No sensor detected, or the camera is not configured.
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// A caller-supplied value is outside its documented bound. Also used for
    /// failed resolution/framerate reconfiguration.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Camera configuration failed: {0}")]
    ConfigurationFailed(#[source] HardwareError),

    #[error("Failed to start streaming: {0}")]
    StreamingFailed(#[source] Box<CameraError>),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CameraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CameraError::CameraUnavailable(_) => ErrorKind::CameraUnavailable,
            CameraError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            CameraError::ConfigurationFailed(_) => ErrorKind::ConfigurationFailed,
            CameraError::StreamingFailed(_) => ErrorKind::StreamingFailed,
            CameraError::Hardware(_) | CameraError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_configured() -> Self {
        CameraError::CameraUnavailable("camera is not configured".to_string())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CameraError::InvalidParameter(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            CameraError::not_configured().kind(),
            ErrorKind::CameraUnavailable
        );
        assert_eq!(
            CameraError::invalid("gain must be <= 16 (got 20)").kind(),
            ErrorKind::InvalidParameter
        );
        assert_eq!(
            CameraError::Hardware(HardwareError::new("i2c timeout")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_streaming_failure_keeps_cause() {
        use std::error::Error;

        let err = CameraError::StreamingFailed(Box::new(CameraError::CameraUnavailable(
            "no cameras detected".to_string(),
        )));
        assert_eq!(err.kind(), ErrorKind::StreamingFailed);
        let cause = err.source().map(|e| e.to_string()).unwrap_or_default();
        assert!(cause.contains("no cameras detected"));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = CameraError::invalid("exposure_us must be >= 100 (got 50)");
        assert_eq!(
            err.to_string(),
            "Invalid parameter: exposure_us must be >= 100 (got 50)"
        );
    }
}
