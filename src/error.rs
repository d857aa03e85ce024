//! Error taxonomy shared by the profile catalogue, uniform binder, camera and
//! parity checks.

use glam::Vec3;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DistortionError {
    #[error("unknown distortion profile '{0}'")]
    UnknownProfile(String),

    #[error("distortion profile '{0}' is already registered")]
    DuplicateProfile(String),

    #[error("invalid distortion profile '{id}': {reason}")]
    InvalidProfile { id: String, reason: String },

    #[error(
        "parity mismatch in '{id}' at progress {progress}, time {time}: \
         host {host:?} vs shader {shader:?} (tolerance {tolerance})"
    )]
    ParityMismatch {
        id: String,
        progress: f32,
        time: f32,
        host: Vec3,
        shader: Vec3,
        tolerance: f32,
    },

    #[error("shader error: {0}")]
    Shader(String),

    #[error("gpu error: {0}")]
    Gpu(String),

    #[error("platform error: {0}")]
    Platform(String),
}

impl DistortionError {
    pub(crate) fn invalid(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidProfile {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DistortionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_is_not_reported_as_gpu() {
        let err = DistortionError::Platform("failed to create event loop: no display".into());
        assert_eq!(err.to_string(), "platform error: failed to create event loop: no display");
        assert!(!matches!(err, DistortionError::Gpu(_)));
    }
}
