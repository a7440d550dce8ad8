//! Error types for ytgrab

use thiserror::Error;

/// Main error type for ytgrab operations
#[derive(Debug, Error)]
pub enum YtGrabError {
    #[error("extraction engine not found: {0}")]
    EngineNotFound(String),

    /// Failure reported by the extraction engine, carried verbatim; the
    /// engine's own error taxonomy is not guaranteed stable, so it is
    /// not classified further.
    #[error("{0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },
}

impl YtGrabError {
    /// Whether this error came from the engine boundary (as opposed to
    /// local construction or configuration).
    pub fn is_engine_error(&self) -> bool {
        matches!(self, YtGrabError::EngineNotFound(_) | YtGrabError::Engine(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_classification() {
        assert!(YtGrabError::Engine("boom".into()).is_engine_error());
        assert!(YtGrabError::EngineNotFound("yt-dlp".into()).is_engine_error());
        assert!(!YtGrabError::InvalidConfig {
            key: "DEFAULT_FORMAT".into(),
            value: "OGG".into(),
        }
        .is_engine_error());
    }

    #[test]
    fn test_display_messages() {
        let err = YtGrabError::Engine("Video unavailable".into());
        assert_eq!(err.to_string(), "Video unavailable");

        let err = YtGrabError::InvalidConfig {
            key: "DEFAULT_FORMAT".into(),
            value: "OGG".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration value for DEFAULT_FORMAT: OGG"
        );
    }
}
