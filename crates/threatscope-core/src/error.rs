//! Error types for the ThreatScope Engine

use thiserror::Error;

/// Result type alias using ThreatScope Error
pub type Result<T> = std::result::Result<T, Error>;

/// ThreatScope error types
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    #[error("Invalid CVE id: {0}")]
    InvalidCveId(String),

    #[error("{field} out of range: {value} (expected {min} to {max})")]
    ScoreOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid {field}: {value}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("Invalid {entity}: {message}")]
    InvalidEntity {
        entity: &'static str,
        message: String,
    },

    // === SBOM Errors ===
    #[error("Unsupported SBOM format: {0}")]
    UnsupportedFormat(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing required configuration: {key}")]
    MissingConfig { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    // === Cache Errors ===
    #[error("Cache backend error: {0}")]
    CacheBackend(String),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error was raised while validating an input entity
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidCveId(_)
                | Error::ScoreOutOfRange { .. }
                | Error::InvalidEnum { .. }
                | Error::InvalidEntity { .. }
        )
    }

    /// Get an error code for logging/metrics
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCveId(_) => "INVALID_CVE_ID",
            Error::ScoreOutOfRange { .. } => "SCORE_OUT_OF_RANGE",
            Error::InvalidEnum { .. } => "INVALID_ENUM",
            Error::InvalidEntity { .. } => "INVALID_ENTITY",
            Error::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Error::Configuration(_) => "CONFIG_ERROR",
            Error::MissingConfig { .. } => "MISSING_CONFIG",
            Error::InvalidConfig { .. } => "INVALID_CONFIG",
            Error::CacheBackend(_) => "CACHE_BACKEND",
            Error::Json(_) => "JSON_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(Error::InvalidCveId("bogus".into()).is_validation());
        assert!(Error::ScoreOutOfRange {
            field: "cvss_score",
            value: 11.0,
            min: 0.0,
            max: 10.0,
        }
        .is_validation());
        assert!(!Error::UnsupportedFormat("yaml".into()).is_validation());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::UnsupportedFormat("xml".into()).code(),
            "UNSUPPORTED_FORMAT"
        );
        assert_eq!(Error::Internal("boom".into()).code(), "INTERNAL_ERROR");
    }
}
