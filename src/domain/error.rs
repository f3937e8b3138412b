use thiserror::Error;

/// A log record that was mapped successfully but violates the ingestion grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid log level '{level}', must be one of: {allowed}")]
    InvalidLevel { level: String, allowed: String },

    #[error("Timestamp '{timestamp}' is not in ISO 8601 format")]
    InvalidTimestamp { timestamp: String },

    #[error("Timestamp pattern unavailable: {reason}")]
    PatternUnavailable { reason: String },
}
