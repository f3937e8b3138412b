use super::error::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Severities accepted by the ingestion service, in upper case.
pub const ALLOWED_LEVELS: [&str; 10] = [
    "INFO",
    "WARNING",
    "WARN",
    "FINER",
    "FINE",
    "DEBUG",
    "ERROR",
    "ERR",
    "EXCEPTION",
    "SEVERE",
];

/// Date-time with optional fractional seconds and an optional `Z` or `±hh:mm` zone.
pub const ISO8601_PATTERN: &str =
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(([+-]\d{2}:\d{2})|Z)?$";

static ISO8601: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn iso8601() -> Result<&'static Regex, ValidationError> {
    ISO8601
        .get_or_init(|| Regex::new(ISO8601_PATTERN))
        .as_ref()
        .map_err(|e| ValidationError::PatternUnavailable {
            reason: e.to_string(),
        })
}

/// A normalized log record, shaped like one element of the `logs` array
/// accepted by `POST /api/v1/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub timestamp: String,
    pub message: String,
    pub level: String,
    pub tags: HashMap<String, String>,
}

impl Log {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_level(&self.level)?;
        validate_timestamp(&self.timestamp)
    }
}

/// Checks an already upper-cased level against [`ALLOWED_LEVELS`].
pub fn validate_level(level: &str) -> Result<(), ValidationError> {
    if ALLOWED_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLevel {
            level: level.to_string(),
            allowed: ALLOWED_LEVELS.join(", "),
        })
    }
}

pub fn validate_timestamp(timestamp: &str) -> Result<(), ValidationError> {
    if iso8601()?.is_match(timestamp) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTimestamp {
            timestamp: timestamp.to_string(),
        })
    }
}

/// Logs that share one `(application_name, tag)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBatch {
    pub application_name: String,
    pub tag: String,
    pub logs: Vec<Log>,
}

impl LogBatch {
    pub fn new(application_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            tag: tag.into(),
            logs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(level: &str, timestamp: &str) -> Log {
        Log {
            timestamp: timestamp.to_string(),
            message: "m".to_string(),
            level: level.to_string(),
            tags: HashMap::new(),
        }
    }

    #[test]
    fn test_every_allowed_level_validates() {
        for level in ALLOWED_LEVELS {
            assert!(validate_level(level).is_ok(), "{level} should be accepted");
        }
    }

    #[test]
    fn test_unknown_or_lowercase_level_is_rejected() {
        for level in ["BOGUS", "info", "TRACE", "", "INFO "] {
            assert!(matches!(
                validate_level(level),
                Err(ValidationError::InvalidLevel { .. })
            ));
        }
    }

    #[test]
    fn test_timestamp_grammar() {
        for ok in [
            "2022-04-04T09:00:35",
            "2022-04-04T09:00:35.123Z",
            "2022-04-04T09:00:35+00:00",
            "2022-04-04T09:00:35.123456-05:30",
        ] {
            assert!(validate_timestamp(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in [
            "2022-04-04T09:00",
            "2022-04-04T09:00:35Z+02:00",
            "2022-04-04 09:00:35",
            "04/04/2022",
        ] {
            assert!(
                matches!(
                    validate_timestamp(bad),
                    Err(ValidationError::InvalidTimestamp { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_checks_level_first() {
        let err = log("NOPE", "not-a-time").validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidLevel { .. }));
        assert!(log("ERROR", "2022-04-04T09:00:35Z").validate().is_ok());
    }

    #[test]
    fn test_log_wire_shape() {
        let mut entry = log("INFO", "2022-04-04T09:00:35Z");
        entry.tags.insert("host".to_string(), "a".to_string());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "timestamp": "2022-04-04T09:00:35Z",
                "message": "m",
                "level": "INFO",
                "tags": { "host": "a" }
            })
        );
    }
}
