use chrono::{DateTime, SecondsFormat, Utc};

/// Stateless value sources for fields that have no configured key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// Current UTC time in ISO 8601 form.
    Iso8601Now,
}

impl Generator {
    pub fn generate(&self) -> String {
        match self {
            Self::Iso8601Now => format_timestamp(Utc::now()),
        }
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix, e.g. `2022-04-04T09:00:35.123Z`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
