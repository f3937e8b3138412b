use super::tags::TagsMapper;
use super::{MappingError, StringMapper};
use crate::domain::{Event, Log, ValidationError};
use std::fmt;
use thiserror::Error;

/// Logical output fields a mapper can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogField {
    ApplicationName,
    Tag,
    Timestamp,
    Message,
    Level,
}

impl LogField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationName => "application name",
            Self::Tag => "tag",
            Self::Timestamp => "timestamp",
            Self::Message => "message",
            Self::Level => "level",
        }
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogMappingError {
    #[error("Failed to map {field}: {source}")]
    Mapping {
        field: LogField,
        #[source]
        source: MappingError,
    },

    #[error("Log validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl LogMappingError {
    pub fn mapping(field: LogField) -> impl FnOnce(MappingError) -> Self {
        move |source| Self::Mapping { field, source }
    }

    /// The field that made the event unusable.
    pub fn field(&self) -> LogField {
        match self {
            Self::Mapping { field, .. } => *field,
            Self::Validation(ValidationError::InvalidLevel { .. }) => LogField::Level,
            Self::Validation(
                ValidationError::InvalidTimestamp { .. } | ValidationError::PatternUnavailable { .. },
            ) => LogField::Timestamp,
        }
    }
}

/// Assembles a validated [`Log`] from one event.
#[derive(Debug, Clone)]
pub struct LogMapper {
    pub timestamp: StringMapper,
    pub message: StringMapper,
    pub level: StringMapper,
    pub tags: TagsMapper,
}

impl LogMapper {
    /// Maps timestamp, message, level and tags (in that order), upper-cases the
    /// level and validates the result. Either a complete, valid log comes back
    /// or the first error encountered.
    pub fn to_log(&self, event: &Event) -> Result<Log, LogMappingError> {
        let timestamp = self
            .timestamp
            .map(event)
            .map_err(LogMappingError::mapping(LogField::Timestamp))?;
        let message = self
            .message
            .map(event)
            .map_err(LogMappingError::mapping(LogField::Message))?;
        let level = self
            .level
            .map(event)
            .map_err(LogMappingError::mapping(LogField::Level))?;
        let tags = self.tags.map(event);

        let log = Log {
            timestamp,
            message,
            level: level.to_uppercase(),
            tags,
        };
        log.validate()?;
        Ok(log)
    }
}
