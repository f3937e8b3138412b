//! Field mapping: turning opaque events into validated [`Log`](crate::domain::Log)
//! records grouped by application and tag.
//!
//! Each logical output field is bound to exactly one [`Mapper`] when the
//! client is configured. At run time every mapper is applied once per event.

pub mod batch_mapper;
pub mod generator;
pub mod log_mapper;
pub mod tags;

pub use batch_mapper::{FailedMapping, Grouping, LogBatchMapper, MappedLogBatch, MappingSummary};
pub use generator::{Generator, format_timestamp};
pub use log_mapper::{LogField, LogMapper, LogMappingError};
pub use tags::TagsMapper;

use crate::domain::Event;
use crate::domain::event::json_type_name;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Key '{key}' not found in event")]
    KeyNotFound { key: String },

    #[error("Mapped value is not a string but {found}")]
    TypeMismatch { found: &'static str },

    #[error("No match for pattern '{pattern}' in '{value}'")]
    NoMatch { pattern: String, value: String },

    #[error("Pattern '{pattern}' captured an empty string from '{value}'")]
    EmptyCapture { pattern: String, value: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Pattern '{pattern}' must contain exactly one capturing group, found {groups}")]
    RegexGroupCount { pattern: String, groups: usize },
}

/// Strategy that extracts one value from an event.
#[derive(Debug, Clone)]
pub enum Mapper {
    /// Always yields the same string.
    Constant(String),
    /// Yields the value found at a dotted key path.
    Key(String),
    /// Applies a single-group regex to the string produced by `inner`.
    KeyRegex {
        inner: Box<StringMapper>,
        expr: Regex,
    },
    /// Yields a freshly generated value, ignoring the event.
    Generator(Generator),
    /// Yields the event's own timestamp.
    EventTime,
}

impl Mapper {
    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant(value.into())
    }

    pub fn key(path: impl Into<String>) -> Self {
        Self::Key(path.into())
    }

    /// Key lookup followed by a regex capture.
    pub fn key_regex(path: impl Into<String>, pattern: &str) -> Result<Self, MappingError> {
        Self::regex(StringMapper::new(Self::key(path)), pattern)
    }

    pub fn regex(inner: StringMapper, pattern: &str) -> Result<Self, MappingError> {
        let expr = Regex::new(pattern).map_err(|e| MappingError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        // captures_len counts the implicit whole-match group
        let groups = expr.captures_len() - 1;
        if groups != 1 {
            return Err(MappingError::RegexGroupCount {
                pattern: pattern.to_string(),
                groups,
            });
        }

        Ok(Self::KeyRegex {
            inner: Box::new(inner),
            expr,
        })
    }

    pub fn map(&self, event: &Event) -> Result<Value, MappingError> {
        match self {
            Self::Constant(value) => Ok(Value::String(value.clone())),
            Self::Key(path) => event
                .get_value(path)
                .cloned()
                .ok_or_else(|| MappingError::KeyNotFound { key: path.clone() }),
            Self::KeyRegex { inner, expr } => {
                let value = inner.map(event)?;
                capture(expr, &value).map(Value::String)
            }
            Self::Generator(generator) => Ok(Value::String(generator.generate())),
            Self::EventTime => Ok(Value::String(format_timestamp(event.timestamp()))),
        }
    }
}

fn capture(expr: &Regex, value: &str) -> Result<String, MappingError> {
    let captures = expr.captures(value).ok_or_else(|| MappingError::NoMatch {
        pattern: expr.as_str().to_string(),
        value: value.to_string(),
    })?;

    match captures.get(1) {
        Some(group) if !group.as_str().is_empty() => Ok(group.as_str().to_string()),
        _ => Err(MappingError::EmptyCapture {
            pattern: expr.as_str().to_string(),
            value: value.to_string(),
        }),
    }
}

/// Wraps a [`Mapper`] and insists that its result is a JSON string.
#[derive(Debug, Clone)]
pub struct StringMapper {
    mapper: Mapper,
}

impl StringMapper {
    pub fn new(mapper: Mapper) -> Self {
        Self { mapper }
    }

    pub fn inner(&self) -> &Mapper {
        &self.mapper
    }

    pub fn map(&self, event: &Event) -> Result<String, MappingError> {
        match self.mapper.map(event)? {
            Value::String(value) => Ok(value),
            other => Err(MappingError::TypeMismatch {
                found: json_type_name(&other),
            }),
        }
    }
}

impl From<Mapper> for StringMapper {
    fn from(mapper: Mapper) -> Self {
        Self::new(mapper)
    }
}
