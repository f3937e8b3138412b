use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field that carries the event time in NDJSON input.
pub const TIMESTAMP_FIELD: &str = "@timestamp";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("Event must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// A semi-structured input record handed over by the collection side.
///
/// The forwarder never mutates events. Field access goes through
/// [`Event::get_value`], which resolves dotted paths into nested objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    timestamp: DateTime<Utc>,
    fields: Map<String, Value>,
}

impl Event {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self::with_timestamp(fields, Utc::now())
    }

    pub fn with_timestamp(fields: Map<String, Value>, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, fields }
    }

    /// Builds an event from a decoded JSON document.
    ///
    /// A string `@timestamp` member in RFC 3339 form becomes the event time and
    /// is removed from the fields. Anything else leaves the fields untouched and
    /// stamps the event with the current time.
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(EventError::NotAnObject(json_type_name(&other))),
        };

        let parsed = fields
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc));

        match parsed {
            Some(timestamp) => {
                fields.remove(TIMESTAMP_FIELD);
                Ok(Self::with_timestamp(fields, timestamp))
            }
            None => Ok(Self::new(fields)),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Looks up `path` where each `.` descends one level into a nested object.
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
