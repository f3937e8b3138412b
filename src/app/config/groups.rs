use super::ConfigError;
use crate::mapper::{LogField, Mapper};
use crate::reliability::{RetryPolicy, RetryStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// How one output field is taken from an event.
///
/// `key` + `regex` captures part of the value at `key`, `key` alone takes it
/// whole, `name` alone is a constant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBinding {
    pub name: Option<String>,
    pub key: Option<String>,
    pub regex: Option<String>,
}

impl FieldBinding {
    pub fn constant(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn to_mapper(&self, field: LogField) -> Result<Mapper, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidField {
            field: field.to_string(),
            reason,
        };

        match (&self.key, &self.regex, &self.name) {
            (Some(key), Some(regex), _) => {
                Mapper::key_regex(key.as_str(), regex).map_err(|e| invalid(e.to_string()))
            }
            (Some(key), None, _) => Ok(Mapper::key(key.as_str())),
            (None, Some(_), _) => Err(invalid("regex requires a key".to_string())),
            (None, None, Some(name)) => Ok(Mapper::constant(name.as_str())),
            (None, None, None) => Err(invalid("either name or key must be set".to_string())),
        }
    }
}

/// Per-field bindings from the `[fields]` table. Unset fields fall back to
/// their defaults when the mappers are built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMappings {
    pub application: Option<FieldBinding>,
    pub tag: Option<FieldBinding>,
    pub timestamp: Option<FieldBinding>,
    pub level: Option<FieldBinding>,
    pub message: Option<FieldBinding>,
    /// tag name -> key path
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub strategy: RetryStrategy,
    #[serde(with = "super::serde_helpers")]
    pub base_delay: Duration,
    #[serde(with = "super::serde_helpers")]
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            strategy: policy.strategy,
            base_delay: policy.base_delay,
            max_delay: policy.max_delay,
            jitter: policy.jitter,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self, max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            strategy: self.strategy,
            jitter: self.jitter,
        }
    }
}
