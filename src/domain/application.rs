use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name used when escaping leaves nothing of the requested application name.
pub const DEFAULT_APPLICATION_NAME: &str = "forwarder_source";

/// Remote namespace that log batches are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "applicationId")]
    pub id: Uuid,
    pub name: String,
}

impl Application {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Reduces `name` to the characters the service accepts for application
/// names: lowercase ASCII letters, digits and `_`.
pub fn escape_application_name(name: &str) -> String {
    let escaped: String = name
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();

    if escaped.is_empty() {
        DEFAULT_APPLICATION_NAME.to_string()
    } else {
        escaped
    }
}
