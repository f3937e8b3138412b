use crate::domain::Event;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Collects string values from several key paths into a tag map.
///
/// Tags whose key is absent, or whose value is not a string, are left out.
/// A tag map never fails to map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsMapper {
    // tag name -> key path
    sources: BTreeMap<String, String>,
}

impl TagsMapper {
    pub fn new<I, K, V>(sources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            sources: sources
                .into_iter()
                .map(|(tag, key)| (tag.into(), key.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn map(&self, event: &Event) -> HashMap<String, String> {
        let mut tags = HashMap::with_capacity(self.sources.len());
        for (tag, key) in &self.sources {
            match event.get_value(key) {
                Some(Value::String(value)) => {
                    tags.insert(tag.clone(), value.clone());
                }
                Some(_) => trace!("Skipping tag {tag}: value at '{key}' is not a string"),
                None => trace!("Skipping tag {tag}: key '{key}' not found"),
            }
        }
        tags
    }
}
