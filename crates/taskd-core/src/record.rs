// ABOUTME: Defines the schema-less Record stored in every table, plus the Patch used for partial updates.
// ABOUTME: A Record always carries a string id; every other attribute lives in an open JSON map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute key that every record carries and that can never be patched.
pub const ID_ATTRIBUTE: &str = "id";

/// Partial attribute map merged into an existing record by `update`.
pub type Patch = BTreeMap<String, Value>;

/// A single row in a table. The `id` is typed; the rest of the attributes are
/// an open map so arbitrary extra fields survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record with the given id and no other attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style setter used when assembling records by hand.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set an attribute. Setting `id` through this method is ignored.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if key == ID_ATTRIBUTE {
            return;
        }
        self.attributes.insert(key, value.into());
    }

    /// Look up a non-id attribute by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Return the attribute as a string slice if it exists and is a string.
    /// The `id` attribute is always a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        if key == ID_ATTRIBUTE {
            return Some(&self.id);
        }
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Merge a patch into this record key by key. The `id` is immutable, so an
    /// `id` entry in the patch is skipped.
    pub fn merge(&mut self, patch: &Patch) {
        for (key, value) in patch {
            if key == ID_ATTRIBUTE {
                continue;
            }
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}
