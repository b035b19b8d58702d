// ABOUTME: Single-attribute filter evaluated by select.
// ABOUTME: Matches case-insensitive substrings on string attributes and the exact record id.

use crate::record::{ID_ATTRIBUTE, Record};

/// One `attribute contains value` predicate. Only string attributes can
/// match; a missing or non-string attribute never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    attribute: String,
    value: String,
    needle: String,
}

impl Filter {
    /// Build a filter for `attribute` containing `value`.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        let value: String = value.into();
        Self {
            attribute: attribute.into(),
            needle: value.to_lowercase(),
            value,
        }
    }

    /// Shorthand for an exact id lookup.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new(ID_ATTRIBUTE, id)
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Evaluate the predicate against one record.
    pub fn matches(&self, record: &Record) -> bool {
        // An empty value filters nothing out.
        if self.needle.is_empty() {
            return true;
        }

        if self.attribute == ID_ATTRIBUTE {
            // Ids are unique byte-for-byte, so the lookup must be too.
            return record.id == self.value;
        }

        match record.get_str(&self.attribute) {
            Some(value) => value.to_lowercase().contains(&self.needle),
            None => false,
        }
    }

    /// Apply the filter to a slice of records, cloning the survivors in order.
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}
