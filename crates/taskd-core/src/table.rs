// ABOUTME: In-memory table set holding every table's records in insertion order.
// ABOUTME: Applies the primitive insert/select/update/delete operations and enforces id uniqueness.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::filter::Filter;
use crate::record::{Patch, Record};

/// Errors raised by the primitive table operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found: {table}/{id}")]
    RecordNotFound { table: String, id: String },

    #[error("duplicate id in {table}: {id}")]
    DuplicateId { table: String, id: String },
}

/// The complete database content: table name to ordered records. Tables are
/// created on first insert and serialize as `{ "<table>": [record, ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TableSet {
    tables: BTreeMap<String, Vec<Record>>,
}

impl TryFrom<BTreeMap<String, Vec<Record>>> for TableSet {
    type Error = StoreError;

    /// Build a table set from raw tables, rejecting any table that holds the
    /// same id twice.
    fn try_from(tables: BTreeMap<String, Vec<Record>>) -> Result<Self, Self::Error> {
        for (table, rows) in &tables {
            let mut seen = HashSet::with_capacity(rows.len());
            for row in rows {
                if !seen.insert(row.id.as_str()) {
                    return Err(StoreError::DuplicateId {
                        table: table.clone(),
                        id: row.id.clone(),
                    });
                }
            }
        }
        Ok(Self { tables })
    }
}

impl<'de> Deserialize<'de> for TableSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tables = BTreeMap::<String, Vec<Record>>::deserialize(deserializer)?;
        TableSet::try_from(tables).map_err(serde::de::Error::custom)
    }
}

impl TableSet {
    /// Create an empty table set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every table that has ever received a record.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of records in a table; zero for a missing table.
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Vec::is_empty)
    }

    /// Append a record to the named table. Fails if a record with the same id
    /// is already stored there.
    pub fn insert(&mut self, table: &str, record: Record) -> Result<Record, StoreError> {
        let rows = self.tables.entry(table.to_string()).or_default();

        if rows.iter().any(|row| row.id == record.id) {
            return Err(StoreError::DuplicateId {
                table: table.to_string(),
                id: record.id,
            });
        }

        rows.push(record.clone());
        tracing::debug!(table, id = %record.id, "record inserted");
        Ok(record)
    }

    /// Return copies of the records matching `filter`, or every record when no
    /// filter is given. A missing table yields an empty list.
    pub fn select(&self, table: &str, filter: Option<&Filter>) -> Vec<Record> {
        let Some(rows) = self.tables.get(table) else {
            return Vec::new();
        };

        match filter {
            Some(filter) => filter.apply(rows),
            None => rows.clone(),
        }
    }

    /// Merge `patch` into the record with the given id and return the result.
    pub fn update(&mut self, table: &str, id: &str, patch: &Patch) -> Result<Record, StoreError> {
        let row = self
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row.id == id))
            .ok_or_else(|| StoreError::RecordNotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        row.merge(patch);
        tracing::debug!(table, id, "record updated");
        Ok(row.clone())
    }

    /// Remove the record with the given id.
    pub fn delete(&mut self, table: &str, id: &str) -> Result<bool, StoreError> {
        let not_found = || StoreError::RecordNotFound {
            table: table.to_string(),
            id: id.to_string(),
        };

        let rows = self.tables.get_mut(table).ok_or_else(not_found)?;
        let index = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or_else(not_found)?;

        rows.remove(index);
        tracing::debug!(table, id, "record deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TASKS: &str = "tasks";

    fn milk() -> Record {
        Record::new("1")
            .with("name", "Buy milk")
            .with("description", "2%")
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn insert_then_select_by_id_returns_exactly_that_record() {
        let mut set = TableSet::new();
        let stored = set.insert(TASKS, milk()).unwrap();
        set.insert(TASKS, Record::new("10").with("name", "Other"))
            .unwrap();

        assert_eq!(stored, milk());
        assert_eq!(set.select(TASKS, Some(&Filter::by_id("1"))), vec![milk()]);
    }

    #[test]
    fn select_without_filter_keeps_insertion_order() {
        let mut set = TableSet::new();
        for id in ["c", "a", "b"] {
            set.insert(TASKS, Record::new(id)).unwrap();
        }
        set.insert("other", Record::new("z")).unwrap();
        set.delete("other", "z").unwrap();

        assert_eq!(ids(&set.select(TASKS, None)), vec!["c", "a", "b"]);
    }

    #[test]
    fn select_on_missing_table_is_empty() {
        let set = TableSet::new();
        assert!(set.select("nope", None).is_empty());
        assert!(set.select("nope", Some(&Filter::new("name", "x"))).is_empty());
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut set = TableSet::new();
        set.insert(TASKS, milk()).unwrap();

        let err = set
            .insert(TASKS, Record::new("1").with("name", "Second"))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateId {
                table: TASKS.to_string(),
                id: "1".to_string()
            }
        );
        assert_eq!(set.len(TASKS), 1);
        assert_eq!(set.select(TASKS, None), vec![milk()]);
    }

    #[test]
    fn same_id_in_different_tables_is_allowed() {
        let mut set = TableSet::new();
        set.insert("a", Record::new("1")).unwrap();
        set.insert("b", Record::new("1")).unwrap();
        assert_eq!(set.len("a"), 1);
        assert_eq!(set.len("b"), 1);
    }

    #[test]
    fn update_changes_only_patched_attributes() {
        let mut set = TableSet::new();
        set.insert(TASKS, milk()).unwrap();

        let mut patch = Patch::new();
        patch.insert("name".to_string(), json!("x"));
        let updated = set.update(TASKS, "1", &patch).unwrap();

        assert_eq!(updated.id, "1");
        assert_eq!(updated.get_str("name"), Some("x"));
        assert_eq!(updated.get_str("description"), Some("2%"));
        assert_eq!(set.select(TASKS, None), vec![updated]);
    }

    #[test]
    fn returned_records_are_copies() {
        let mut set = TableSet::new();
        let mut returned = set.insert(TASKS, milk()).unwrap();
        returned.set("name", "mutated outside");

        let mut selected = set.select(TASKS, None);
        selected[0].set("name", "also mutated");

        assert_eq!(set.select(TASKS, None), vec![milk()]);
    }

    #[test]
    fn update_missing_id_leaves_table_unmodified() {
        let mut set = TableSet::new();
        set.insert(TASKS, milk()).unwrap();
        let before = set.clone();

        let mut patch = Patch::new();
        patch.insert("name".to_string(), json!("x"));
        let err = set.update(TASKS, "404", &patch).unwrap_err();

        assert!(matches!(err, StoreError::RecordNotFound { .. }));
        assert_eq!(set, before);
    }

    #[test]
    fn delete_removes_record() {
        let mut set = TableSet::new();
        set.insert(TASKS, milk()).unwrap();

        assert!(set.delete(TASKS, "1").unwrap());
        assert!(set.select(TASKS, Some(&Filter::by_id("1"))).is_empty());
    }

    #[test]
    fn delete_missing_id_is_not_found() {
        let mut set = TableSet::new();
        set.insert(TASKS, milk()).unwrap();
        let before = set.clone();

        assert!(matches!(
            set.delete(TASKS, "2"),
            Err(StoreError::RecordNotFound { .. })
        ));
        assert!(matches!(
            set.delete("missing", "1"),
            Err(StoreError::RecordNotFound { .. })
        ));
        assert_eq!(set, before);
    }

    #[test]
    fn deserialize_rejects_duplicate_ids() {
        let raw = json!({
            "tasks": [
                { "id": "1", "name": "a" },
                { "id": "1", "name": "b" }
            ]
        });

        let err = serde_json::from_value::<TableSet>(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate id in tasks: 1"));
    }

    #[test]
    fn deserialize_allows_same_id_across_tables() {
        let raw = json!({ "a": [ { "id": "1" } ], "b": [ { "id": "1" } ] });

        let set: TableSet = serde_json::from_value(raw).unwrap();
        assert_eq!(set.len("a"), 1);
        assert_eq!(set.len("b"), 1);
    }

    #[test]
    fn select_by_id_distinguishes_case() {
        let mut set = TableSet::new();
        set.insert(TASKS, Record::new("abc")).unwrap();
        set.insert(TASKS, Record::new("ABC")).unwrap();

        let found = set.select(TASKS, Some(&Filter::by_id("abc")));
        assert_eq!(ids(&found), vec!["abc"]);
    }

    #[test]
    fn serializes_as_table_map() {
        let mut set = TableSet::new();
        set.insert(TASKS, milk()).unwrap();

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            json!({ "tasks": [ { "id": "1", "name": "Buy milk", "description": "2%" } ] })
        );

        let back: TableSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }
}
