// ABOUTME: Defines the Task resource served over HTTP and its mapping onto a stored Record.
// ABOUTME: Tasks carry a name, optional description, completion flag, and creation/update timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

use crate::record::Record;

/// Table that holds every task.
pub const TASKS_TABLE: &str = "tasks";

/// Errors raised when a stored record cannot be read back as a Task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("record {id} is not a valid task: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A task as exposed to API clients. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new open task with a fresh ULID and both timestamps set to now.
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new().to_string(),
            name,
            description,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert into the schema-less record stored in the tasks table.
    pub fn into_record(self) -> Record {
        let id = self.id.clone();
        match serde_json::to_value(&self) {
            Ok(serde_json::Value::Object(map)) => {
                let mut record = Record::new(id);
                for (key, value) in map {
                    record.set(key, value);
                }
                record
            }
            // A derived Serialize on a struct always produces an object.
            _ => Record::new(id),
        }
    }

    /// Read a task back from a stored record. Extra attributes are ignored.
    pub fn from_record(record: Record) -> Result<Self, TaskError> {
        let id = record.id.clone();
        let value = serde_json::to_value(record).map_err(|source| TaskError::Malformed {
            id: id.clone(),
            source,
        })?;
        serde_json::from_value(value).map_err(|source| TaskError::Malformed { id, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_new_sets_defaults() {
        let task = Task::new("Buy milk".to_string(), Some("2%".to_string()));

        assert_eq!(task.name, "Buy milk");
        assert_eq!(task.description.as_deref(), Some("2%"));
        assert!(!task.completed);
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.id.parse::<Ulid>().is_ok());
    }

    #[test]
    fn task_new_generates_distinct_ids() {
        let a = Task::new("A".to_string(), None);
        let b = Task::new("B".to_string(), None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn into_record_uses_camel_case_attributes() {
        let task = Task::new("Buy milk".to_string(), Some("2%".to_string()));
        let record = task.clone().into_record();

        assert_eq!(record.id, task.id);
        assert_eq!(record.get_str("name"), Some("Buy milk"));
        assert_eq!(record.get("completed"), Some(&json!(false)));
        assert!(record.get("createdAt").is_some());
        assert!(record.get("updatedAt").is_some());
        assert!(record.get("created_at").is_none());
    }

    #[test]
    fn record_round_trips_to_task() {
        let task = Task::new("Walk dog".to_string(), None);
        let mut record = task.clone().into_record();
        record.set("priority", 2);

        let back = Task::from_record(record).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn from_record_rejects_missing_name() {
        let record = Record::new("1").with("description", "no name");
        let err = Task::from_record(record).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }
}
