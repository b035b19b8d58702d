// ABOUTME: Core library for taskd, containing the record model and in-memory table operations.
// ABOUTME: This crate defines the data model shared by the store and the HTTP server.

pub mod filter;
pub mod record;
pub mod table;
pub mod task;

pub use filter::Filter;
pub use record::{ID_ATTRIBUTE, Patch, Record};
pub use table::{StoreError, TableSet};
pub use task::{TASKS_TABLE, Task, TaskError};
