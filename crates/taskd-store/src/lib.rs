// ABOUTME: Persistence layer for taskd, owning the single JSON database file.
// ABOUTME: Provides atomic snapshots, a single-writer persister task, and the Database facade.

pub mod db;
pub mod persister;
pub mod snapshot;

pub use db::{Database, DatabaseOptions, DbError};
pub use persister::{PendingSave, PersistError, PersisterHandle, RetryPolicy};
pub use snapshot::{SnapshotError, load_snapshot, save_snapshot};
