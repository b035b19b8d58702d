// ABOUTME: Database facade exposing insert/select/update/delete over the in-memory table set.
// ABOUTME: Loads the file once in open(), then writes the full table set through to disk after every mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use taskd_core::{Filter, Patch, Record, StoreError, TableSet};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::persister::{self, PersistError, PersisterHandle, RetryPolicy};
use crate::snapshot::load_snapshot;

/// Errors surfaced to callers of the database facade.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistError),
}

/// Tuning knobs for the persistence side of the database.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseOptions {
    pub save_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            save_attempts: retry.max_attempts,
            retry_backoff: retry.initial_backoff,
        }
    }
}

struct Inner {
    path: PathBuf,
    tables: Mutex<TableSet>,
    persister: PersisterHandle,
}

/// Handle to an opened database. Clones share the same tables and writer.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Load the database file at `path` and return a ready handle.
    ///
    /// A missing or unreadable file is treated as an empty database, which is
    /// written out immediately so the file exists afterwards.
    pub async fn open(path: impl Into<PathBuf>, options: DatabaseOptions) -> Result<Self, DbError> {
        let path = path.into();

        let (tables, needs_save) = match load_snapshot(&path) {
            Ok(Some(tables)) => {
                tracing::info!(
                    "loaded database from {} ({} tables)",
                    path.display(),
                    tables.table_names().count()
                );
                (tables, false)
            }
            Ok(None) => {
                tracing::info!("no database at {}, starting empty", path.display());
                (TableSet::new(), true)
            }
            Err(e) => {
                tracing::warn!(
                    "database at {} could not be read, starting empty: {}",
                    path.display(),
                    e
                );
                (TableSet::new(), true)
            }
        };

        let persister = persister::spawn(
            path.clone(),
            RetryPolicy {
                max_attempts: options.save_attempts,
                initial_backoff: options.retry_backoff,
            },
        );

        if needs_save {
            persister.save(tables.clone()).await?;
        }

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                tables: Mutex::new(tables),
                persister,
            }),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Copy of the full in-memory content.
    pub async fn snapshot(&self) -> TableSet {
        self.inner.tables.lock().await.clone()
    }

    /// Append a record to `table`. Fails with `DuplicateId` if the id is taken.
    pub async fn insert(&self, table: &str, record: Record) -> Result<Record, DbError> {
        self.mutate(|tables| tables.insert(table, record)).await
    }

    /// Records in `table` matching `filter`, or all of them.
    pub async fn select(&self, table: &str, filter: Option<&Filter>) -> Vec<Record> {
        self.inner.tables.lock().await.select(table, filter)
    }

    /// Merge `patch` into the record with `id` and return the merged record.
    pub async fn update(&self, table: &str, id: &str, patch: &Patch) -> Result<Record, DbError> {
        self.mutate(|tables| tables.update(table, id, patch)).await
    }

    /// Remove the record with `id`.
    pub async fn delete(&self, table: &str, id: &str) -> Result<bool, DbError> {
        self.mutate(|tables| tables.delete(table, id)).await
    }

    /// Apply a mutation and write the result through to disk.
    ///
    /// The snapshot is queued while the table lock is still held, so the
    /// writer sees snapshots in mutation order and the last write always
    /// carries every earlier mutation. The wait for the write happens after
    /// the lock is released.
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut TableSet) -> Result<T, StoreError>,
    ) -> Result<T, DbError> {
        let (output, pending) = {
            let mut tables = self.inner.tables.lock().await;
            let output = op(&mut *tables)?;
            let pending = self.inner.persister.enqueue(tables.clone()).await?;
            (output, pending)
        };

        pending.wait().await?;
        Ok(output)
    }
}
