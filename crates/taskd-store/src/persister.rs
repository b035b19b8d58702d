// ABOUTME: Single-writer background task that owns the database file and applies saves in order.
// ABOUTME: Provides PersisterHandle for queueing snapshots and awaiting their bounded-retry outcome.

use std::path::PathBuf;
use std::time::Duration;

use taskd_core::TableSet;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::snapshot::{SnapshotError, save_snapshot};

/// Errors reported back to the caller that queued a save.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: SnapshotError,
    },

    #[error("persister task stopped")]
    Closed,
}

/// Retry policy for a single save.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
        }
    }
}

/// Message type sent through the save queue: a full snapshot paired with a
/// oneshot sender for the outcome.
type SaveMessage = (TableSet, oneshot::Sender<Result<(), PersistError>>);

/// Handle for queueing saves. Cloning it shares the same writer task.
#[derive(Clone)]
pub struct PersisterHandle {
    save_tx: mpsc::Sender<SaveMessage>,
}

/// A save that has been queued but not necessarily written yet.
pub struct PendingSave {
    reply_rx: oneshot::Receiver<Result<(), PersistError>>,
}

impl PendingSave {
    /// Wait until the writer task has finished (or given up on) this save.
    pub async fn wait(self) -> Result<(), PersistError> {
        self.reply_rx.await.map_err(|_| PersistError::Closed)?
    }
}

impl PersisterHandle {
    /// Queue a snapshot for writing. Saves are written strictly in the order
    /// they are queued.
    pub async fn enqueue(&self, tables: TableSet) -> Result<PendingSave, PersistError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.save_tx
            .send((tables, reply_tx))
            .await
            .map_err(|_| PersistError::Closed)?;
        Ok(PendingSave { reply_rx })
    }

    /// Queue a snapshot and wait for it to land on disk.
    pub async fn save(&self, tables: TableSet) -> Result<(), PersistError> {
        self.enqueue(tables).await?.wait().await
    }
}

/// Spawn the writer task for `path` and return the handle for queueing saves.
/// The task exits once every handle has been dropped.
pub fn spawn(path: PathBuf, retry: RetryPolicy) -> PersisterHandle {
    let (save_tx, save_rx) = mpsc::channel::<SaveMessage>(64);

    let persister = Persister {
        path,
        retry,
        save_rx,
    };

    tokio::spawn(persister.run());

    PersisterHandle { save_tx }
}

struct Persister {
    path: PathBuf,
    retry: RetryPolicy,
    save_rx: mpsc::Receiver<SaveMessage>,
}

impl Persister {
    async fn run(mut self) {
        while let Some((tables, reply_tx)) = self.save_rx.recv().await {
            let result = self.save_with_retry(tables).await;
            // The caller may have stopped waiting; the write still happened.
            let _ = reply_tx.send(result);
        }
        tracing::debug!(path = %self.path.display(), "persister stopped");
    }

    async fn save_with_retry(&self, tables: TableSet) -> Result<(), PersistError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.write_once(tables.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        "save attempt {}/{} to {} failed: {}",
                        attempt,
                        max_attempts,
                        self.path.display(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "giving up on save to {} after {} attempts: {}",
                        self.path.display(),
                        attempt,
                        e
                    );
                    return Err(PersistError::Exhausted {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    async fn write_once(&self, tables: TableSet) -> Result<(), SnapshotError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_snapshot(&path, &tables))
            .await
            .map_err(|e| SnapshotError::Io(std::io::Error::other(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::load_snapshot;
    use taskd_core::Record;
    use tempfile::TempDir;

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn with_ids(ids: &[&str]) -> TableSet {
        let mut tables = TableSet::new();
        for id in ids {
            tables.insert("tasks", Record::new(*id)).unwrap();
        }
        tables
    }

    #[tokio::test]
    async fn save_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let handle = spawn(path.clone(), fast_retry(3));

        handle.save(with_ids(&["1"])).await.unwrap();

        assert_eq!(load_snapshot(&path).unwrap().unwrap(), with_ids(&["1"]));
    }

    #[tokio::test]
    async fn queued_saves_land_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let handle = spawn(path.clone(), fast_retry(3));

        let first = handle.enqueue(with_ids(&["1"])).await.unwrap();
        let second = handle.enqueue(with_ids(&["1", "2"])).await.unwrap();

        second.wait().await.unwrap();
        first.wait().await.unwrap();

        assert_eq!(
            load_snapshot(&path).unwrap().unwrap(),
            with_ids(&["1", "2"])
        );
    }

    #[tokio::test]
    async fn failing_save_reports_attempts() {
        let dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be makes every
        // attempt fail.
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let handle = spawn(blocker.join("db.json"), fast_retry(3));

        let err = handle.save(with_ids(&["1"])).await.unwrap_err();

        match err {
            PersistError::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let handle = spawn(path.clone(), fast_retry(0));

        handle.save(with_ids(&["1"])).await.unwrap();
        assert!(path.exists());
    }
}
