// ABOUTME: Shared application state for the taskd HTTP server.
// ABOUTME: Holds the opened database handle that every handler reads and writes through.

use std::sync::Arc;

use taskd_store::Database;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub db: Database,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wrap an already-opened database. Taking a `Database` rather than a path
    /// means the load has finished before any route can see the state.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}
