// ABOUTME: HTTP server for taskd, providing the REST API over the task table.
// ABOUTME: Uses Axum with a shared, already-loaded database handle.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, TaskdConfig};
pub use routes::create_router;
