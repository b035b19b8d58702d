// ABOUTME: API module containing the HTTP handler functions for the taskd REST API.
// ABOUTME: Organized into the task CRUD handlers and the shared error type.

pub mod error;
pub mod tasks;

pub use error::{ApiError, ApiJson};
