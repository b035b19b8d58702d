// ABOUTME: API error type mapping store and validation failures onto HTTP responses.
// ABOUTME: Every error renders as a JSON body of the form {"error": "message"}.

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskd_core::{StoreError, TaskError};
use taskd_store::DbError;

/// Application-level error returned by the task handlers.
///
/// - `BadRequest` → 400
/// - `NotFound` → 404
/// - `Conflict` → 409
/// - `Internal` → 500
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg,
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// `Json` body extractor whose rejections (bad JSON, wrong content type)
/// render with the same `{"error": ...}` body as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Store(StoreError::RecordNotFound { .. }) => {
                ApiError::NotFound("task not found".to_string())
            }
            DbError::Store(e @ StoreError::DuplicateId { .. }) => ApiError::Conflict(e.to_string()),
            DbError::Persistence(e) => {
                tracing::error!("failed to persist tasks: {}", e);
                ApiError::Internal("failed to persist tasks".to_string())
            }
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        tracing::error!("stored task is malformed: {}", err);
        ApiError::Internal("stored task is malformed".to_string())
    }
}
