// ABOUTME: Task CRUD API handlers for creating, searching, updating, and deleting tasks.
// ABOUTME: Validates request bodies and query filters before delegating to the database facade.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use taskd_core::{Filter, Patch, TASKS_TABLE, Task};

use crate::api::error::{ApiError, ApiJson};
use crate::app_state::SharedState;

/// Request body for creating a task. Fields are kept as raw JSON so type
/// errors produce a 400 with a readable message.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: Option<Value>,
    pub description: Option<Value>,
}

/// Query string for searching tasks. At most one field may be set.
#[derive(Debug, Default, Deserialize)]
pub struct SearchTasksQuery {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for updating a task. Every field is optional.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub completed: Option<Value>,
}

fn non_blank_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

fn require_id(id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::bad_request("task id is required"));
    }
    Ok(())
}

impl SearchTasksQuery {
    /// Turn the query into at most one filter.
    fn into_filter(self) -> Result<Option<Filter>, ApiError> {
        let mut filters = Vec::new();
        if let Some(id) = self.id {
            filters.push(Filter::by_id(id));
        }
        if let Some(name) = self.name {
            filters.push(Filter::new("name", name));
        }
        if let Some(description) = self.description {
            filters.push(Filter::new("description", description));
        }

        if filters.len() > 1 {
            return Err(ApiError::bad_request(
                "use exactly one filter to search; options: id, name, description",
            ));
        }
        Ok(filters.pop())
    }
}

impl UpdateTaskRequest {
    /// Validate field types and build the patch to merge into the stored task.
    fn into_patch(self) -> Result<Patch, ApiError> {
        let mut patch = Patch::new();

        match self.name {
            None => {}
            Some(value @ Value::String(_)) => {
                patch.insert("name".to_string(), value);
            }
            Some(_) => return Err(ApiError::bad_request("field 'name' must be a string")),
        }

        match self.description {
            None => {}
            Some(value @ Value::String(_)) => {
                patch.insert("description".to_string(), value);
            }
            Some(_) => {
                return Err(ApiError::bad_request(
                    "field 'description' must be a string",
                ));
            }
        }

        match self.completed {
            None => {}
            Some(value @ Value::Bool(_)) => {
                patch.insert("completed".to_string(), value);
            }
            Some(_) => return Err(ApiError::bad_request("field 'completed' must be a boolean")),
        }

        if patch.is_empty() {
            return Err(ApiError::bad_request("no valid fields to update"));
        }

        patch.insert("updatedAt".to_string(), serde_json::json!(Utc::now()));
        Ok(patch)
    }
}

/// POST /tasks - Create a new task.
pub async fn create_task(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(description)) = (
        non_blank_string(req.name),
        non_blank_string(req.description),
    ) else {
        return Err(ApiError::bad_request("name and description are required"));
    };

    let task = Task::new(name, Some(description));
    let stored = state.db.insert(TASKS_TABLE, task.into_record()).await?;
    let task = Task::from_record(stored)?;

    tracing::info!("created task {}", task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /tasks - List tasks, optionally filtered by one of id, name, or description.
pub async fn search_tasks(
    State(state): State<SharedState>,
    Query(query): Query<SearchTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let filter = query.into_filter()?;
    let records = state.db.select(TASKS_TABLE, filter.as_ref()).await;

    let tasks = records
        .into_iter()
        .map(Task::from_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(tasks))
}

/// PUT /tasks/{id} - Update name, description, or completion of a task.
pub async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    require_id(&id)?;
    let patch = req.into_patch()?;

    let merged = state.db.update(TASKS_TABLE, &id, &patch).await?;
    Ok(Json(Task::from_record(merged)?))
}

/// DELETE /tasks/{id} - Delete a task.
pub async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id)?;
    state.db.delete(TASKS_TABLE, &id).await?;

    tracing::info!("deleted task {}", id);
    Ok(StatusCode::NO_CONTENT)
}
