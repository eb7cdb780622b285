use crate::{
    errors::{ApiError, ServerResult},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tasksync_core::{
    models::validate_title,
    protocol::{MessageResponse, TaskPayload, TaskRecord, TaskUpdate},
};

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::bad_request("Invalid task body", Some(rejection.body_text())).into()),
    }
}

fn task_not_found(id: &str) -> ApiError {
    ApiError::not_found(format!("Task not found: {}", id))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TaskPayload>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<TaskRecord>)> {
    let mut payload = parse_body(body)?;
    payload.title = validate_title(&payload.title)?;

    let record = state.db.create_task(&payload).await?;
    tracing::info!("Created task \"{}\" ({})", record.title, record.id);

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_tasks(State(state): State<Arc<AppState>>) -> ServerResult<Json<Vec<TaskRecord>>> {
    Ok(Json(state.db.list_tasks().await?))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<TaskRecord>> {
    let record = state.db.get_task(&id).await?.ok_or_else(|| task_not_found(&id))?;
    Ok(Json(record))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<TaskUpdate>, JsonRejection>,
) -> ServerResult<Json<TaskRecord>> {
    let mut update = parse_body(body)?;
    if let Some(title) = update.title.as_deref() {
        update.title = Some(validate_title(title)?);
    }

    let record = state
        .db
        .update_task(&id, &update)
        .await?
        .ok_or_else(|| task_not_found(&id))?;
    tracing::info!("Updated task \"{}\" ({})", record.title, record.id);

    Ok(Json(record))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    if !state.db.delete_task(&id).await? {
        return Err(task_not_found(&id).into());
    }
    tracing::info!("Deleted task {}", id);

    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}
