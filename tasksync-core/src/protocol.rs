//! Wire types shared by the HTTP client and the backend.

use serde::{Deserialize, Serialize};

/// Path of the task collection, relative to the API base (`/api`).
pub const TASKS_PATH: &str = "/tasks";

/// Body of `POST /tasks`. Carries only the user-visible fields of a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub updated_at: i64,
}

/// Body of `PUT /tasks/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// A task as stored and returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub updated_at: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Minimal view of a create response: only the server id is recognised.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTask {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
