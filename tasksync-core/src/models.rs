use crate::{errors::SyncError, protocol::TaskPayload, SyncResult};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncStatus {
    /// Local state has not been acknowledged by the server since the last mutation
    #[default]
    Pending,
    Synced,
}

/// A task as held by the client and persisted in the local store.
///
/// `id` starts out as a client-generated UUID and is replaced, exactly once,
/// by the server-assigned id when the task is first synchronized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "StoredTask")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub sync_status: SyncStatus,
    /// Epoch milliseconds of the last local mutation
    pub updated_at: i64,
    /// Set once `id` is the server's id; later pushes update in place
    pub server_assigned: bool,
}

/// Persisted shape of a [`Task`], including records written before
/// `serverAssigned` existed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    #[serde(alias = "_id")]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    sync_status: SyncStatus,
    updated_at: i64,
    server_assigned: Option<bool>,
}

impl From<StoredTask> for Task {
    fn from(stored: StoredTask) -> Self {
        // Without the flag, a synced record can only carry a server id
        let server_assigned = stored
            .server_assigned
            .unwrap_or(stored.sync_status == SyncStatus::Synced);

        Self {
            id: stored.id,
            title: stored.title,
            description: stored.description,
            completed: stored.completed,
            sync_status: stored.sync_status,
            updated_at: stored.updated_at,
            server_assigned,
        }
    }
}

impl Task {
    /// Build a new locally-created task. Fails on a blank title.
    pub fn new_local(title: &str, description: &str, now: i64) -> SyncResult<Self> {
        let title = validate_title(title)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: description.to_string(),
            completed: false,
            sync_status: SyncStatus::Pending,
            updated_at: now,
            server_assigned: false,
        })
    }

    /// Flip `completed` and mark the task as needing sync again.
    pub fn toggle(&mut self, now: i64) {
        self.completed = !self.completed;
        self.touch(now);
    }

    /// Mark the task pending and bump `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now: i64) {
        self.sync_status = SyncStatus::Pending;
        self.updated_at = now.max(self.updated_at);
    }

    /// Record a successful create: adopt the server id and mark synced.
    pub fn mark_synced(&mut self, server_id: String) {
        self.id = server_id;
        self.server_assigned = true;
        self.sync_status = SyncStatus::Synced;
    }

    /// Record a successful update of a task the server already knows.
    pub fn mark_acknowledged(&mut self) {
        self.sync_status = SyncStatus::Synced;
    }

    pub fn is_pending(&self) -> bool {
        self.sync_status == SyncStatus::Pending
    }

    /// The outbound representation: id and sync status are never sent.
    pub fn to_payload(&self) -> TaskPayload {
        TaskPayload {
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            updated_at: self.updated_at,
        }
    }
}

/// Trim and check a title, returning the trimmed value.
pub fn validate_title(title: &str) -> SyncResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(SyncError::InvalidTask("title must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
