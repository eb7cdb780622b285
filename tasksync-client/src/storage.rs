//! Local persistence contract for the task list.
//!
//! The whole list is stored as one blob; there is no field-level update.
//! [`ClientDatabase`](crate::database::ClientDatabase) is the durable
//! implementation, [`MemoryTaskStore`] keeps the blob in process memory.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tasksync_core::{models::Task, SyncResult};
use tokio::sync::Mutex;

/// Fixed key the task list is stored under.
pub const TASKS_KEY: &str = "TASKS";

#[async_trait]
pub trait LocalStore: Send + Sync + 'static {
    /// The full persisted list, or empty if nothing has been written yet.
    async fn read(&self) -> SyncResult<Vec<Task>>;

    /// Replace the persisted list. Never partially applied.
    async fn write(&self, tasks: &[Task]) -> SyncResult<()>;
}

/// In-memory store holding the serialized list, so reads and writes go
/// through the same encoding as the SQLite store.
#[derive(Default)]
pub struct MemoryTaskStore {
    blob: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: &[Task]) -> SyncResult<Self> {
        let blob = serde_json::to_string(tasks)?;
        Ok(Self {
            blob: Mutex::new(Some(blob)),
            writes: AtomicUsize::new(0),
        })
    }

    /// Number of completed writes since construction
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalStore for MemoryTaskStore {
    async fn read(&self) -> SyncResult<Vec<Task>> {
        let blob = self.blob.lock().await;
        match blob.as_deref() {
            Some(data) => Ok(serde_json::from_str(data)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, tasks: &[Task]) -> SyncResult<()> {
        // Encode before taking the lock so a failure leaves the old blob intact
        let data = serde_json::to_string(tasks)?;
        *self.blob.lock().await = Some(data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
