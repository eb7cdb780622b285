//! Local mutation handlers.
//!
//! Each handler reads the full list from the local store, applies one
//! mutation, writes the full list back and then publishes it. A failed write
//! leaves the published state untouched.

use crate::{events::EventDispatcher, state::TaskStateStore, storage::LocalStore};
use std::sync::Arc;
use tasksync_core::{
    errors::SyncError,
    models::{now_millis, validate_title, Task},
    SyncResult,
};

pub struct MutationHandlers {
    store: Arc<dyn LocalStore>,
    state: TaskStateStore,
    events: Arc<EventDispatcher>,
}

impl MutationHandlers {
    pub fn new(
        store: Arc<dyn LocalStore>,
        state: TaskStateStore,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            store,
            state,
            events,
        }
    }

    /// Reload the persisted list into the state store.
    pub async fn load(&self) -> SyncResult<Vec<Task>> {
        let tasks = self.store.read().await?;
        self.state.replace_all(tasks.clone());
        Ok(tasks)
    }

    pub async fn add(&self, title: &str, description: &str) -> SyncResult<Task> {
        // Validate before touching storage
        validate_title(title)?;

        let mut tasks = self.store.read().await?;
        let task = Task::new_local(title, description, now_millis())?;
        tasks.push(task.clone());

        self.commit(tasks).await?;
        tracing::info!("Added task: \"{}\" ({})", task.title, task.id);
        self.events.emit_task_created(&task.id, &task.title);

        Ok(task)
    }

    pub async fn toggle(&self, id: &str) -> SyncResult<Task> {
        let mut tasks = self.store.read().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| SyncError::TaskNotFound(id.to_string()))?;

        task.toggle(now_millis());
        let toggled = task.clone();

        self.commit(tasks).await?;
        tracing::info!(
            "Toggled task: \"{}\" - {}",
            toggled.title,
            if toggled.completed { "completed" } else { "incomplete" }
        );
        self.events.emit_task_updated(&toggled.id, toggled.completed);

        Ok(toggled)
    }

    /// Local-only removal; the server copy, if any, is left alone.
    pub async fn remove(&self, id: &str) -> SyncResult<Task> {
        let mut tasks = self.store.read().await?;
        let index = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| SyncError::TaskNotFound(id.to_string()))?;

        let removed = tasks.remove(index);

        self.commit(tasks).await?;
        tracing::info!("Deleted task: \"{}\" ({})", removed.title, removed.id);
        self.events.emit_task_deleted(&removed.id);

        Ok(removed)
    }

    async fn commit(&self, tasks: Vec<Task>) -> SyncResult<()> {
        if let Err(e) = self.store.write(&tasks).await {
            tracing::error!("Failed to persist tasks: {}", e);
            return Err(e);
        }
        self.state.replace_all(tasks);
        Ok(())
    }
}
