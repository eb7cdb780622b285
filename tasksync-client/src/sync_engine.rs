use crate::{
    events::EventDispatcher, remote::RemoteTaskService, state::TaskStateStore,
    storage::LocalStore,
};
use std::sync::Arc;
use tasksync_core::SyncResult;

/// A locally-created task that received its server id during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRemap {
    pub old_id: String,
    pub new_id: String,
}

/// A task whose push failed. It keeps its id and stays pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub task_id: String,
    pub title: String,
    pub message: String,
}

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Ids of tasks the server acknowledged, after remapping
    pub synced: Vec<String>,
    pub remapped: Vec<IdRemap>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    /// True when the pass found nothing pending.
    pub fn is_noop(&self) -> bool {
        self.synced.is_empty() && self.failed.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn synced_count(&self) -> usize {
        self.synced.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Pushes pending tasks to the remote service.
///
/// The engine holds no lock of its own; callers run at most one pass at a
/// time (the client's worker task guarantees this).
pub struct SyncEngine {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteTaskService>,
    state: TaskStateStore,
    events: Arc<EventDispatcher>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteTaskService>,
        state: TaskStateStore,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            store,
            remote,
            state,
            events,
        }
    }

    /// Run one pass over every pending task, in list order.
    ///
    /// A failed push leaves that task pending and moves on to the next one.
    /// The resulting list is persisted and published whatever the individual
    /// outcomes were. Only a storage failure fails the pass as a whole.
    pub async fn synchronize(&self) -> SyncResult<SyncReport> {
        let mut tasks = self.store.read().await?;
        let pending = tasks.iter().filter(|t| t.is_pending()).count();

        if pending == 0 {
            tracing::info!("No pending tasks to sync");
            return Ok(SyncReport::default());
        }

        tracing::info!("Starting sync for {} pending task(s)", pending);
        self.events.emit_sync_started(pending);

        let mut report = SyncReport::default();

        for task in tasks.iter_mut().filter(|t| t.is_pending()) {
            let payload = task.to_payload();

            let outcome = if task.server_assigned {
                tracing::debug!("Updating task \"{}\" ({})", task.title, task.id);
                self.remote.update(&task.id, &payload).await.map(|()| None)
            } else {
                tracing::debug!("Posting task \"{}\" ({})", task.title, task.id);
                self.remote.create(&payload).await.map(Some)
            };

            match outcome {
                Ok(Some(server_id)) => {
                    let old_id = task.id.clone();
                    task.mark_synced(server_id);
                    tracing::info!(
                        "Task synced: \"{}\" ({} -> {})",
                        task.title,
                        old_id,
                        task.id
                    );
                    self.events.emit_task_remapped(&old_id, &task.id);
                    report.remapped.push(IdRemap {
                        old_id,
                        new_id: task.id.clone(),
                    });
                    report.synced.push(task.id.clone());
                }
                Ok(None) => {
                    task.mark_acknowledged();
                    tracing::info!("Task synced: \"{}\" ({})", task.title, task.id);
                    report.synced.push(task.id.clone());
                }
                Err(e) => {
                    tracing::warn!("Failed to sync task \"{}\" ({}): {}", task.title, task.id, e);
                    self.events.emit_sync_error(&task.id, &e.to_string());
                    report.failed.push(SyncFailure {
                        task_id: task.id.clone(),
                        title: task.title.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Err(e) = self.store.write(&tasks).await {
            tracing::error!("Failed to persist tasks after sync: {}", e);
            return Err(e);
        }
        self.state.replace_all(tasks);
        self.state.record_sync(report.clone());

        tracing::info!(
            "Sync finished: {} synced, {} failed",
            report.synced_count(),
            report.failed_count()
        );
        self.events
            .emit_sync_completed(report.synced_count(), report.failed_count());

        Ok(report)
    }
}
