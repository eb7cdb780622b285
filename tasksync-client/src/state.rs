use crate::sync_engine::SyncReport;
use std::sync::{Arc, Mutex};
use tasksync_core::models::Task;
use tokio::sync::watch;

/// Observable in-memory copy of the task list.
///
/// Cloning is cheap and every clone shares the same state. Only the sync
/// engine and the mutation handlers call [`replace_all`](Self::replace_all).
#[derive(Clone)]
pub struct TaskStateStore {
    inner: Arc<StateInner>,
}

struct StateInner {
    tasks: watch::Sender<Arc<Vec<Task>>>,
    last_report: Mutex<Option<SyncReport>>,
}

impl TaskStateStore {
    pub fn new() -> Self {
        let (tasks, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Arc::new(StateInner {
                tasks,
                last_report: Mutex::new(None),
            }),
        }
    }

    pub fn get_all(&self) -> Vec<Task> {
        self.inner.tasks.borrow().as_ref().clone()
    }

    pub fn snapshot(&self) -> Arc<Vec<Task>> {
        self.inner.tasks.borrow().clone()
    }

    pub fn replace_all(&self, tasks: Vec<Task>) {
        self.inner.tasks.send_replace(Arc::new(tasks));
    }

    /// Receiver that observes every published list.
    pub fn watch(&self) -> watch::Receiver<Arc<Vec<Task>>> {
        self.inner.tasks.subscribe()
    }

    pub fn find(&self, id: &str) -> Option<Task> {
        self.inner.tasks.borrow().iter().find(|t| t.id == id).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.tasks.borrow().iter().filter(|t| t.is_pending()).count()
    }

    pub(crate) fn record_sync(&self, report: SyncReport) {
        match self.inner.last_report.lock() {
            Ok(mut last) => *last = Some(report),
            Err(_) => tracing::error!("Failed to acquire sync report lock"),
        }
    }

    /// Outcome of the most recent sync pass that had work to do.
    pub fn last_sync_report(&self) -> Option<SyncReport> {
        self.inner
            .last_report
            .lock()
            .ok()
            .and_then(|report| report.clone())
    }
}

impl Default for TaskStateStore {
    fn default() -> Self {
        Self::new()
    }
}
