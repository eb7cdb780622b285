use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tasksync_client::{LocalStore, MemoryTaskStore, TaskStateStore};
use tasksync_core::{SyncError, SyncResult, Task, TaskPayload};
use tasksync_client::RemoteTaskService;

/// Remote double: hands out ids `srv1`, `srv2`, ... and fails any task whose
/// title has been scripted to fail.
#[derive(Default)]
pub struct ScriptedRemote {
    failing_titles: Mutex<HashSet<String>>,
    created: Mutex<Vec<TaskPayload>>,
    updated: Mutex<Vec<(String, TaskPayload)>>,
    next_id: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().insert(title.to_string());
    }

    pub fn recover_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().remove(title);
    }

    pub fn create_calls(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn created_payloads(&self) -> Vec<TaskPayload> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, TaskPayload)> {
        self.updated.lock().unwrap().clone()
    }

    fn should_fail(&self, title: &str) -> bool {
        self.failing_titles.lock().unwrap().contains(title)
    }
}

#[async_trait]
impl RemoteTaskService for ScriptedRemote {
    async fn create(&self, payload: &TaskPayload) -> SyncResult<String> {
        if self.should_fail(&payload.title) {
            return Err(SyncError::Transport("connection reset".to_string()));
        }
        self.created.lock().unwrap().push(payload.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("srv{}", n))
    }

    async fn update(&self, id: &str, payload: &TaskPayload) -> SyncResult<()> {
        if self.should_fail(&payload.title) {
            return Err(SyncError::Server {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        self.updated
            .lock()
            .unwrap()
            .push((id.to_string(), payload.clone()));
        Ok(())
    }
}

/// Memory store whose writes can be switched off to simulate a full disk.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryTaskStore,
    fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.inner.write_count()
    }
}

#[async_trait]
impl LocalStore for FlakyStore {
    async fn read(&self) -> SyncResult<Vec<Task>> {
        self.inner.read().await
    }

    async fn write(&self, tasks: &[Task]) -> SyncResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        self.inner.write(tasks).await
    }
}

/// Wait until the published list satisfies `predicate`.
#[allow(dead_code)]
pub async fn wait_for_state<F>(state: &TaskStateStore, predicate: F) -> Vec<Task>
where
    F: Fn(&[Task]) -> bool,
{
    let mut rx = state.watch();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let current = rx.borrow_and_update();
                if predicate(current.as_slice()) {
                    return current.as_ref().clone();
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("state never reached the expected shape")
}
