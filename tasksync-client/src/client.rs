use crate::{
    config::ClientConfig,
    connectivity::{spawn_probe, ConnectivityMonitor, Subscription},
    database::ClientDatabase,
    events::EventDispatcher,
    handlers::MutationHandlers,
    remote::{HttpTaskService, RemoteTaskService},
    state::TaskStateStore,
    storage::LocalStore,
    sync_engine::{SyncEngine, SyncReport},
};
use std::sync::Arc;
use tasksync_core::{
    errors::SyncError,
    models::{validate_title, Task},
    SyncResult,
};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 100;

type Reply<T> = oneshot::Sender<SyncResult<T>>;

enum Command {
    Add {
        title: String,
        description: String,
        reply: Reply<Task>,
    },
    Toggle {
        id: String,
        reply: Reply<Task>,
    },
    Remove {
        id: String,
        reply: Reply<Task>,
    },
    Synchronize {
        reply: Reply<SyncReport>,
    },
    Reload {
        reply: Reply<Vec<Task>>,
    },
}

/// Entry point for applications: owns the local store, the connectivity
/// subscription and the worker task that serializes every mutation and sync
/// pass.
///
/// All local-store access happens on the worker, one operation at a time, so
/// a sync pass and a user mutation can never interleave their
/// read-modify-write cycles.
pub struct Client {
    command_tx: Option<mpsc::Sender<Command>>,
    state: TaskStateStore,
    connectivity: ConnectivityMonitor,
    event_dispatcher: Arc<EventDispatcher>,
    connectivity_subscription: Option<Subscription>,
    worker: Option<JoinHandle<()>>,
    probe: Option<JoinHandle<()>>,
}

impl Client {
    /// Open the SQLite store and HTTP service described by `config`, check
    /// connectivity once and keep probing in the background.
    pub async fn connect(config: &ClientConfig) -> SyncResult<Self> {
        let db = Arc::new(ClientDatabase::open(&config.database_url).await?);
        let service = Arc::new(HttpTaskService::new(
            &config.api_base_url,
            config.request_timeout(),
        )?);

        let online = service.ping().await;
        if online {
            tracing::info!("Initial check: online ({})", config.api_base_url);
        } else {
            tracing::info!("Initial check: offline ({})", config.api_base_url);
        }

        let connectivity = ConnectivityMonitor::new(online);
        let mut client = Self::start(db, service.clone(), connectivity.clone());
        client.probe = Some(spawn_probe(connectivity, service, config.probe_interval()));

        Ok(client)
    }

    /// Spawn the worker. Must be called from within a tokio runtime.
    pub fn start(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteTaskService>,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        Self::start_with_events(store, remote, connectivity, Arc::new(EventDispatcher::new()))
    }

    /// Like [`start`](Self::start), with callbacks registered up front so they
    /// also see the events emitted during startup.
    pub fn start_with_events(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteTaskService>,
        connectivity: ConnectivityMonitor,
        event_dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        let state = TaskStateStore::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        // Capacity 1: triggers arriving while a pass is queued collapse into it
        let (sync_tx, sync_rx) = mpsc::channel(1);

        let worker = Worker {
            handlers: MutationHandlers::new(store.clone(), state.clone(), event_dispatcher.clone()),
            engine: SyncEngine::new(store, remote, state.clone(), event_dispatcher.clone()),
            connectivity: connectivity.clone(),
        };
        let worker = tokio::spawn(worker.run(command_rx, sync_rx));

        let events = event_dispatcher.clone();
        let subscription = connectivity.subscribe(move |online| {
            events.emit_connection_changed(online);
            if !online {
                return;
            }
            match sync_tx.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Closed(())) => {
                    tracing::debug!("Sync trigger dropped: worker has stopped");
                }
            }
        });

        Self {
            command_tx: Some(command_tx),
            state,
            connectivity,
            event_dispatcher,
            connectivity_subscription: Some(subscription),
            worker: Some(worker),
            probe: None,
        }
    }

    pub fn event_dispatcher(&self) -> Arc<EventDispatcher> {
        self.event_dispatcher.clone()
    }

    pub fn state(&self) -> &TaskStateStore {
        &self.state
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn is_connected(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Current in-memory snapshot of the list.
    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.state.get_all()
    }

    pub fn count_pending_sync(&self) -> usize {
        self.state.pending_count()
    }

    /// Add a task. Returns once it is persisted; when online, a sync pass
    /// runs right after on the worker.
    pub async fn add_task(&self, title: &str, description: &str) -> SyncResult<Task> {
        validate_title(title)?;

        self.request(|reply| Command::Add {
            title: title.to_string(),
            description: description.to_string(),
            reply,
        })
        .await
    }

    pub async fn toggle_task(&self, id: &str) -> SyncResult<Task> {
        self.request(|reply| Command::Toggle {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Remove a task locally. The server is never told.
    pub async fn remove_task(&self, id: &str) -> SyncResult<Task> {
        self.request(|reply| Command::Remove {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Run a sync pass now, after any work already queued on the worker.
    pub async fn synchronize(&self) -> SyncResult<SyncReport> {
        self.request(|reply| Command::Synchronize { reply }).await
    }

    /// Re-read the local store and republish it.
    pub async fn reload(&self) -> SyncResult<Vec<Task>> {
        self.request(|reply| Command::Reload { reply }).await
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> SyncResult<T> {
        let command_tx = self.command_tx.as_ref().ok_or(SyncError::EngineStopped)?;
        let (reply, response) = oneshot::channel();

        command_tx
            .send(make(reply))
            .await
            .map_err(|_| SyncError::EngineStopped)?;

        response.await.map_err(|_| SyncError::EngineStopped)?
    }

    /// Stop probing, detach from connectivity and wait for queued work to
    /// finish.
    pub async fn shutdown(mut self) {
        if let Some(probe) = self.probe.take() {
            probe.abort();
        }
        self.connectivity_subscription.take();
        self.command_tx.take();

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::error!("Task client worker ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(probe) = self.probe.take() {
            probe.abort();
        }
    }
}

struct Worker {
    handlers: MutationHandlers,
    engine: SyncEngine,
    connectivity: ConnectivityMonitor,
}

impl Worker {
    async fn run(self, mut commands: mpsc::Receiver<Command>, mut sync_triggers: mpsc::Receiver<()>) {
        match self.handlers.load().await {
            Ok(tasks) => tracing::info!("Loaded {} task(s) from local store", tasks.len()),
            Err(e) => tracing::error!("Failed to load tasks from local store: {}", e),
        }

        let mut triggers_open = true;
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                trigger = sync_triggers.recv(), if triggers_open => match trigger {
                    Some(()) => {
                        tracing::info!("Connection available - syncing");
                        self.run_sync().await;
                    }
                    None => triggers_open = false,
                },
            }
        }

        tracing::info!("Task client worker stopped");
    }

    async fn handle_command(&self, command: Command) {
        match command {
            Command::Add {
                title,
                description,
                reply,
            } => {
                let result = self.handlers.add(&title, &description).await;
                let changed = result.is_ok();
                let _ = reply.send(result);
                if changed {
                    self.sync_if_online().await;
                }
            }
            Command::Toggle { id, reply } => {
                let result = self.handlers.toggle(&id).await;
                let changed = result.is_ok();
                let _ = reply.send(result);
                if changed {
                    self.sync_if_online().await;
                }
            }
            Command::Remove { id, reply } => {
                let _ = reply.send(self.handlers.remove(&id).await);
            }
            Command::Synchronize { reply } => {
                let _ = reply.send(self.engine.synchronize().await);
            }
            Command::Reload { reply } => {
                let _ = reply.send(self.handlers.load().await);
            }
        }
    }

    async fn sync_if_online(&self) {
        if self.connectivity.is_online() {
            self.run_sync().await;
        } else {
            tracing::info!("Offline - change kept as pending");
        }
    }

    async fn run_sync(&self) {
        if let Err(e) = self.engine.synchronize().await {
            tracing::error!("Sync pass failed: {}", e);
        }
    }
}
