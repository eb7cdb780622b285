//! Event callbacks for the task client
//!
//! Applications register closures to hear about local mutations, sync passes
//! and connectivity changes. Callbacks run synchronously wherever the event is
//! produced (the client's worker task, or whoever reports connectivity), so
//! they must not block or call back into the client.
//!
//! # Event Types
//!
//! - Task events: `TaskCreated`, `TaskUpdated`, `TaskDeleted`, `TaskRemapped`
//! - Sync events: `SyncStarted`, `SyncCompleted`, `SyncError`
//! - Connection events: `ConnectionChanged`

use std::sync::Mutex;
use tasksync_core::{errors::SyncError, SyncResult};

/// Discriminant of [`SyncEvent`], used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    /// A locally-created task received its server id
    TaskRemapped,
    SyncStarted,
    SyncCompleted,
    /// Pushing a single task failed; it stays pending
    SyncError,
    ConnectionChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    TaskCreated { id: String, title: String },
    TaskUpdated { id: String, completed: bool },
    TaskDeleted { id: String },
    TaskRemapped { old_id: String, new_id: String },
    SyncStarted { pending: usize },
    SyncCompleted { synced: usize, failed: usize },
    SyncError { task_id: String, message: String },
    ConnectionChanged { online: bool },
}

impl SyncEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            SyncEvent::TaskCreated { .. } => EventType::TaskCreated,
            SyncEvent::TaskUpdated { .. } => EventType::TaskUpdated,
            SyncEvent::TaskDeleted { .. } => EventType::TaskDeleted,
            SyncEvent::TaskRemapped { .. } => EventType::TaskRemapped,
            SyncEvent::SyncStarted { .. } => EventType::SyncStarted,
            SyncEvent::SyncCompleted { .. } => EventType::SyncCompleted,
            SyncEvent::SyncError { .. } => EventType::SyncError,
            SyncEvent::ConnectionChanged { .. } => EventType::ConnectionChanged,
        }
    }
}

type EventCallback = Box<dyn Fn(SyncEvent) + Send + 'static>;

struct CallbackEntry {
    callback: EventCallback,
    event_filter: Option<EventType>,
}

pub struct EventDispatcher {
    callbacks: Mutex<Vec<CallbackEntry>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback for every event
    ///
    /// # Example
    ///
    /// ```rust
    /// use tasksync_client::events::{EventDispatcher, SyncEvent};
    ///
    /// let dispatcher = EventDispatcher::new();
    ///
    /// dispatcher.register_callback(|event| {
    ///     if let SyncEvent::TaskRemapped { old_id, new_id } = event {
    ///         println!("{} is now {}", old_id, new_id);
    ///     }
    /// }).unwrap();
    /// ```
    pub fn register_callback<F>(&self, callback: F) -> SyncResult<()>
    where
        F: Fn(SyncEvent) + Send + 'static,
    {
        self.push(Box::new(callback), None)
    }

    /// Register a callback that only receives events of `event_filter` type
    pub fn register_callback_filtered<F>(&self, callback: F, event_filter: EventType) -> SyncResult<()>
    where
        F: Fn(SyncEvent) + Send + 'static,
    {
        self.push(Box::new(callback), Some(event_filter))
    }

    fn push(&self, callback: EventCallback, event_filter: Option<EventType>) -> SyncResult<()> {
        let mut callbacks = self
            .callbacks
            .lock()
            .map_err(|_| SyncError::LockError("callbacks".into()))?;

        callbacks.push(CallbackEntry {
            callback,
            event_filter,
        });

        Ok(())
    }

    pub fn emit(&self, event: SyncEvent) {
        let callbacks = match self.callbacks.lock() {
            Ok(callbacks) => callbacks,
            Err(_) => {
                tracing::error!("Failed to acquire callback lock for event emission");
                return;
            }
        };

        let event_type = event.event_type();
        for entry in callbacks.iter() {
            if let Some(filter) = entry.event_filter {
                if filter != event_type {
                    continue;
                }
            }

            (entry.callback)(event.clone());
        }
    }

    pub fn emit_task_created(&self, id: &str, title: &str) {
        self.emit(SyncEvent::TaskCreated {
            id: id.to_string(),
            title: title.to_string(),
        });
    }

    pub fn emit_task_updated(&self, id: &str, completed: bool) {
        self.emit(SyncEvent::TaskUpdated {
            id: id.to_string(),
            completed,
        });
    }

    pub fn emit_task_deleted(&self, id: &str) {
        self.emit(SyncEvent::TaskDeleted { id: id.to_string() });
    }

    pub fn emit_task_remapped(&self, old_id: &str, new_id: &str) {
        self.emit(SyncEvent::TaskRemapped {
            old_id: old_id.to_string(),
            new_id: new_id.to_string(),
        });
    }

    pub fn emit_sync_started(&self, pending: usize) {
        self.emit(SyncEvent::SyncStarted { pending });
    }

    pub fn emit_sync_completed(&self, synced: usize, failed: usize) {
        self.emit(SyncEvent::SyncCompleted { synced, failed });
    }

    pub fn emit_sync_error(&self, task_id: &str, message: &str) {
        self.emit(SyncEvent::SyncError {
            task_id: task_id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn emit_connection_changed(&self, online: bool) {
        self.emit(SyncEvent::ConnectionChanged { online });
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
