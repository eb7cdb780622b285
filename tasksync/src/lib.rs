//! tasksync - Offline-first task list synchronization
//!
//! This crate provides a unified API for the tasksync client and backend.
//!
//! # Example
//!
//! ```no_run
//! use tasksync::{Client, ClientConfig};
//!
//! # async fn run() -> tasksync::SyncResult<()> {
//! let client = Client::connect(&ClientConfig::default()).await?;
//! let task = client.add_task("Buy milk", "").await?;
//! client.toggle_task(&task.id).await?;
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

// Re-export client types
pub use tasksync_client::{
    Client, ClientConfig, ConnectivityMonitor, HttpTaskService, LocalStore, RemoteTaskService,
    SyncReport, TaskStateStore,
};

// Re-export server types
pub use tasksync_server::{router, AppState as Server, ServerConfig};

// Re-export core types that external applications may need
pub use tasksync_core::errors::SyncError;
pub use tasksync_core::models::{SyncStatus, Task};
pub use tasksync_core::protocol::{TaskPayload, TaskRecord, TaskUpdate};
pub use tasksync_core::SyncResult;
