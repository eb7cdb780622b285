pub mod client;
pub mod config;
pub mod connectivity;
pub mod database;
pub mod events;
pub mod handlers;
pub mod queries;
pub mod remote;
pub mod state;
pub mod storage;
pub mod sync_engine;

pub use client::Client;
pub use config::ClientConfig;
pub use connectivity::{ConnectivityMonitor, Subscription};
pub use database::ClientDatabase;
pub use remote::{HttpTaskService, RemoteTaskService};
pub use state::TaskStateStore;
pub use storage::{LocalStore, MemoryTaskStore};
pub use sync_engine::{SyncEngine, SyncReport};
