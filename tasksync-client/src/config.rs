use clap::Args;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tasksync.db";
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Client settings. Every field can come from a flag or an environment variable.
#[derive(Debug, Clone, Args)]
pub struct ClientConfig {
    /// SQLite database holding the local task list
    #[arg(long, env = "TASKSYNC_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Base URL of the task API
    #[arg(long = "api-url", env = "TASKSYNC_API_URL", default_value = DEFAULT_API_URL)]
    pub api_base_url: String,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", env = "TASKSYNC_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Seconds between connectivity probes
    #[arg(long = "probe-interval", env = "TASKSYNC_PROBE_INTERVAL_SECS", default_value_t = 5)]
    pub probe_interval_secs: u64,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        // A zero interval would make tokio's ticker panic
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 10,
            probe_interval_secs: 5,
        }
    }
}
