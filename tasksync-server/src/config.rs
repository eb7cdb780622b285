use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "tasksync-server", about = "Task backend for tasksync clients")]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// SQLite database holding the tasks
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://tasks.db")]
    pub database_url: String,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
