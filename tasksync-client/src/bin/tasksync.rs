//! Command-line front end for the task client.
//!
//! ```bash
//! tasksync add "Buy milk" --description "2 litres"
//! tasksync toggle <id>
//! tasksync list
//! TASKSYNC_API_URL=http://server:3000/api tasksync sync
//! ```

use clap::{Parser, Subcommand};
use tasksync_client::{Client, ClientConfig};
use tasksync_core::{SyncResult, SyncStatus, Task};

#[derive(Parser)]
#[command(name = "tasksync", about = "Offline-first task list")]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every task with its sync status
    List,
    /// Add a task
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Flip a task between completed and incomplete
    Toggle { id: String },
    /// Delete a task from this device
    Remove { id: String },
    /// Push pending tasks now
    Sync,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tasksync_client=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> SyncResult<()> {
    let client = Client::connect(&cli.config).await?;
    let result = execute(&client, cli.command).await;
    client.shutdown().await;
    result
}

async fn execute(client: &Client, command: Commands) -> SyncResult<()> {
    match command {
        Commands::List => {
            // Same as opening the app: push whatever is pending when online
            if client.is_connected() {
                client.synchronize().await?;
            }
        }
        Commands::Add { title, description } => {
            let task = client.add_task(&title, &description).await?;
            println!("Added {}", task.id);
        }
        Commands::Toggle { id } => {
            let task = client.toggle_task(&id).await?;
            println!(
                "{} is now {}",
                task.id,
                if task.completed { "completed" } else { "incomplete" }
            );
        }
        Commands::Remove { id } => {
            let task = client.remove_task(&id).await?;
            println!("Removed \"{}\"", task.title);
        }
        Commands::Sync => {
            if !client.is_connected() {
                println!("Offline: {} task(s) waiting to sync", client.count_pending_sync());
                return Ok(());
            }
            let report = client.synchronize().await?;
            println!(
                "Synced {} task(s), {} failed",
                report.synced_count(),
                report.failed_count()
            );
            for failure in &report.failed {
                println!("  {} \"{}\": {}", failure.task_id, failure.title, failure.message);
            }
        }
    }

    // Queued behind any pass the command triggered, so the list is settled
    client.reload().await?;
    print_tasks(&client.get_all_tasks());
    Ok(())
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks");
        return;
    }

    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        let status = match task.sync_status {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
        };
        println!("[{}] {} ({}, {})", mark, task.title, task.id, status);
        if !task.description.is_empty() {
            println!("    {}", task.description);
        }
    }
}
