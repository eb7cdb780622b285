use clap::Parser;
use std::sync::Arc;
use tasksync_server::{open_database, router, AppState, ServerConfig, ServerResult};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("tasksync_server=debug,tower_http=debug")
    });
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Err(e) = run(config).await {
        tracing::error!(%e, "Server stopped");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> ServerResult<()> {
    let db = match open_database(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(%e, url = %config.database_url, "Failed to initialize database");
            return Err(e);
        }
    };

    let app = router(Arc::new(AppState { db }));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(%e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
