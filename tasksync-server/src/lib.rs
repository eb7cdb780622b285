pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod queries;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::ServerConfig;
pub use database::ServerDatabase;
pub use errors::{ApiError, ServerError, ServerResult};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<database::ServerDatabase>,
}

/// Routes served by the backend. The task API lives under `/api`.
pub fn router(state: Arc<AppState>) -> Router {
    let tasks = Router::new()
        .route("/tasks", get(api::list_tasks).post(api::create_task))
        .route(
            "/tasks/:id",
            get(api::get_task)
                .put(api::update_task)
                .delete(api::delete_task),
        )
        .route("/health", get(health));

    Router::new()
        .route("/", get(|| async { "API is running..." }))
        .route("/health", get(health))
        .nest("/api", tasks)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Open (creating if needed) and migrate the database at `database_url`.
pub async fn open_database(database_url: &str) -> ServerResult<Arc<ServerDatabase>> {
    let db = ServerDatabase::new(database_url).await?;
    db.run_migrations().await?;
    Ok(Arc::new(db))
}
