use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt::{Display, Formatter};
use tasksync_core::{protocol::MessageResponse, SyncError};
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("{0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    ApiError(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    BadRequest(String, String),
    NotFound(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, meta: Option<String>) -> Self {
        Self::BadRequest(message.into(), meta.unwrap_or_default())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(message, meta) => {
                write!(f, "Status=400, BadRequest: {}. {}", message, meta)
            }
            ApiError::NotFound(message) => write!(f, "Status=404, NotFound: {}", message),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::ApiError(e) => {
                tracing::warn!("{}", e);
                match e {
                    ApiError::BadRequest(message, _) => (StatusCode::BAD_REQUEST, message),
                    ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
                }
            }
            ServerError::SyncError(SyncError::InvalidTask(message)) => {
                tracing::warn!("Rejected task: {}", message);
                (StatusCode::BAD_REQUEST, message)
            }
            other => {
                tracing::error!(%other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected Error".to_string(),
                )
            }
        };

        (status, axum::Json(MessageResponse { message })).into_response()
    }
}
