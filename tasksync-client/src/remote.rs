use async_trait::async_trait;
use std::time::Duration;
use tasksync_core::{
    errors::SyncError,
    protocol::{CreatedTask, TaskPayload, TaskUpdate, TASKS_PATH},
    SyncResult,
};

/// The remote authority tasks are pushed to.
#[async_trait]
pub trait RemoteTaskService: Send + Sync + 'static {
    /// Create a task server-side and return its canonical id.
    async fn create(&self, payload: &TaskPayload) -> SyncResult<String>;

    /// Overwrite a task the server already assigned an id to.
    async fn update(&self, id: &str, payload: &TaskPayload) -> SyncResult<()>;
}

/// JSON-over-HTTP client for the task backend.
pub struct HttpTaskService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTaskService {
    /// `base_url` is the API root, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: &str, timeout: Duration) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}{}", self.base_url, TASKS_PATH)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// Cheap reachability check used by the connectivity probe.
    pub async fn ping(&self) -> bool {
        match self.http.get(self.health_url()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Health check against {} failed: {}", self.base_url, e);
                false
            }
        }
    }
}

#[async_trait]
impl RemoteTaskService for HttpTaskService {
    async fn create(&self, payload: &TaskPayload) -> SyncResult<String> {
        let response = self
            .http
            .post(self.tasks_url())
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(response).await?;
        let status = response.status().as_u16();

        let created: CreatedTask = response.json().await.map_err(|e| SyncError::Server {
            status,
            message: format!("unrecognised create response: {}", e),
        })?;

        tracing::debug!("Server accepted task \"{}\" as {}", payload.title, created.id);
        Ok(created.id)
    }

    async fn update(&self, id: &str, payload: &TaskPayload) -> SyncResult<()> {
        let update = TaskUpdate {
            title: Some(payload.title.clone()),
            description: Some(payload.description.clone()),
            completed: Some(payload.completed),
            updated_at: Some(payload.updated_at),
        };

        let response = self
            .http
            .put(format!("{}/{}", self.tasks_url(), id))
            .json(&update)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await?;
        tracing::debug!("Server updated task {}", id);
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> SyncError {
    SyncError::Transport(err.to_string())
}

async fn ensure_success(response: reqwest::Response) -> SyncResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());

    Err(SyncError::Server {
        status: status.as_u16(),
        message,
    })
}
