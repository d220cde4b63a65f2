//! REST client for a PostgREST-style hosted store.
//!
//! Rows live in a single table and are addressed with PostgREST filter syntax:
//! - `PATCH /rest/v1/{table}?id=eq.{id}` with `{"status": ...}`
//! - `GET /rest/v1/{table}?project_id=eq.{project}&select=*&order=created_at.asc`

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, trace, warn};
use url::Url;

use taskboard_models::{ProjectId, TaskId, TaskStatus, WorkItem};

use crate::backend::TaskBackend;
use crate::config::BackendConfig;
use crate::error::{PersistenceError, Result};

/// Body of a status update.
#[derive(Debug, Serialize)]
struct StatusPatch {
    status: TaskStatus,
}

/// HTTP task backend.
#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    endpoint: Url,
    config: BackendConfig,
}

impl RestBackend {
    /// Creates a client for the configured store.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let endpoint = Self::table_url(&config)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Creates a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(BackendConfig::from_env()?)
    }

    /// Returns the table endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn table_url(config: &BackendConfig) -> Result<Url> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| {
            PersistenceError::Configuration(format!("invalid base url {:?}: {}", config.base_url, e))
        })?;
        base.join(&format!("rest/v1/{}", config.table)).map_err(|e| {
            PersistenceError::Configuration(format!("invalid table {:?}: {}", config.table, e))
        })
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.endpoint.clone())
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    fn map_send_error(&self, e: reqwest::Error) -> PersistenceError {
        if e.is_timeout() {
            PersistenceError::Timeout(self.config.request_timeout)
        } else {
            PersistenceError::Request(e)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PersistenceError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TaskBackend for RestBackend {
    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        trace!(task_id = %id, %status, "sending status update");

        let response = self
            .request(reqwest::Method::PATCH)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(&StatusPatch { status })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Self::check_status(response).await?;
        debug!(task_id = %id, %status, "status update accepted");
        Ok(())
    }

    async fn list_tasks(&self, project_id: &ProjectId) -> Result<Vec<WorkItem>> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[
                ("project_id", format!("eq.{}", project_id)),
                ("select", "*".to_string()),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let rows: Vec<serde_json::Value> = serde_json::from_slice(&bytes)?;
        let fetched = rows.len();
        let items: Vec<WorkItem> = rows.into_iter().filter_map(decode_row).collect();

        debug!(project_id = %project_id, count = items.len(), skipped = fetched - items.len(), "fetched tasks");
        Ok(items)
    }
}

/// Decodes one row. A malformed row is skipped so it cannot hide the rest of
/// the board.
fn decode_row(row: serde_json::Value) -> Option<WorkItem> {
    let id = row
        .get("id")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("<missing>")
        .to_string();

    match serde_json::from_value(row) {
        Ok(item) => Some(item),
        Err(e) => {
            warn!(task_id = %id, error = %e, "skipping undecodable task row");
            None
        }
    }
}
