//! HTTP client for the Paranoia API.
//!
//! Fetches scan targets from the entity listing and submits updates to the
//! ingestion endpoint. Submissions that fail with a transport error, a 5xx
//! status or a 409 conflict are retried with exponential backoff (1 s, 2 s,
//! 4 s).

use std::time::Duration;

use paranoia_core::entity::EntityType;
use paranoia_core::update::IncomingUpdate;
use reqwest::StatusCode;
use serde::Deserialize;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API refused the request (4xx).
    #[error("API rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The API failed to handle the request (5xx).
    #[error("API error ({status}): {body}")]
    Server { status: u16, body: String },
}

impl ClientError {
    /// Whether another attempt might succeed. A 409 means the entity kept
    /// changing under the merge and is worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Rejected { status, .. } => *status == 409,
            ClientError::Request(_) | ClientError::Server { .. } => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct IngestResponse {
    status: String,
}

/// Client for one Paranoia API instance.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
    retry_delays: Vec<Duration>,
}

impl ApiClient {
    /// * `api_url` - Base URL, e.g. `http://127.0.0.1:8000`.
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            retry_delays: RETRY_DELAYS_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        }
    }

    /// Replace the backoff schedule.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Identifiers of every entity of `entity_type`. An empty listing (404
    /// `NO_ENTITIES`) is an empty vector, not an error.
    pub async fn fetch_targets(&self, entity_type: EntityType) -> Result<Vec<String>, ClientError> {
        let response = self
            .client
            .get(format!(
                "{}/api/v1/entities?type={}",
                self.api_url,
                entity_type.as_str()
            ))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let response = Self::ensure_success(response).await?;
        let body: DataResponse<Vec<String>> = response.json().await?;
        Ok(body.data)
    }

    /// Submit one update, retrying transient failures.
    ///
    /// Returns the ingestion status (`added`, `updated`, `unchanged`).
    pub async fn submit(&self, update: &IncomingUpdate) -> Result<String, ClientError> {
        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_submit(update).await {
                Ok(status) => return Ok(status),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        entity = %update.entity,
                        metric = %update.metric,
                        error = %e,
                        "Update submission failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.try_submit(update).await {
            Ok(status) => Ok(status),
            Err(e) => {
                tracing::error!(
                    entity = %update.entity,
                    metric = %update.metric,
                    error = %e,
                    "Update submission failed after all retries"
                );
                Err(e)
            }
        }
    }

    async fn try_submit(&self, update: &IncomingUpdate) -> Result<String, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/v1/entity", self.api_url))
            .json(update)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body: IngestResponse = response.json().await?;
        Ok(body.status)
    }

    /// Return the response unchanged on success, or a [`ClientError`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        if status.is_client_error() {
            Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(ClientError::Server {
                status: status.as_u16(),
                body,
            })
        }
    }
}
