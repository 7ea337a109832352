// HTTP client for an ADK agent server

use crate::buffer_utils::{decode_stream, StreamingEventDecoder};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::streaming::{snapshot_stream, StreamEvent};
use crate::traits::{AgentClient, SnapshotSink};
use crate::types::{AdkEvent, Content, RunRequest, Session};
use async_trait::async_trait;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Response, StatusCode};
use std::pin::Pin;

/// Client bound to one app/user/session triple (HTTP direct, no SDK)
#[derive(Debug, Clone)]
pub struct AdkClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl AdkClient {
    /// Create a client from a validated config
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder().build()?;

        tracing::debug!(
            api_base_url = %config.api_base_url,
            app_name = %config.app_name,
            user_id = %config.user_id,
            session_id = %config.session_id,
            "Agent client configured"
        );

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn decoder(&self) -> StreamingEventDecoder {
        StreamingEventDecoder::with_agent_authors(self.config.agent_authors.iter().cloned())
    }

    fn run_request(&self, message: &str, streaming: bool) -> RunRequest {
        RunRequest {
            app_name: self.config.app_name.clone(),
            user_id: self.config.user_id.clone(),
            session_id: self.config.session_id.clone(),
            new_message: Content::user(message),
            streaming,
        }
    }

    async fn fetch_session(&self) -> Result<Response> {
        let response = self
            .http_client
            .get(self.config.session_url())
            .send()
            .await?;
        Ok(response)
    }

    /// POST `/run_sse` and return the response once its status is known good
    async fn open_run_sse(&self, message: &str) -> Result<Response> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let response = self
            .http_client
            .post(self.config.endpoint("run_sse"))
            .headers(headers)
            .json(&self.run_request(message, true))
            .send()
            .await
            .inspect_err(|e| tracing::error!("Error sending message: {}", e))?;

        ensure_success(response, "send message").await
    }
}

/// Consume a failed response into `ClientError::Status`
async fn status_error(response: Response, action: &str) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!("Failed to {}: status={}, body={}", action, status, body);
    ClientError::Status { status, body }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response, action).await)
    }
}

#[async_trait]
impl AgentClient for AdkClient {
    async fn create_or_get_session(&self) -> Result<Session> {
        let response = self.fetch_session().await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(status_error(response, "get session").await);
        }

        tracing::info!(session_id = %self.config.session_id, "Session not found, creating it");
        let created = self
            .http_client
            .post(self.config.session_url())
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if created.status().is_success() {
            return Ok(created.json().await?);
        }

        // Another request created it between our GET and POST
        if created.status() == StatusCode::CONFLICT {
            tracing::debug!("Session created concurrently, fetching it");
            let retry = ensure_success(self.fetch_session().await?, "get session after conflict").await?;
            return Ok(retry.json().await?);
        }

        Err(status_error(created, "create session").await)
    }

    async fn get_session(&self) -> Result<Session> {
        let response = self.fetch_session().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::SessionNotFound(self.config.session_id.clone()));
        }

        let response = ensure_success(response, "get session").await?;
        Ok(response.json().await?)
    }

    async fn send_message(&self, message: &str, on_snapshot: SnapshotSink<'_>) -> Result<String> {
        let response = self.open_run_sse(message).await?;

        decode_stream(
            response.bytes_stream(),
            self.decoder(),
            self.config.idle_timeout(),
            on_snapshot,
        )
        .await
        .inspect_err(|e| tracing::error!("Error sending message: {}", e))
    }

    async fn stream_message(
        &self,
        message: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>> {
        let response = self.open_run_sse(message).await?;

        Ok(snapshot_stream(
            response.bytes_stream(),
            self.decoder(),
            self.config.idle_timeout(),
        ))
    }

    async fn run(&self, message: &str) -> Result<Vec<AdkEvent>> {
        let response = self
            .http_client
            .post(self.config.endpoint("run"))
            .json(&self.run_request(message, false))
            .send()
            .await?;

        let response = ensure_success(response, "run agent").await?;
        Ok(response.json().await?)
    }

    async fn list_apps(&self) -> Result<Vec<String>> {
        let response = self
            .http_client
            .get(self.config.endpoint("list-apps"))
            .send()
            .await?;

        let response = ensure_success(response, "list apps").await?;
        Ok(response.json().await?)
    }
}
