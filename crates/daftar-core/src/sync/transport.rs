//! Sync transport: how batches reach the remote ledger store.
//!
//! The engine only ever talks to the [`SyncTransport`] trait; the HTTP
//! implementation below is the production transport, tests substitute an
//! in-memory server.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::util::{compact_text, is_http_url, normalize_text_option};

use super::protocol::{PullResponse, PushRequest, PushResponse};

/// Transport-level sync failures; all of them leave local state untouched
/// and are surfaced to callers as a failed sync attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid sync endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Sync HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync API error: {0}")]
    Api(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Trait for delivering sync requests to the remote ledger store
#[allow(async_fn_in_trait)]
pub trait SyncTransport {
    /// Submit a change batch; the response pairs one outcome per change
    async fn push_changes(
        &self,
        credential: &str,
        request: &PushRequest,
    ) -> TransportResult<PushResponse>;

    /// Fetch all records changed after `since` (absent means everything)
    async fn pull_changes(
        &self,
        credential: &str,
        since: Option<DateTime<Utc>>,
    ) -> TransportResult<PullResponse>;
}

/// HTTP implementation of `SyncTransport`
#[derive(Clone)]
pub struct HttpSyncTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSyncTransport {
    pub fn new(endpoint: impl Into<String>) -> TransportResult<Self> {
        let endpoint = normalize_endpoint(endpoint.into())?;
        Ok(Self {
            endpoint,
            client: reqwest::Client::builder().build()?,
        })
    }
}

impl SyncTransport for HttpSyncTransport {
    async fn push_changes(
        &self,
        credential: &str,
        request: &PushRequest,
    ) -> TransportResult<PushResponse> {
        let response = self
            .client
            .post(format!("{}/sync/push", self.endpoint))
            .bearer_auth(credential)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api(parse_api_error(status, &body)));
        }

        Ok(response.json::<PushResponse>().await?)
    }

    async fn pull_changes(
        &self,
        credential: &str,
        since: Option<DateTime<Utc>>,
    ) -> TransportResult<PullResponse> {
        let mut builder = self
            .client
            .get(format!("{}/sync/pull", self.endpoint))
            .bearer_auth(credential)
            .header("Accept", "application/json");

        if let Some(since) = since {
            builder = builder.query(&[("since", since.to_rfc3339_opts(SecondsFormat::Millis, true))]);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api(parse_api_error(status, &body)));
        }

        Ok(response.json::<PullResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> TransportResult<String> {
    let endpoint = normalize_text_option(Some(raw)).ok_or_else(|| {
        TransportError::InvalidEndpoint("endpoint must not be empty".to_string())
    })?;
    if is_http_url(&endpoint) {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(TransportError::InvalidEndpoint(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}
