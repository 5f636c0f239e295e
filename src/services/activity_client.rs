//! ActivityService client.
//!
//! The ActivityService owns the activity records; this service only reads
//! them. Reads are idempotent, so transient failures (connection errors,
//! timeouts, 5xx) are retried with exponential backoff.

use anyhow::{Context, Result};
use axum::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::domain::activities::Activity;
use crate::error::ApiError;
use crate::middleware::X_REQUEST_ID;

/// Caller context forwarded upstream with every fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchContext<'a> {
    /// Restrict the fetch to one project (obra).
    pub obra_id: Option<&'a str>,
    /// Caller's bearer token, forwarded as-is.
    pub bearer_token: Option<&'a str>,
    pub request_id: Option<&'a str>,
}

/// Source of raw activity records.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn fetch_activities(&self, ctx: FetchContext<'_>) -> Result<Vec<Activity>, ApiError>;

    async fn health_check(&self) -> Result<()>;
}

/// The upstream answers with either a bare array or a `{ data: [...] }` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ActivityListBody {
    Bare(Vec<Activity>),
    Envelope { data: Vec<Activity> },
}

impl From<ActivityListBody> for Vec<Activity> {
    fn from(body: ActivityListBody) -> Self {
        match body {
            ActivityListBody::Bare(list) | ActivityListBody::Envelope { data: list } => list,
        }
    }
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status(StatusCode::NOT_FOUND) => {
                ApiError::NotFound("Activities not found upstream".to_string())
            }
            other => ApiError::Upstream(format!("ActivityService {}", other)),
        }
    }
}

/// HTTP client for the ActivityService.
#[derive(Clone)]
pub struct ActivityServiceClient {
    client: Client,
    base_url: Url,
    max_retry: Duration,
}

impl ActivityServiceClient {
    pub fn new(base_url: Url, timeout_seconds: u64, max_retry_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = %base_url, "ActivityService client initialized");

        Ok(Self {
            client,
            base_url,
            max_retry: Duration::from_secs(max_retry_seconds),
        })
    }
}

#[async_trait]
impl ActivitySource for ActivityServiceClient {
    #[instrument(skip(self, ctx), fields(obra_id = ctx.obra_id))]
    async fn fetch_activities(&self, ctx: FetchContext<'_>) -> Result<Vec<Activity>, ApiError> {
        let url = self
            .base_url
            .join("atividades")
            .context("Invalid ActivityService URL")?;

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_max_elapsed_time(Some(self.max_retry))
            .build();

        let client = &self.client;
        let url = &url;
        let body: ActivityListBody = backoff::future::retry(policy, move || async move {
            let mut req = client.get(url.clone());
            if let Some(obra_id) = ctx.obra_id {
                req = req.query(&[("obraId", obra_id)]);
            }
            if let Some(token) = ctx.bearer_token {
                req = req.bearer_auth(token);
            }
            if let Some(rid) = ctx.request_id {
                req = req.header(X_REQUEST_ID, rid);
            }

            debug!(url = %url, "ActivityService request");

            let response = req.send().await.map_err(|e| {
                warn!(error = %e, "ActivityService request failed, retrying");
                backoff::Error::transient(FetchError::Transport(e))
            })?;

            let status = response.status();
            if status.is_server_error() {
                warn!(status = %status, "ActivityService unavailable, retrying");
                return Err(backoff::Error::transient(FetchError::Status(status)));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(FetchError::Status(status)));
            }

            response
                .json::<ActivityListBody>()
                .await
                .map_err(|e| backoff::Error::permanent(FetchError::Decode(e)))
        })
        .await?;

        let activities: Vec<Activity> = body.into();
        debug!(count = activities.len(), "Activities fetched");
        Ok(activities)
    }

    async fn health_check(&self) -> Result<()> {
        let url = self.base_url.join("health").context("Invalid ActivityService URL")?;

        self.client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("ActivityService health check failed")?
            .error_for_status()
            .context("ActivityService unhealthy")?;

        Ok(())
    }
}
