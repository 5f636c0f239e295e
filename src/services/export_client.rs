//! Export service client.
//!
//! PDF/Excel rendering happens in an external service; a failed export is
//! reported to the caller and never retried automatically.

use anyhow::{Context, Result};
use axum::async_trait;
use chrono::Utc;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, instrument};
use url::Url;

use crate::domain::exports::{ExportDocument, ExportFormat, ExportPayload};
use crate::error::ApiError;
use crate::middleware::X_REQUEST_ID;

/// Receiver of export jobs.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn export(
        &self,
        format: ExportFormat,
        payload: &ExportPayload,
        request_id: Option<&str>,
    ) -> Result<ExportDocument, ApiError>;

    async fn health_check(&self) -> Result<()>;
}

/// Error response from the export service.
#[derive(Debug, Deserialize)]
struct ExportErrorResponse {
    message: String,
}

pub fn default_content_type(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Pdf => "application/pdf",
        ExportFormat::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    }
}

/// `atividades-20240315.pdf`
pub fn export_file_name(format: ExportFormat) -> String {
    format!(
        "atividades-{}.{}",
        Utc::now().format("%Y%m%d"),
        format.file_extension()
    )
}

#[derive(Clone)]
pub struct ExportServiceClient {
    client: Client,
    base_url: Url,
}

impl ExportServiceClient {
    pub fn new(base_url: Url, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = %base_url, "Export service client initialized");

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ExportSink for ExportServiceClient {
    #[instrument(skip(self, payload), fields(format = format.as_str(), rows = payload.atividades.len()))]
    async fn export(
        &self,
        format: ExportFormat,
        payload: &ExportPayload,
        request_id: Option<&str>,
    ) -> Result<ExportDocument, ApiError> {
        let url = self
            .base_url
            .join(&format!("v1/exports/{}", format.as_str()))
            .context("Invalid export service URL")?;

        let mut req = self.client.post(url).json(payload);
        if let Some(rid) = request_id {
            req = req.header(X_REQUEST_ID, rid);
        }

        let response = req.send().await.map_err(|e| {
            error!(error = %e, "Export service request failed");
            ApiError::Upstream(format!("Export service unavailable: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ExportErrorResponse>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| format!("Export service error: {}", status));
            return Err(ApiError::Upstream(message));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(default_content_type(format))
            .to_string();

        let bytes = response.bytes().await.map_err(|e| {
            ApiError::Upstream(format!("Failed to read exported document: {}", e))
        })?;

        info!(size = bytes.len(), "Export generated");

        Ok(ExportDocument {
            content_type,
            file_name: export_file_name(format),
            bytes: bytes.to_vec(),
        })
    }

    async fn health_check(&self) -> Result<()> {
        let url = self.base_url.join("health").context("Invalid export service URL")?;

        self.client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Export service health check failed")?
            .error_for_status()
            .context("Export service unhealthy")?;

        Ok(())
    }
}
