//! In-memory upstreams and request helpers for router tests.

use anyhow::{bail, Result};
use axum::{
    async_trait,
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

use crate::activities::metrics::NumberLocale;
use crate::app::{create_app, AppState};
use crate::config::{Environment, Settings};
use crate::domain::activities::{Activity, Reference};
use crate::domain::exports::{ExportDocument, ExportFormat, ExportPayload};
use crate::error::ApiError;
use crate::logging::LogFormat;
use crate::services::export_client::{default_content_type, export_file_name};
use crate::services::{ActivitySource, ExportSink, FetchContext};

pub fn activity(id: i64, status: &str) -> Activity {
    Activity {
        id,
        description: format!("Atividade {id}"),
        status: status.to_string(),
        estimated_time: Some(8.0),
        total_time: Some(6.0),
        project: Some(Reference {
            id: "1".to_string(),
            name: "Obra Centro".to_string(),
        }),
        created_at: Some("2024-03-01T08:00:00Z".to_string()),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct FakeActivitySource {
    records: Mutex<Vec<Activity>>,
    fail_next: AtomicBool,
    down: AtomicBool,
}

impl FakeActivitySource {
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActivitySource for FakeActivitySource {
    async fn fetch_activities(&self, ctx: FetchContext<'_>) -> Result<Vec<Activity>, ApiError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Upstream("ActivityService unexpected status 503".to_string()));
        }
        let records = self.records.lock().clone();
        Ok(match ctx.obra_id {
            Some(obra) => records
                .into_iter()
                .filter(|a| a.project.as_ref().is_some_and(|p| p.id == obra))
                .collect(),
            None => records,
        })
    }

    async fn health_check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            bail!("ActivityService down");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeExportSink {
    last_payload: Mutex<Option<ExportPayload>>,
    fail_next: AtomicBool,
    down: AtomicBool,
}

impl FakeExportSink {
    pub fn last_payload(&self) -> Option<ExportPayload> {
        self.last_payload.lock().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExportSink for FakeExportSink {
    async fn export(
        &self,
        format: ExportFormat,
        payload: &ExportPayload,
        _request_id: Option<&str>,
    ) -> Result<ExportDocument, ApiError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Upstream("Export service unavailable".to_string()));
        }
        *self.last_payload.lock() = Some(payload.clone());
        Ok(ExportDocument {
            content_type: default_content_type(format).to_string(),
            file_name: export_file_name(format),
            bytes: b"report".to_vec(),
        })
    }

    async fn health_check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            bail!("Export service down");
        }
        Ok(())
    }
}

pub fn test_settings() -> Settings {
    Settings {
        env: Environment::Dev,
        server_addr: "127.0.0.1:0".to_string(),
        log_format: LogFormat::Compact,
        cors_allow_origins: vec!["http://localhost:5173".to_string()],
        activity_service_url: Url::parse("http://activities.test/").unwrap(),
        activity_service_timeout_seconds: 1,
        activity_service_max_retry_seconds: 0,
        export_service_url: Url::parse("http://exports.test/").unwrap(),
        export_service_timeout_seconds: 1,
        default_page_size: 25,
        number_locale: NumberLocale::En,
        max_view_sessions: 16,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub source: Arc<FakeActivitySource>,
    pub exports: Arc<FakeExportSink>,
}

pub fn test_app(records: Vec<Activity>) -> TestApp {
    let source = Arc::new(FakeActivitySource::default());
    *source.records.lock() = records;
    let exports = Arc::new(FakeExportSink::default());

    let state = AppState::new(test_settings(), source.clone(), exports.clone());
    TestApp {
        router: create_app(state.clone()),
        state,
        source,
        exports,
    }
}

pub async fn raw(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> Response {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    app.router.clone().oneshot(request).await.unwrap()
}

/// Send a request and decode the JSON body (`Null` when empty).
pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = raw(app, method, uri, body).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}
