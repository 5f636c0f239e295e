use axum::{http::HeaderValue, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::activities::ViewRegistry;
use crate::config::Settings;
use crate::middleware::request_id_layer;
use crate::routes;
use crate::services::{ActivitySource, ExportSink};

/// Request bodies are small JSON documents (filters, sort keys, export options).
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    /// Source of raw activity records
    pub activities: Arc<dyn ActivitySource>,
    /// PDF/Excel renderer
    pub exports: Arc<dyn ExportSink>,
    /// Open activity table views
    pub views: ViewRegistry,
}

impl AppState {
    pub fn new(
        settings: Settings,
        activities: Arc<dyn ActivitySource>,
        exports: Arc<dyn ExportSink>,
    ) -> Arc<Self> {
        let views = ViewRegistry::new(settings.max_view_sessions);
        Arc::new(Self {
            settings,
            activities,
            exports,
            views,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // DEBUG spans keep INFO output quiet
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layer();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]))
        .expose_headers([
            axum::http::header::CONTENT_DISPOSITION,
            axum::http::HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
        .max_age(max_age)
}
