use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
    pub open_views: usize,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub activity_service: String,
    pub export_service: String,
}

fn probe_status<T, E>(result: &Result<T, E>) -> String {
    if result.is_ok() { "ok" } else { "error" }.to_string()
}

/// Health check endpoint - public
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (activity_result, export_result) = tokio::join!(
        state.activities.health_check(),
        state.exports.health_check(),
    );

    // Listing needs the ActivityService; exports are optional
    let status = match (activity_result.is_ok(), export_result.is_ok()) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        (false, _) => "unhealthy",
    };

    let status_code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                activity_service: probe_status(&activity_result),
                export_service: probe_status(&export_result),
            },
            open_views: state.views.len(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, test_app};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn reports_healthy_with_working_upstreams() {
        let app = test_app(vec![]);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["activity_service"], "ok");
    }

    #[tokio::test]
    async fn export_outage_only_degrades() {
        let app = test_app(vec![]);
        app.exports.set_down(true);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");

        app.source.set_down(true);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
    }
}
