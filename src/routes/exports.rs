//! Export routes

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::domain::exports::{ExportDocument, ExportRequest};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestId;

/// POST /atividades/views/:view_id/export
///
/// Send the whole filtered, sorted collection (not just the visible page) to
/// the export service. One export per view at a time.
pub async fn export_view(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
    request_id: RequestId,
    Json(req): Json<ExportRequest>,
) -> ApiResult<ExportDocument> {
    let columns = req.column_selection();

    let (guard, payload) = state
        .views
        .with_view(view_id, |view| {
            view.try_begin_export()
                .map(|guard| (guard, view.export_payload(columns)))
        })
        .ok_or_else(|| ApiError::view_not_found(view_id))?
        .ok_or_else(|| {
            ApiError::Conflict("An export is already running for this view".to_string())
        })?;

    tracing::info!(
        view_id = %view_id,
        format = req.format.as_str(),
        rows = payload.atividades.len(),
        "Starting export"
    );

    let document = state
        .exports
        .export(req.format, &payload, request_id.as_deref())
        .await;
    drop(guard);

    document
}
