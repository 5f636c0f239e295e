//! Activity view session routes
//!
//! A view is the server-side state of one open activities table. Every
//! mutating endpoint answers with the freshly rendered snapshot.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{bearer_token, BearerAuth};
use crate::activities::{ActivityView, ViewSnapshot};
use crate::api::pagination::validate_page_size;
use crate::api::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::domain::activities::optional_id;
use crate::domain::filters::{normalize_selector, FilterPatch};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestId;
use crate::services::FetchContext;

/// Request DTO for opening a view
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateViewRequest {
    /// Scope the view to one project (obra). Numeric ids are accepted.
    #[serde(default, deserialize_with = "optional_id")]
    pub obra_id: Option<String>,
    #[serde(default)]
    pub items_per_page: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SortRequest {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageRequest {
    pub page: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSizeRequest {
    pub items_per_page: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowToggleResponse {
    pub activity_id: i64,
    pub expanded: bool,
}

/// Run `f` against a view and render it afterwards.
fn update_view(
    state: &AppState,
    view_id: Uuid,
    f: impl FnOnce(&mut ActivityView),
) -> ApiResult<DataResponse<ViewSnapshot>> {
    state
        .views
        .with_view(view_id, |view| {
            f(view);
            view.render()
        })
        .map(DataResponse::new)
        .ok_or_else(|| ApiError::view_not_found(view_id))
}

/// Fetch the view's activities, applying the result only if no newer fetch
/// started meanwhile. No lock is held while the request is in flight.
async fn fetch_into_view(
    state: &AppState,
    view_id: Uuid,
    bearer_token: Option<&str>,
    request_id: Option<&str>,
) -> ApiResult<ViewSnapshot> {
    let (ticket, obra_id) = state
        .views
        .with_view(view_id, |view| {
            (view.begin_fetch(), view.obra_id().map(str::to_string))
        })
        .ok_or_else(|| ApiError::view_not_found(view_id))?;

    let result = state
        .activities
        .fetch_activities(FetchContext {
            obra_id: obra_id.as_deref(),
            bearer_token,
            request_id,
        })
        .await;

    match result {
        Ok(activities) => {
            let count = activities.len();
            let applied = state
                .views
                .with_view(view_id, |view| view.complete_fetch(ticket, activities))
                .ok_or_else(|| ApiError::view_not_found(view_id))?;
            if applied {
                tracing::info!(view_id = %view_id, count, "View refreshed");
            } else {
                tracing::debug!(view_id = %view_id, "Discarded stale activity fetch");
            }
        }
        Err(e) => {
            state
                .views
                .with_view(view_id, |view| view.fail_fetch(ticket));
            tracing::warn!(view_id = %view_id, error = %e, "View refresh failed");
            return Err(e);
        }
    }

    state
        .views
        .with_view(view_id, |view| view.render())
        .ok_or_else(|| ApiError::view_not_found(view_id))
}

/// POST /atividades/views
///
/// Open a view and load its activities.
pub async fn create_view(
    State(state): State<Arc<AppState>>,
    auth: BearerAuth,
    request_id: RequestId,
    body: Result<Json<CreateViewRequest>, JsonRejection>,
) -> ApiResult<Created<ViewSnapshot>> {
    // An empty request without a JSON content type opens a default view
    let req = match body {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateViewRequest::default(),
        Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
    };
    let page_size =
        validate_page_size(req.items_per_page.unwrap_or(state.settings.default_page_size))?;

    let obra_id = normalize_selector(req.obra_id);
    let view = ActivityView::new(obra_id, page_size, state.settings.number_locale);
    let view_id = state.views.insert(view);

    tracing::info!(view_id = %view_id, views = state.views.len(), "View created");

    match fetch_into_view(&state, view_id, bearer_token(&auth), request_id.as_deref()).await {
        Ok(snapshot) => Ok(Created(snapshot)),
        Err(e) => {
            state.views.remove(view_id);
            Err(e)
        }
    }
}

/// GET /atividades/views/:view_id
pub async fn get_view(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    update_view(&state, view_id, |_| ())
}

/// DELETE /atividades/views/:view_id
pub async fn delete_view(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
) -> ApiResult<NoContent> {
    if state.views.remove(view_id) {
        tracing::info!(view_id = %view_id, "View closed");
        Ok(NoContent)
    } else {
        Err(ApiError::view_not_found(view_id))
    }
}

/// POST /atividades/views/:view_id/refresh
pub async fn refresh_view(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
    auth: BearerAuth,
    request_id: RequestId,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    fetch_into_view(&state, view_id, bearer_token(&auth), request_id.as_deref())
        .await
        .map(DataResponse::new)
}

/// PATCH /atividades/views/:view_id/filters
///
/// Merge a partial filter change into the committed criteria.
pub async fn change_filters(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
    Json(patch): Json<FilterPatch>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    let update = patch.into_update()?;
    update_view(&state, view_id, |view| view.on_filtro_change(&update))
}

/// DELETE /atividades/views/:view_id/filters
pub async fn clear_filters(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    update_view(&state, view_id, ActivityView::on_limpar_filtros)
}

/// PATCH /atividades/views/:view_id/filters/draft
pub async fn edit_draft_filters(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
    Json(patch): Json<FilterPatch>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    let update = patch.into_update()?;
    update_view(&state, view_id, |view| view.edit_draft(&update))
}

/// DELETE /atividades/views/:view_id/filters/draft
pub async fn discard_draft_filters(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    update_view(&state, view_id, ActivityView::discard_draft)
}

/// POST /atividades/views/:view_id/filters/apply
pub async fn apply_draft_filters(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    update_view(&state, view_id, ActivityView::apply_draft)
}

/// POST /atividades/views/:view_id/sort
///
/// Header click: asc → desc → unsorted on the same key.
pub async fn toggle_sort(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
    Json(req): Json<SortRequest>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    let key = req.key.trim();
    if key.is_empty() {
        return Err(ApiError::BadRequest("Sort key must not be empty".to_string()));
    }
    update_view(&state, view_id, |view| view.toggle_sort(key))
}

/// PUT /atividades/views/:view_id/page
pub async fn change_page(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
    Json(req): Json<PageRequest>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    update_view(&state, view_id, |view| view.handle_page_change(req.page))
}

/// PUT /atividades/views/:view_id/page-size
pub async fn change_page_size(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
    Json(req): Json<PageSizeRequest>,
) -> ApiResult<DataResponse<ViewSnapshot>> {
    let page_size = validate_page_size(req.items_per_page)?;
    update_view(&state, view_id, |view| {
        view.handle_items_per_page_change(page_size)
    })
}

/// POST /atividades/views/:view_id/rows/:activity_id/toggle
///
/// Expand or collapse one row/card.
pub async fn toggle_row(
    State(state): State<Arc<AppState>>,
    Path((view_id, activity_id)): Path<(Uuid, i64)>,
) -> ApiResult<DataResponse<RowToggleResponse>> {
    let expanded = state
        .views
        .with_view(view_id, |view| view.toggle_expanded(activity_id))
        .ok_or_else(|| ApiError::view_not_found(view_id))?
        .ok_or_else(|| ApiError::NotFound(format!("Activity {} is not in this view", activity_id)))?;

    Ok(DataResponse::new(RowToggleResponse {
        activity_id,
        expanded,
    }))
}
