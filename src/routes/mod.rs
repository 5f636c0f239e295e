pub mod activities;
pub mod exports;
pub mod health;
pub mod views;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::app::AppState;

/// Optional caller credentials, forwarded verbatim to the ActivityService.
pub type BearerAuth = Option<TypedHeader<Authorization<Bearer>>>;

pub(crate) fn bearer_token(auth: &BearerAuth) -> Option<&str> {
    auth.as_ref().map(|TypedHeader(header)| header.token())
}

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Stateless listing
        .route("/atividades", get(activities::list_activities))
        // View sessions
        .route("/atividades/views", post(views::create_view))
        .route(
            "/atividades/views/:view_id",
            get(views::get_view).delete(views::delete_view),
        )
        .route(
            "/atividades/views/:view_id/refresh",
            post(views::refresh_view),
        )
        .route(
            "/atividades/views/:view_id/filters",
            patch(views::change_filters).delete(views::clear_filters),
        )
        .route(
            "/atividades/views/:view_id/filters/draft",
            patch(views::edit_draft_filters).delete(views::discard_draft_filters),
        )
        .route(
            "/atividades/views/:view_id/filters/apply",
            post(views::apply_draft_filters),
        )
        .route("/atividades/views/:view_id/sort", post(views::toggle_sort))
        .route("/atividades/views/:view_id/page", put(views::change_page))
        .route(
            "/atividades/views/:view_id/page-size",
            put(views::change_page_size),
        )
        .route(
            "/atividades/views/:view_id/rows/:activity_id/toggle",
            post(views::toggle_row),
        )
        // Exports
        .route(
            "/atividades/views/:view_id/export",
            post(exports::export_view),
        )
}
