//! Stateless activity listing
//!
//! One request runs the whole pipeline: fetch, filter, enrich, sort, page.

use axum::extract::{Query, State};
use serde::Deserialize;
use std::sync::Arc;

use super::{bearer_token, BearerAuth};
use crate::activities::presentation::{build_row, ActivityRow};
use crate::activities::prepare;
use crate::activities::sorting::{SortDirection, SortState};
use crate::api::pagination::{paginate, Paginated, PaginationMeta, PaginationParams};
use crate::app::AppState;
use crate::domain::filters::{FilterCriteria, FilterPatch};
use crate::error::ApiResult;
use crate::middleware::RequestId;
use crate::services::FetchContext;

/// Query string of `GET /atividades`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActivitiesQuery {
    pub obra_id: Option<String>,
    pub tarefa_macro_id: Option<String>,
    pub processo_id: Option<String>,
    pub colaborador_id: Option<String>,
    pub status: Option<String>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
    pub page: Option<usize>,
    #[serde(alias = "per_page")]
    pub per_page: Option<usize>,
}

impl ListActivitiesQuery {
    fn criteria(&self) -> ApiResult<FilterCriteria> {
        let patch = FilterPatch {
            tarefa_macro_id: Some(self.tarefa_macro_id.clone()),
            processo_id: Some(self.processo_id.clone()),
            colaborador_id: Some(self.colaborador_id.clone()),
            obra_id: Some(self.obra_id.clone()),
            status: Some(self.status.clone()),
            data_inicio: Some(self.data_inicio.clone()),
            data_fim: Some(self.data_fim.clone()),
        };
        let mut criteria = FilterCriteria::default();
        criteria.apply(&patch.into_update()?);
        Ok(criteria)
    }

    /// A key without direction sorts ascending; no key means input order.
    fn sort_state(&self) -> SortState {
        match self.sort.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                SortState::new(key, self.direction.unwrap_or(SortDirection::Asc))
            }
            _ => SortState::default(),
        }
    }
}

/// GET /atividades
///
/// List activities with computed progress/KPI, filtered, sorted and paged.
pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListActivitiesQuery>,
    auth: BearerAuth,
    request_id: RequestId,
) -> ApiResult<Paginated<ActivityRow>> {
    let criteria = query.criteria()?;
    let sort = query.sort_state();
    let paging = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    };
    let per_page = paging.per_page(state.settings.default_page_size)?;
    let page = paging.page();

    let activities = state
        .activities
        .fetch_activities(FetchContext {
            obra_id: criteria.obra_id.as_deref(),
            bearer_token: bearer_token(&auth),
            request_id: request_id.as_deref(),
        })
        .await?;

    let prepared = prepare(&activities, &criteria, &sort);
    let window = paginate(&prepared, page, per_page);
    let locale = state.settings.number_locale;

    tracing::info!(
        fetched = activities.len(),
        matched = prepared.len(),
        page,
        per_page,
        sort_key = ?sort.key,
        "Listing activities"
    );

    let data = window
        .page_items
        .iter()
        .enumerate()
        .map(|(offset, item)| build_row(item, window.start_index + offset, false, locale))
        .collect();

    Ok(Paginated {
        data,
        pagination: PaginationMeta::from(&window),
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::{activity, send, test_app};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn lists_second_page_with_global_codes() {
        let app = test_app((1..=30).map(|id| activity(id, "Em execução")).collect());
        let (status, body) = send(&app, Method::GET, "/atividades?page=2&perPage=25", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"][0]["codigo"], "026");
        assert_eq!(body["pagination"]["total_pages"], 2);
        assert_eq!(body["pagination"]["has_prev"], true);
    }

    #[tokio::test]
    async fn filters_combine_with_and() {
        let mut records = vec![
            activity(1, "Concluídas"),
            activity(2, "Concluídas"),
            activity(3, "Em execução"),
        ];
        records[1].project = None;
        let app = test_app(records);

        let (_, body) = send(
            &app,
            Method::GET,
            "/atividades?status=Conclu%C3%ADdas&obraId=1",
            None,
        )
        .await;
        let ids: Vec<i64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn sorts_descending_by_nested_key() {
        let mut records: Vec<_> = (1..=3).map(|id| activity(id, "Planejadas")).collect();
        for (record, name) in records.iter_mut().zip(["Beta", "Alfa", "Gama"]) {
            record.description = name.to_string();
        }
        let app = test_app(records);

        let (_, body) = send(
            &app,
            Method::GET,
            "/atividades?sort=description&direction=desc",
            None,
        )
        .await;
        assert_eq!(body["data"][0]["descricao"], "Gama");
        assert_eq!(body["data"][2]["descricao"], "Alfa");
    }

    #[tokio::test]
    async fn rejects_bad_dates_and_page_sizes() {
        let app = test_app(vec![activity(1, "Planejadas")]);

        let (status, body) = send(&app, Method::GET, "/atividades?dataInicio=2024-13-01", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("dataInicio"));

        let (status, _) = send(&app, Method::GET, "/atividades?perPage=7", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_bad_gateway() {
        let app = test_app(vec![]);
        app.source.fail_next();
        let (status, body) = send(&app, Method::GET, "/atividades", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "UPSTREAM_ERROR");
    }
}
