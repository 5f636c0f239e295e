//! Activities table orchestration.
//!
//! [`ActivityView`] is the in-memory state of one open activities table:
//! the last-known-good collection, filters, sort, page, expanded rows and
//! the fetch/export bookkeeping. Rendering runs the pipeline
//! filter → enrich → sort → paginate → rows/cards.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::filtering::{apply_filters, FilterState};
use super::metrics::{enrich, NumberLocale};
use super::presentation::{build_card, build_row, ActivityCard, ActivityRow};
use super::sorting::{sort_records, SortState};
use crate::api::pagination::{paginate, PaginationMeta};
use crate::domain::activities::{Activity, EnrichedActivity};
use crate::domain::exports::{ExportColumn, ExportPayload};
use crate::domain::filters::{CriteriaUpdate, FilterCriteria};

/// Filter, enrich and sort. The result is the collection that gets paged
/// on screen and handed, whole, to exports.
pub fn prepare(
    activities: &[Activity],
    criteria: &FilterCriteria,
    sort: &SortState,
) -> Vec<EnrichedActivity> {
    let enriched: Vec<EnrichedActivity> = apply_filters(activities, criteria)
        .into_iter()
        .map(enrich)
        .collect();

    if sort.is_active() {
        sort_records(&enriched, sort)
    } else {
        enriched
    }
}

/// Identifies one upstream fetch; only the latest one may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Held for the duration of an export; dropping it re-enables exporting.
#[derive(Debug)]
pub struct ExportGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Rendered state of a view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub view_id: Uuid,
    pub obra_id: Option<String>,
    pub rows: Vec<ActivityRow>,
    pub cards: Vec<ActivityCard>,
    pub pagination: PaginationMeta,
    pub filtros: FilterState,
    pub active_filters: usize,
    pub sort: SortState,
    pub loading: bool,
    pub exporting: bool,
    pub total_unfiltered: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ActivityView {
    id: Uuid,
    obra_id: Option<String>,
    activities: Vec<Activity>,
    filters: FilterState,
    sort: SortState,
    page: usize,
    page_size: usize,
    expanded: HashSet<i64>,
    locale: NumberLocale,
    loading: bool,
    generation: u64,
    last_refreshed_at: Option<DateTime<Utc>>,
    exporting: Arc<AtomicBool>,
}

impl ActivityView {
    pub fn new(obra_id: Option<String>, page_size: usize, locale: NumberLocale) -> Self {
        Self {
            id: Uuid::new_v4(),
            obra_id,
            activities: Vec::new(),
            filters: FilterState::default(),
            sort: SortState::default(),
            page: 1,
            page_size: page_size.max(1),
            expanded: HashSet::new(),
            locale,
            loading: false,
            generation: 0,
            last_refreshed_at: None,
            exporting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn obra_id(&self) -> Option<&str> {
        self.obra_id.as_deref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // The dataset on screen changed: a stale page must never outlive it.
    fn dataset_changed(&mut self) {
        self.page = 1;
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket(self.generation)
    }

    /// Apply a fetch result. Returns `false` (and changes nothing) when a
    /// newer fetch was started in the meantime.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, activities: Vec<Activity>) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.loading = false;
        self.expanded
            .retain(|id| activities.iter().any(|a| a.id == *id));
        self.activities = activities;
        self.last_refreshed_at = Some(Utc::now());
        self.dataset_changed();
        true
    }

    /// Record a failed fetch; the last-known-good collection stays.
    pub fn fail_fetch(&mut self, ticket: FetchTicket) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.loading = false;
        true
    }

    pub fn on_filtro_change(&mut self, update: &CriteriaUpdate) {
        self.filters.on_filtro_change(update);
        self.dataset_changed();
    }

    pub fn on_limpar_filtros(&mut self) {
        self.filters.on_limpar_filtros();
        self.dataset_changed();
    }

    pub fn edit_draft(&mut self, update: &CriteriaUpdate) {
        self.filters.edit_draft(update);
    }

    pub fn apply_draft(&mut self) {
        self.filters.apply_draft();
        self.dataset_changed();
    }

    /// Close the filter dialog without applying it.
    pub fn discard_draft(&mut self) {
        self.filters.discard_draft();
    }

    pub fn toggle_sort(&mut self, key: &str) {
        self.sort.toggle(key);
        self.dataset_changed();
    }

    /// Jump to `page`, clamped to the pages that currently exist.
    pub fn handle_page_change(&mut self, page: usize) {
        let total_pages = self
            .prepared()
            .len()
            .div_ceil(self.page_size)
            .max(1);
        self.page = page.clamp(1, total_pages);
    }

    pub fn handle_items_per_page_change(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.dataset_changed();
    }

    /// Flip a row's expanded state. `None` when the activity is not loaded.
    pub fn toggle_expanded(&mut self, activity_id: i64) -> Option<bool> {
        if !self.activities.iter().any(|a| a.id == activity_id) {
            return None;
        }
        if self.expanded.remove(&activity_id) {
            Some(false)
        } else {
            self.expanded.insert(activity_id);
            Some(true)
        }
    }

    fn prepared(&self) -> Vec<EnrichedActivity> {
        prepare(&self.activities, &self.filters.committed, &self.sort)
    }

    pub fn render(&self) -> ViewSnapshot {
        let prepared = self.prepared();
        let page = paginate(&prepared, self.page, self.page_size);

        let rows = page
            .page_items
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                let expanded = self.expanded.contains(&item.activity.id);
                build_row(item, page.start_index + offset, expanded, self.locale)
            })
            .collect();
        let cards = page
            .page_items
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                let expanded = self.expanded.contains(&item.activity.id);
                build_card(item, page.start_index + offset, expanded, self.locale)
            })
            .collect();

        ViewSnapshot {
            view_id: self.id,
            obra_id: self.obra_id.clone(),
            rows,
            cards,
            pagination: PaginationMeta::from(&page),
            filtros: self.filters.clone(),
            active_filters: self.filters.committed.active_count(),
            sort: self.sort.clone(),
            loading: self.loading,
            exporting: self.exporting.load(Ordering::Acquire),
            total_unfiltered: self.activities.len(),
            last_refreshed_at: self.last_refreshed_at,
        }
    }

    /// Mark the view as exporting. `None` while another export is running.
    pub fn try_begin_export(&self) -> Option<ExportGuard> {
        self.exporting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExportGuard {
                flag: Arc::clone(&self.exporting),
            })
    }

    /// Filtered, sorted, unpaginated collection plus the committed filters.
    pub fn export_payload(&self, columns: Vec<ExportColumn>) -> ExportPayload {
        ExportPayload {
            atividades: self.prepared(),
            filtros: self.filters.committed.clone(),
            colunas: columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::sorting::SortDirection;

    fn activities(n: i64) -> Vec<Activity> {
        (1..=n)
            .map(|id| Activity {
                id,
                description: format!("Atividade {id:02}"),
                status: (if id % 2 == 0 { "Concluídas" } else { "Em execução" }).into(),
                quantity: Some(10),
                completed_quantity: Some(id % 11),
                ..Default::default()
            })
            .collect()
    }

    fn loaded_view(n: i64) -> ActivityView {
        let mut view = ActivityView::new(None, 25, NumberLocale::En);
        let ticket = view.begin_fetch();
        assert!(view.complete_fetch(ticket, activities(n)));
        view
    }

    fn ids(snapshot: &ViewSnapshot) -> Vec<i64> {
        snapshot.rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn thirty_activities_over_two_pages() {
        let mut view = loaded_view(30);
        let first = view.render();
        assert_eq!(first.pagination.total_pages, 2);
        assert_eq!(ids(&first), (1..=25).collect::<Vec<_>>());
        assert_eq!(first.rows[0].codigo, "001");

        view.handle_page_change(2);
        let second = view.render();
        assert_eq!(ids(&second), (26..=30).collect::<Vec<_>>());
        assert_eq!(second.rows[0].codigo, "026");
        assert_eq!(second.cards.len(), 5);
    }

    #[test]
    fn dataset_changes_reset_the_page() {
        let mut view = loaded_view(30);

        view.handle_page_change(2);
        view.toggle_sort("_progresso");
        assert_eq!(view.page(), 1);

        view.handle_page_change(2);
        view.on_filtro_change(&CriteriaUpdate {
            status: Some(Some("Concluídas".into())),
            ..Default::default()
        });
        assert_eq!(view.page(), 1);

        view.handle_page_change(2);
        view.handle_items_per_page_change(10);
        assert_eq!(view.page(), 1);

        view.handle_page_change(2);
        let ticket = view.begin_fetch();
        view.complete_fetch(ticket, activities(5));
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn page_change_is_clamped_to_existing_pages() {
        let mut view = loaded_view(30);
        view.handle_page_change(99);
        assert_eq!(view.page(), 2);
        view.handle_page_change(0);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn three_header_clicks_restore_unsorted_order() {
        let mut view = loaded_view(12);
        view.on_filtro_change(&CriteriaUpdate {
            status: Some(Some("Em execução".into())),
            ..Default::default()
        });
        let unsorted = ids(&view.render());

        view.toggle_sort("_progresso");
        assert_eq!(view.sort(), &SortState::new("_progresso", SortDirection::Asc));
        view.toggle_sort("_progresso");
        let descending = ids(&view.render());
        assert_eq!(descending, vec![9, 7, 5, 3, 1, 11]);
        view.toggle_sort("_progresso");

        assert_eq!(ids(&view.render()), unsorted);
    }

    #[test]
    fn stale_fetch_results_are_discarded() {
        let mut view = ActivityView::new(None, 10, NumberLocale::En);
        let first = view.begin_fetch();
        let second = view.begin_fetch();

        assert!(view.complete_fetch(second, activities(3)));
        assert!(!view.complete_fetch(first, activities(20)));
        assert!(!view.fail_fetch(first));
        assert_eq!(view.render().total_unfiltered, 3);
        assert!(!view.is_loading());
    }

    #[test]
    fn failed_fetch_keeps_last_known_good_data() {
        let mut view = loaded_view(4);
        let ticket = view.begin_fetch();
        assert!(view.render().loading);
        assert_eq!(view.render().total_unfiltered, 4);

        assert!(view.fail_fetch(ticket));
        let snapshot = view.render();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.total_unfiltered, 4);
    }

    #[test]
    fn expanded_rows_survive_only_while_loaded() {
        let mut view = loaded_view(5);
        assert_eq!(view.toggle_expanded(3), Some(true));
        assert_eq!(view.toggle_expanded(99), None);
        assert!(view.render().rows[2].expanded);
        assert!(view.render().cards[2].detalhes.is_some());

        let ticket = view.begin_fetch();
        view.complete_fetch(ticket, activities(2));
        let ticket = view.begin_fetch();
        view.complete_fetch(ticket, activities(5));
        assert!(!view.render().rows[2].expanded);
    }

    #[test]
    fn export_is_exclusive_and_unpaginated() {
        let mut view = loaded_view(30);
        view.on_filtro_change(&CriteriaUpdate {
            status: Some(Some("Concluídas".into())),
            ..Default::default()
        });

        let guard = view.try_begin_export().expect("first export starts");
        assert!(view.try_begin_export().is_none());
        assert!(view.render().exporting);

        let payload = view.export_payload(vec![ExportColumn::Codigo]);
        assert_eq!(payload.atividades.len(), 15);
        assert_eq!(payload.filtros.status.as_deref(), Some("Concluídas"));

        drop(guard);
        assert!(view.try_begin_export().is_some());
    }

    #[test]
    fn draft_filters_apply_only_on_commit() {
        let mut view = loaded_view(10);
        view.edit_draft(&CriteriaUpdate {
            status: Some(Some("Concluídas".into())),
            ..Default::default()
        });
        assert_eq!(view.render().pagination.total_items, 10);
        view.apply_draft();
        assert_eq!(view.render().pagination.total_items, 5);
        view.on_limpar_filtros();
        assert_eq!(view.render().pagination.total_items, 10);
        assert!(view.filters().committed.is_empty());
    }
}
