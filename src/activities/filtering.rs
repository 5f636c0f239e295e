//! Filter state and predicate for the activities table.

use serde::Serialize;

use crate::domain::activities::{Activity, Reference};
use crate::domain::filters::{CriteriaUpdate, FilterCriteria};

/// Committed criteria plus the draft being edited in the filter dialog.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub committed: FilterCriteria,
    pub draft: FilterCriteria,
}

impl FilterState {
    /// Merge a change straight into the committed criteria.
    /// Returns whether the committed criteria changed.
    pub fn on_filtro_change(&mut self, update: &CriteriaUpdate) -> bool {
        let before = self.committed.clone();
        self.committed.apply(update);
        self.draft.apply(update);
        before != self.committed
    }

    /// Reset every selector, including the date range.
    pub fn on_limpar_filtros(&mut self) -> bool {
        let changed = !self.committed.is_empty() || !self.draft.is_empty();
        self.committed = FilterCriteria::default();
        self.draft = FilterCriteria::default();
        changed
    }

    pub fn edit_draft(&mut self, update: &CriteriaUpdate) {
        self.draft.apply(update);
    }

    /// Commit the draft. Returns whether the committed criteria changed.
    pub fn apply_draft(&mut self) -> bool {
        let changed = self.draft != self.committed;
        self.committed = self.draft.clone();
        changed
    }

    pub fn discard_draft(&mut self) {
        self.draft = self.committed.clone();
    }
}

/// A record passes iff every non-null criterion matches.
pub fn matches(criteria: &FilterCriteria, activity: &Activity) -> bool {
    reference_matches(criteria.tarefa_macro_id.as_deref(), activity.macro_task.as_ref())
        && reference_matches(criteria.processo_id.as_deref(), activity.process.as_ref())
        && reference_matches(criteria.obra_id.as_deref(), activity.project.as_ref())
        && criteria
            .colaborador_id
            .as_deref()
            .map_or(true, |id| activity.collaborators.iter().any(|c| c.id == id))
        && criteria
            .status
            .as_deref()
            .map_or(true, |status| activity.status == status)
        && date_matches(criteria, activity)
}

/// Records passing `criteria`, in input order.
pub fn apply_filters<'a>(
    activities: &'a [Activity],
    criteria: &FilterCriteria,
) -> Vec<&'a Activity> {
    activities
        .iter()
        .filter(|activity| matches(criteria, activity))
        .collect()
}

fn reference_matches(wanted: Option<&str>, reference: Option<&Reference>) -> bool {
    match wanted {
        None => true,
        Some(id) => reference.is_some_and(|r| r.id == id),
    }
}

fn date_matches(criteria: &FilterCriteria, activity: &Activity) -> bool {
    if criteria.data_inicio.is_none() && criteria.data_fim.is_none() {
        return true;
    }
    let Some(date) = activity.reference_date() else {
        return false;
    };
    criteria.data_inicio.map_or(true, |start| date >= start)
        && criteria.data_fim.map_or(true, |end| date <= end)
}
