//! Filter criteria types
//!
//! `null` on any selector means "no constraint on this dimension". The UI
//! sentinel `"all"` (and the empty string) never reach filter logic: they are
//! normalized to `None` when a patch is turned into a [`CriteriaUpdate`].

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Sentinel the filter dropdowns use for "no selection".
pub const ALL_SENTINEL: &str = "all";

/// Committed (or draft) filter selection for the activities table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub tarefa_macro_id: Option<String>,
    pub processo_id: Option<String>,
    pub colaborador_id: Option<String>,
    pub obra_id: Option<String>,
    pub status: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Number of dimensions currently constrained.
    pub fn active_count(&self) -> usize {
        [
            self.tarefa_macro_id.is_some(),
            self.processo_id.is_some(),
            self.colaborador_id.is_some(),
            self.obra_id.is_some(),
            self.status.is_some(),
            self.data_inicio.is_some(),
            self.data_fim.is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Replace only the fields named by the update.
    pub fn apply(&mut self, update: &CriteriaUpdate) {
        fn set<T: Clone>(slot: &mut Option<T>, value: &Option<Option<T>>) {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }

        set(&mut self.tarefa_macro_id, &update.tarefa_macro_id);
        set(&mut self.processo_id, &update.processo_id);
        set(&mut self.colaborador_id, &update.colaborador_id);
        set(&mut self.obra_id, &update.obra_id);
        set(&mut self.status, &update.status);
        set(&mut self.data_inicio, &update.data_inicio);
        set(&mut self.data_fim, &update.data_fim);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid date for {field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },
}

/// Partial filter change as received from the client.
///
/// Absent field: leave untouched. `null`, `""` or `"all"`: clear it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPatch {
    #[serde(default, deserialize_with = "present")]
    pub tarefa_macro_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub processo_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub colaborador_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub obra_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub data_inicio: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub data_fim: Option<Option<String>>,
}

/// Validated, normalized form of a [`FilterPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaUpdate {
    pub tarefa_macro_id: Option<Option<String>>,
    pub processo_id: Option<Option<String>>,
    pub colaborador_id: Option<Option<String>>,
    pub obra_id: Option<Option<String>>,
    pub status: Option<Option<String>>,
    pub data_inicio: Option<Option<NaiveDate>>,
    pub data_fim: Option<Option<NaiveDate>>,
}

impl FilterPatch {
    pub fn into_update(self) -> Result<CriteriaUpdate, FilterError> {
        Ok(CriteriaUpdate {
            tarefa_macro_id: self.tarefa_macro_id.map(normalize_selector),
            processo_id: self.processo_id.map(normalize_selector),
            colaborador_id: self.colaborador_id.map(normalize_selector),
            obra_id: self.obra_id.map(normalize_selector),
            status: self.status.map(normalize_selector),
            data_inicio: self
                .data_inicio
                .map(|v| parse_filter_date("dataInicio", v))
                .transpose()?,
            data_fim: self
                .data_fim
                .map(|v| parse_filter_date("dataFim", v))
                .transpose()?,
        })
    }
}

/// Map the "no selection" sentinels to `None`.
pub fn normalize_selector(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == ALL_SENTINEL {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_filter_date(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, FilterError> {
    match normalize_selector(value) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FilterError::InvalidDate { field, value: raw }),
    }
}

/// Distinguishes an explicit `null` (Some(None)) from an absent field (None).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> CriteriaUpdate {
        serde_json::from_value::<FilterPatch>(value)
            .unwrap()
            .into_update()
            .unwrap()
    }

    #[test]
    fn absent_null_and_sentinel_are_distinguished() {
        let update = patch(json!({ "status": "all", "obraId": null, "processoId": "P1" }));
        assert_eq!(update.status, Some(None));
        assert_eq!(update.obra_id, Some(None));
        assert_eq!(update.processo_id, Some(Some("P1".to_string())));
        assert_eq!(update.tarefa_macro_id, None);
    }

    #[test]
    fn apply_replaces_only_named_fields() {
        let mut criteria = FilterCriteria {
            status: Some("Concluídas".into()),
            obra_id: Some("OB-1".into()),
            ..Default::default()
        };
        criteria.apply(&patch(json!({ "status": "Em execução" })));

        assert_eq!(criteria.status.as_deref(), Some("Em execução"));
        assert_eq!(criteria.obra_id.as_deref(), Some("OB-1"));
        assert_eq!(criteria.active_count(), 2);
    }

    #[test]
    fn dates_are_validated() {
        let update = patch(json!({ "dataInicio": "2024-05-01", "dataFim": "" }));
        assert_eq!(update.data_inicio, Some(NaiveDate::from_ymd_opt(2024, 5, 1)));
        assert_eq!(update.data_fim, Some(None));

        let err = serde_json::from_value::<FilterPatch>(json!({ "dataFim": "31/12/2024" }))
            .unwrap()
            .into_update()
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidDate {
                field: "dataFim",
                value: "31/12/2024".into()
            }
        );
    }
}
