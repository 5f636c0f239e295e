//! Activity domain types
//!
//! Activities (atividades) as delivered by the external ActivityService.
//! Reference fields arrive either as plain identifiers or as embedded
//! objects and are normalized once, here, into [`Reference`].

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Activity status as shown to the user.
///
/// The upstream value is kept verbatim on [`Activity::status`]; this enum is
/// only the display interpretation of it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ActivityStatus {
    #[default]
    #[serde(rename = "Planejadas")]
    Planejadas,
    #[serde(rename = "Em execução")]
    EmExecucao,
    #[serde(rename = "Concluídas")]
    Concluidas,
    #[serde(rename = "Paralizadas")]
    Paralizadas,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 4] = [
        Self::Planejadas,
        Self::EmExecucao,
        Self::Concluidas,
        Self::Paralizadas,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Planejadas => "Planejadas",
            Self::EmExecucao => "Em execução",
            Self::Concluidas => "Concluídas",
            Self::Paralizadas => "Paralizadas",
        }
    }

    /// Interpret an upstream status string. Unknown values display as planned.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == label)
            .unwrap_or(Self::Planejadas)
    }
}

/// Identifier as sent by the upstream service (numeric or textual).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Optional identifier given as a number or a string.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReference {
    Id(RawId),
    Object {
        #[serde(default, alias = "_id")]
        id: Option<RawId>,
        #[serde(default, alias = "nome")]
        name: Option<String>,
        #[serde(default, alias = "descricao")]
        description: Option<String>,
    },
}

/// Normalized reference to another record (macro task, process, project,
/// service order, collaborator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "RawReference")]
pub struct Reference {
    /// Identifier used for filtering. Empty when the upstream object had none.
    pub id: String,
    /// Display name. Falls back to the identifier.
    pub name: String,
}

impl Reference {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<RawReference> for Reference {
    fn from(raw: RawReference) -> Self {
        match raw {
            RawReference::Id(id) => {
                let id = String::from(id);
                Self {
                    name: id.clone(),
                    id,
                }
            }
            RawReference::Object {
                id,
                name,
                description,
            } => {
                let id = id.map(String::from).unwrap_or_default();
                let name = name
                    .or(description)
                    .unwrap_or_else(|| id.clone());
                Self { id, name }
            }
        }
    }
}

/// Display name of an optional reference, `"-"` when absent.
pub fn display_name(reference: Option<&Reference>) -> &str {
    match reference {
        Some(r) if !r.name.is_empty() => &r.name,
        _ => "-",
    }
}

/// Activity entity (read-only from this service's perspective)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Raw upstream status, compared verbatim by filters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Planned effort in hours.
    #[serde(default)]
    pub estimated_time: Option<f64>,
    /// Effort actually spent, in hours.
    #[serde(default, alias = "actualTime")]
    pub total_time: Option<f64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub completed_quantity: Option<i64>,
    #[serde(default)]
    pub macro_task: Option<Reference>,
    #[serde(default)]
    pub process: Option<Reference>,
    #[serde(default)]
    pub project: Option<Reference>,
    #[serde(default)]
    pub service_order: Option<Reference>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collaborators: Vec<Reference>,
    #[serde(default)]
    pub custo_planejado: Option<Decimal>,
    #[serde(default)]
    pub custo_real: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
}

impl Activity {
    pub fn status_kind(&self) -> ActivityStatus {
        ActivityStatus::from_label(&self.status)
    }

    /// Date used by date-range filters: start date, else creation date.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.start_date
            .as_deref()
            .and_then(parse_date)
            .or_else(|| self.created_at.as_deref().and_then(parse_date))
    }

    pub fn collaborator_names(&self) -> Vec<String> {
        self.collaborators.iter().map(|c| c.name.clone()).collect()
    }
}

/// Activity with the computed display metrics attached.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedActivity {
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(rename = "_progresso")]
    pub progresso: f64,
    #[serde(rename = "_kpi")]
    pub kpi: f64,
}

/// Parse an upstream date: RFC 3339 timestamp or plain `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn references_accept_both_shapes() {
        let activity: Activity = serde_json::from_value(json!({
            "id": 7,
            "macroTask": "MT-1",
            "process": { "_id": 12, "nome": "Soldagem" },
            "project": { "id": "OB-3", "name": "Obra Norte" },
            "collaborators": [{ "id": 1, "name": "Ana" }, "joao"]
        }))
        .unwrap();

        assert_eq!(activity.macro_task, Some(Reference::new("MT-1", "MT-1")));
        assert_eq!(activity.process, Some(Reference::new("12", "Soldagem")));
        assert_eq!(activity.project, Some(Reference::new("OB-3", "Obra Norte")));
        assert_eq!(activity.collaborator_names(), vec!["Ana", "joao"]);
    }

    #[test]
    fn nulls_and_missing_fields_degrade_to_defaults() {
        let activity: Activity = serde_json::from_value(json!({
            "id": 1,
            "description": null,
            "collaborators": null,
            "macroTask": null
        }))
        .unwrap();

        assert_eq!(activity.description, "");
        assert!(activity.collaborators.is_empty());
        assert!(activity.macro_task.is_none());
        assert_eq!(display_name(activity.macro_task.as_ref()), "-");
    }

    #[test]
    fn actual_time_is_accepted_as_total_time() {
        let activity: Activity =
            serde_json::from_value(json!({ "id": 1, "actualTime": 20, "estimatedTime": 10 }))
                .unwrap();
        assert_eq!(activity.total_time, Some(20.0));
        assert_eq!(activity.estimated_time, Some(10.0));
    }

    #[test]
    fn planned_is_the_default_status() {
        assert_eq!(ActivityStatus::default(), ActivityStatus::Planejadas);
    }

    #[test]
    fn unknown_status_displays_as_planned() {
        assert_eq!(ActivityStatus::from_label("Cancelada"), ActivityStatus::Planejadas);
        assert_eq!(ActivityStatus::from_label("Em execução"), ActivityStatus::EmExecucao);
    }

    #[test]
    fn reference_date_prefers_start_date() {
        let activity = Activity {
            start_date: Some("2024-03-10T08:00:00Z".into()),
            created_at: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert_eq!(
            activity.reference_date(),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );

        let fallback = Activity {
            start_date: Some("not a date".into()),
            created_at: Some("2024-01-01T00:00:00.000Z".into()),
            ..Default::default()
        };
        assert_eq!(fallback.reference_date(), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn enriched_activity_serializes_computed_fields() {
        let enriched = EnrichedActivity {
            activity: Activity {
                id: 3,
                ..Default::default()
            },
            progresso: 40.0,
            kpi: 50.0,
        };
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["_progresso"], 40.0);
        assert_eq!(value["_kpi"], 50.0);
    }
}
