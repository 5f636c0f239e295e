//! Generic table sorting by dotted field path.
//!
//! Records expose a [`SortValue`] per key through [`Sortable`]. Anything
//! that serializes to JSON can be sorted by walking its JSON form, which is
//! how nested keys (`macroTask.name`) and synthetic keys (`_kpi`) resolve.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::domain::activities::EnrichedActivity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Header activation cycle: ascending, descending, then unsorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPhase {
    Ascending,
    Descending,
    Off,
}

impl SortPhase {
    pub fn next(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Off,
            Self::Off => Self::Ascending,
        }
    }

    pub fn direction(self) -> Option<SortDirection> {
        match self {
            Self::Ascending => Some(SortDirection::Asc),
            Self::Descending => Some(SortDirection::Desc),
            Self::Off => None,
        }
    }
}

/// Current sort column and direction. `direction: None` means unsorted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortState {
    pub key: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction: Some(direction),
        }
    }

    pub fn phase(&self) -> SortPhase {
        match (self.key.as_ref(), self.direction) {
            (Some(_), Some(SortDirection::Asc)) => SortPhase::Ascending,
            (Some(_), Some(SortDirection::Desc)) => SortPhase::Descending,
            _ => SortPhase::Off,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() != SortPhase::Off
    }

    /// Header click: same key advances the cycle, another key starts ascending.
    pub fn toggle(&mut self, key: &str) {
        let next = if self.key.as_deref() == Some(key) {
            self.phase().next()
        } else {
            SortPhase::Ascending
        };

        match next.direction() {
            Some(direction) => {
                self.key = Some(key.to_string());
                self.direction = Some(direction);
            }
            None => *self = Self::default(),
        }
    }
}

/// Comparable projection of a field.
///
/// Ordering: `Missing < Bool < Number < Text`; text is compared lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SortValue {
    pub fn number(n: f64) -> Self {
        if n.is_finite() {
            Self::Number(n)
        } else {
            Self::Missing
        }
    }

    pub fn text(s: &str) -> Self {
        Self::Text(s.to_lowercase())
    }

    /// Scalars only; arrays and objects are not comparable and sort as missing.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map(Self::number).unwrap_or(Self::Missing),
            Value::String(s) => Self::text(s),
            Value::Null | Value::Array(_) | Value::Object(_) => Self::Missing,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

pub trait Sortable {
    fn sort_value(&self, key: &str) -> SortValue;
}

impl Sortable for Value {
    fn sort_value(&self, key: &str) -> SortValue {
        resolve_path(self, key)
            .map(SortValue::from_json)
            .unwrap_or(SortValue::Missing)
    }
}

impl Sortable for EnrichedActivity {
    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "_progresso" => SortValue::number(self.progresso),
            "_kpi" => SortValue::number(self.kpi),
            "id" => SortValue::Number(self.activity.id as f64),
            // Decimals serialize as strings
            "custoPlanejado" => decimal_value(self.activity.custo_planejado),
            "custoReal" => decimal_value(self.activity.custo_real),
            _ => serde_json::to_value(self)
                .map(|json| json.sort_value(key))
                .unwrap_or(SortValue::Missing),
        }
    }
}

fn decimal_value(value: Option<Decimal>) -> SortValue {
    value
        .and_then(|d| d.to_f64())
        .map(SortValue::number)
        .unwrap_or(SortValue::Missing)
}

/// Walk a dotted path (`"macroTask.name"`, `"collaborators.0.name"`).
/// `None` as soon as a segment is absent or null.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.')
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .filter(|v| !v.is_null())
}

/// Stable permutation of `records` for the given key and direction.
/// `direction: None` yields the identity permutation.
pub fn sorted_order<T: Sortable>(
    records: &[T],
    key: &str,
    direction: Option<SortDirection>,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    let Some(direction) = direction else {
        return order;
    };

    let keys: Vec<SortValue> = records.iter().map(|r| r.sort_value(key)).collect();
    order.sort_by(|&a, &b| {
        let ordering = keys[a].compare(&keys[b]);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    order
}

/// New vector sorted per `state`; the input is left untouched.
pub fn sort_records<T: Sortable + Clone>(records: &[T], state: &SortState) -> Vec<T> {
    match (state.key.as_deref(), state.direction) {
        (Some(key), Some(direction)) => sorted_order(records, key, Some(direction))
            .into_iter()
            .map(|i| records[i].clone())
            .collect(),
        _ => records.to_vec(),
    }
}
