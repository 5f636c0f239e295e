//! Activity progress and KPI calculations.
//!
//! Every function here is total: absent fields degrade to documented
//! defaults, zero denominators yield the fallback values below and
//! non-finite numbers never reach the caller.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::activities::{Activity, ActivityStatus, EnrichedActivity};

/// KPI when no time was logged but effort was planned (no overrun yet).
pub const KPI_SEM_APONTAMENTO_PLANEJADO: f64 = 100.0;

/// KPI when neither planned nor actual effort exists.
pub const KPI_SEM_PLANEJAMENTO: f64 = 0.0;

/// KPI values below this are under target.
pub const KPI_LIMITE_INFERIOR: f64 = 80.0;

/// KPI values at or above this meet or beat the plan.
pub const KPI_LIMITE_SUPERIOR: f64 = 100.0;

/// Placeholder shown when a value is unavailable.
pub const PLACEHOLDER: &str = "-";

/// Width of the sequential display code.
const CODIGO_WIDTH: usize = 3;

/// Semantic color tokens understood by the front-end theme
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColorToken {
    Info,
    Warning,
    Success,
    Danger,
}

/// KPI classification relative to the plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KpiBand {
    BelowTarget,
    OnTarget,
    AboveTarget,
}

impl KpiBand {
    pub fn color(&self) -> ColorToken {
        match self {
            Self::BelowTarget => ColorToken::Danger,
            Self::OnTarget => ColorToken::Warning,
            Self::AboveTarget => ColorToken::Success,
        }
    }
}

/// Decimal and thousands separators used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberLocale {
    #[default]
    En,
    PtBr,
}

impl NumberLocale {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "en" | "en-us" => Some(Self::En),
            "pt" | "pt-br" | "pt_br" => Some(Self::PtBr),
            _ => None,
        }
    }

    fn separators(&self) -> (char, char) {
        match self {
            Self::En => ('.', ','),
            Self::PtBr => (',', '.'),
        }
    }
}

/// Completion percentage from completed vs. planned quantity. Not clamped.
pub fn calcular_progresso(activity: &Activity) -> f64 {
    let quantity = activity.quantity.unwrap_or(0);
    let completed = activity.completed_quantity.unwrap_or(0);
    if quantity <= 0 {
        return 0.0;
    }
    finite_or_zero(completed as f64 / quantity as f64 * 100.0)
}

/// Efficiency index: planned effort over actual effort, in percent.
pub fn calcular_kpi(activity: &Activity) -> f64 {
    let estimated = non_negative(activity.estimated_time);
    let actual = non_negative(activity.total_time);

    if actual > 0.0 {
        finite_or_zero(estimated / actual * 100.0)
    } else if estimated > 0.0 {
        KPI_SEM_APONTAMENTO_PLANEJADO
    } else {
        KPI_SEM_PLANEJAMENTO
    }
}

/// Attach `_progresso` and `_kpi` to a copy of the activity.
pub fn enrich(activity: &Activity) -> EnrichedActivity {
    EnrichedActivity {
        progresso: calcular_progresso(activity),
        kpi: calcular_kpi(activity),
        activity: activity.clone(),
    }
}

pub fn formatar_progresso(value: f64) -> String {
    formatar_percentual(value, NumberLocale::default())
}

pub fn formatar_kpi(value: f64) -> String {
    formatar_percentual(value, NumberLocale::default())
}

/// One decimal place, grouped thousands, trailing `%`.
pub fn formatar_percentual(value: f64, locale: NumberLocale) -> String {
    format!("{}%", format_decimal(finite_or_zero(value), locale))
}

pub fn get_kpi_color(value: f64) -> KpiBand {
    let value = finite_or_zero(value);
    if value < KPI_LIMITE_INFERIOR {
        KpiBand::BelowTarget
    } else if value < KPI_LIMITE_SUPERIOR {
        KpiBand::OnTarget
    } else {
        KpiBand::AboveTarget
    }
}

pub fn status_color(status: ActivityStatus) -> ColorToken {
    match status {
        ActivityStatus::Planejadas => ColorToken::Info,
        ActivityStatus::EmExecucao => ColorToken::Warning,
        ActivityStatus::Concluidas => ColorToken::Success,
        ActivityStatus::Paralizadas => ColorToken::Danger,
    }
}

/// Accumulated time as `"8h"`, `"2h 30min"` or `"45min"`; `"-"` without data.
pub fn formatar_tempo_total(activity: &Activity) -> String {
    let hours = match activity.total_time {
        Some(h) if h.is_finite() && h >= 0.0 => h,
        _ => return PLACEHOLDER.to_string(),
    };

    let total_minutes = (hours * 60.0).round() as u64;
    let (h, m) = (total_minutes / 60, total_minutes % 60);
    match (h, m) {
        (0, m) if m > 0 => format!("{m}min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}min"),
    }
}

/// Zero-based row index to a one-based, zero-padded display code.
pub fn obter_codigo_sequencial(index: usize) -> String {
    format!("{:0width$}", index + 1, width = CODIGO_WIDTH)
}

/// `custoReal - custoPlanejado` when both are known.
pub fn variacao_custo(activity: &Activity) -> Option<Decimal> {
    Some(activity.custo_real? - activity.custo_planejado?)
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn format_decimal(value: f64, locale: NumberLocale) -> String {
    let (decimal_sep, thousands_sep) = locale.separators();
    let rendered = format!("{:.1}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((&rendered, "0"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(thousands_sep);
        }
        grouped.push(digit);
    }

    // "-0.0" reads as noise in a table cell
    let negative = value < 0.0 && rendered != "0.0";
    format!(
        "{}{}{}{}",
        if negative { "-" } else { "" },
        grouped,
        decimal_sep,
        frac_part
    )
}
