//! Desktop row and mobile card derivation.
//!
//! Both are pure functions of an enriched activity, its position in the
//! current ordering and the view's expanded set.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::metrics::{
    formatar_percentual, formatar_tempo_total, get_kpi_color, obter_codigo_sequencial,
    status_color, variacao_custo, ColorToken, KpiBand, NumberLocale,
};
use crate::domain::activities::{display_name, EnrichedActivity};

/// Progress bars never render wider than this.
const BAR_MAX: f64 = 100.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusBadge {
    pub label: &'static str,
    pub color: ColorToken,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCell {
    /// Raw value, may exceed 100.
    pub value: f64,
    pub bar_width: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiCell {
    pub value: f64,
    pub label: String,
    pub band: KpiBand,
    pub color: ColorToken,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostCell {
    pub planejado: Option<Decimal>,
    pub real: Option<Decimal>,
    pub variacao: Option<Decimal>,
}

/// Desktop table row
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
    pub tarefa_macro: String,
    pub processo: String,
    pub obra: String,
    pub ordem_servico: String,
    pub colaboradores: Vec<String>,
    pub status: StatusBadge,
    pub progresso: ProgressCell,
    pub kpi: KpiCell,
    pub tempo_total: String,
    pub custo: CostCell,
    pub data_inicio: Option<NaiveDate>,
    pub expanded: bool,
}

/// Details only present on an expanded mobile card
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub processo: String,
    pub obra: String,
    pub ordem_servico: String,
    pub colaboradores: Vec<String>,
    pub tempo_total: String,
    pub custo: CostCell,
    pub data_inicio: Option<NaiveDate>,
}

/// Mobile card
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCard {
    pub id: i64,
    pub codigo: String,
    pub titulo: String,
    pub subtitulo: String,
    pub status: StatusBadge,
    pub progresso: ProgressCell,
    pub kpi: KpiCell,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalhes: Option<CardDetails>,
}

fn status_badge(item: &EnrichedActivity) -> StatusBadge {
    let status = item.activity.status_kind();
    StatusBadge {
        label: status.label(),
        color: status_color(status),
    }
}

fn progress_cell(item: &EnrichedActivity, locale: NumberLocale) -> ProgressCell {
    ProgressCell {
        value: item.progresso,
        bar_width: item.progresso.clamp(0.0, BAR_MAX),
        label: formatar_percentual(item.progresso, locale),
    }
}

fn kpi_cell(item: &EnrichedActivity, locale: NumberLocale) -> KpiCell {
    let band = get_kpi_color(item.kpi);
    KpiCell {
        value: item.kpi,
        label: formatar_percentual(item.kpi, locale),
        band,
        color: band.color(),
    }
}

fn cost_cell(item: &EnrichedActivity) -> CostCell {
    CostCell {
        planejado: item.activity.custo_planejado,
        real: item.activity.custo_real,
        variacao: variacao_custo(&item.activity),
    }
}

/// `index` is the zero-based position in the full sorted collection.
pub fn build_row(
    item: &EnrichedActivity,
    index: usize,
    expanded: bool,
    locale: NumberLocale,
) -> ActivityRow {
    let a = &item.activity;
    ActivityRow {
        id: a.id,
        codigo: obter_codigo_sequencial(index),
        descricao: a.description.clone(),
        tarefa_macro: display_name(a.macro_task.as_ref()).to_string(),
        processo: display_name(a.process.as_ref()).to_string(),
        obra: display_name(a.project.as_ref()).to_string(),
        ordem_servico: display_name(a.service_order.as_ref()).to_string(),
        colaboradores: a.collaborator_names(),
        status: status_badge(item),
        progresso: progress_cell(item, locale),
        kpi: kpi_cell(item, locale),
        tempo_total: formatar_tempo_total(a),
        custo: cost_cell(item),
        data_inicio: a.reference_date(),
        expanded,
    }
}

pub fn build_card(
    item: &EnrichedActivity,
    index: usize,
    expanded: bool,
    locale: NumberLocale,
) -> ActivityCard {
    let a = &item.activity;
    let detalhes = expanded.then(|| CardDetails {
        processo: display_name(a.process.as_ref()).to_string(),
        obra: display_name(a.project.as_ref()).to_string(),
        ordem_servico: display_name(a.service_order.as_ref()).to_string(),
        colaboradores: a.collaborator_names(),
        tempo_total: formatar_tempo_total(a),
        custo: cost_cell(item),
        data_inicio: a.reference_date(),
    });

    ActivityCard {
        id: a.id,
        codigo: obter_codigo_sequencial(index),
        titulo: a.description.clone(),
        subtitulo: display_name(a.macro_task.as_ref()).to_string(),
        status: status_badge(item),
        progresso: progress_cell(item, locale),
        kpi: kpi_cell(item, locale),
        expanded,
        detalhes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::metrics::enrich;
    use crate::domain::activities::{Activity, Reference};

    fn item() -> EnrichedActivity {
        enrich(&Activity {
            id: 42,
            description: "Armação de pilares".into(),
            status: "Em execução".into(),
            quantity: Some(10),
            completed_quantity: Some(13),
            estimated_time: Some(10.0),
            total_time: Some(20.0),
            macro_task: Some(Reference::new("MT-1", "Estrutura")),
            collaborators: vec![Reference::new("C-1", "Ana")],
            ..Default::default()
        })
    }

    #[test]
    fn row_clamps_bar_but_keeps_raw_progress() {
        let row = build_row(&item(), 4, false, NumberLocale::En);
        assert_eq!(row.codigo, "005");
        assert_eq!(row.progresso.value, 130.0);
        assert_eq!(row.progresso.bar_width, 100.0);
        assert_eq!(row.progresso.label, "130.0%");
        assert_eq!(row.kpi.label, "50.0%");
        assert_eq!(row.kpi.band, KpiBand::BelowTarget);
        assert_eq!(row.status.color, ColorToken::Warning);
        assert_eq!(row.tarefa_macro, "Estrutura");
        assert_eq!(row.processo, "-");
        assert_eq!(row.tempo_total, "20h");
    }

    #[test]
    fn unknown_status_uses_planned_badge() {
        let mut it = item();
        it.activity.status = "Arquivada".into();
        let row = build_row(&it, 0, false, NumberLocale::En);
        assert_eq!(row.status.label, "Planejadas");
        assert_eq!(row.status.color, ColorToken::Info);
    }

    #[test]
    fn card_details_only_when_expanded() {
        let collapsed = build_card(&item(), 0, false, NumberLocale::PtBr);
        assert!(collapsed.detalhes.is_none());
        assert_eq!(collapsed.kpi.label, "50,0%");

        let expanded = build_card(&item(), 0, true, NumberLocale::En);
        let details = expanded.detalhes.unwrap();
        assert_eq!(details.colaboradores, vec!["Ana"]);
        assert_eq!(details.tempo_total, "20h");
    }
}
