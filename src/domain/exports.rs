//! Export domain types
//!
//! The export service renders PDF/Excel documents; this service only hands
//! it the filtered collection, the committed filters and the column choice.

use serde::{Deserialize, Serialize};

use super::activities::EnrichedActivity;
use super::filters::FilterCriteria;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "excel",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
        }
    }
}

/// Column that can be included in an exported report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ExportColumn {
    Codigo,
    Descricao,
    TarefaMacro,
    Processo,
    Obra,
    OrdemServico,
    Colaboradores,
    Status,
    Progresso,
    Kpi,
    TempoTotal,
    Custos,
    DataInicio,
}

impl ExportColumn {
    pub const DEFAULT_SELECTION: [ExportColumn; 11] = [
        Self::Codigo,
        Self::Descricao,
        Self::TarefaMacro,
        Self::Processo,
        Self::Obra,
        Self::Colaboradores,
        Self::Status,
        Self::Progresso,
        Self::Kpi,
        Self::TempoTotal,
        Self::DataInicio,
    ];
}

/// Request DTO for exporting the current view
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Defaults to [`ExportColumn::DEFAULT_SELECTION`] when absent or empty.
    #[serde(default)]
    pub columns: Option<Vec<ExportColumn>>,
}

impl ExportRequest {
    /// Requested columns, deduplicated, in request order.
    pub fn column_selection(&self) -> Vec<ExportColumn> {
        match &self.columns {
            Some(columns) if !columns.is_empty() => {
                let mut selection = Vec::with_capacity(columns.len());
                for column in columns {
                    if !selection.contains(column) {
                        selection.push(*column);
                    }
                }
                selection
            }
            _ => ExportColumn::DEFAULT_SELECTION.to_vec(),
        }
    }
}

/// Body sent to the export service
#[derive(Debug, Clone, Serialize)]
pub struct ExportPayload {
    pub atividades: Vec<EnrichedActivity>,
    pub filtros: FilterCriteria,
    pub colunas: Vec<ExportColumn>,
}

/// Rendered document returned by the export service
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub content_type: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}
