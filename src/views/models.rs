use serde::Serialize;

use crate::models::{ReportSummary, SeverityCounts, VulnerabilityRecord};
use crate::normalize::ShapeWarning;
use crate::query::PageView;
use crate::utils::{advisory_url, format_timestamp};

/// Where a view's data currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(crate::error::ViewError),
}

/// One finding as shown in the detail table.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FindingRow {
    pub target: String,
    pub vulnerability_id: String,
    pub package_name: String,
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory_url: Option<String>,
}

impl From<&VulnerabilityRecord> for FindingRow {
    fn from(record: &VulnerabilityRecord) -> Self {
        Self {
            target: record.target.clone(),
            vulnerability_id: record.vulnerability_id.clone(),
            package_name: record.package_name.clone(),
            severity: if record.severity_label.is_empty() {
                record.severity.as_str().to_string()
            } else {
                record.severity_label.clone()
            },
            advisory_url: advisory_url(&record.vulnerability_id),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailSnapshot {
    pub report_id: String,
    pub artifact_name: String,
    /// Always over the whole report, whatever the filters.
    pub summary: SeverityCounts,
    pub findings: PageView<FindingRow>,
    pub query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ShapeWarning>,
}

/// One stored report as shown in the list table.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: String,
    pub artifact_name: String,
    pub uploaded_at: String,
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub selected: bool,
}

impl ReportRow {
    pub fn new(summary: &ReportSummary, selected: bool) -> Self {
        Self {
            id: summary.id.clone(),
            artifact_name: summary.artifact_name.clone(),
            uploaded_at: format_timestamp(&summary.uploaded_at),
            critical: summary.critical_count,
            high: summary.high_count,
            medium: summary.medium_count,
            low: summary.low_count,
            selected,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot {
    pub reports: PageView<ReportRow>,
    /// Over every stored report, ignoring the artifact filter.
    pub totals: SeverityCounts,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub artifact_filter: String,
    pub selected: usize,
    /// Header checkbox state for the current page.
    pub page_selected: bool,
    pub query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ShapeWarning>,
}

/// How a bulk delete ended.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum DeleteOutcome {
    NothingSelected,
    Cancelled,
    Deleted {
        requested: usize,
        deleted: u64,
        /// Set when the reports went away but the list could not be reloaded.
        #[serde(rename = "refreshError", skip_serializing_if = "Option::is_none")]
        refresh_error: Option<String>,
    },
}
