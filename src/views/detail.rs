use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::models::{DetailSnapshot, FindingRow, LoadState};
use crate::client::{Applied, ReportTransport, RequestSequencer, RequestTicket};
use crate::error::{TransportError, ViewError};
use crate::models::{ScanReport, Severity, SeverityCounts, VulnerabilityRecord};
use crate::normalize::{self, ShapeWarning};
use crate::query::filter::FilterState;
use crate::query::paginate::PaginationState;
use crate::query::params::ViewParams;
use crate::query::sort::{RecordSortField, SortDirection, SortState};
use crate::query::{self, PageView};
use crate::summary;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedReport {
    pub report: ScanReport,
    pub records: Vec<VulnerabilityRecord>,
    pub counts: SeverityCounts,
    pub warnings: Vec<ShapeWarning>,
}

/// One report's findings table with its own filters, sort and pager.
pub struct DetailView {
    report_id: String,
    sequencer: RequestSequencer,
    state: LoadState<LoadedReport>,
    filter: FilterState,
    sort: SortState<RecordSortField>,
    pagination: PaginationState,
}

impl DetailView {
    pub fn new(report_id: &str, page_size: usize) -> Self {
        Self {
            report_id: report_id.to_string(),
            sequencer: RequestSequencer::default(),
            state: LoadState::Idle,
            filter: FilterState::default(),
            sort: SortState::new(RecordSortField::Severity, SortDirection::Asc),
            pagination: PaginationState::new(1, page_size),
        }
    }

    /// Restore filters, sort and page from an addressable query string.
    pub fn from_params(report_id: &str, params: &ViewParams, default_page_size: usize) -> Self {
        let mut view = Self::new(report_id, params.page_size.unwrap_or(default_page_size));
        if let Some(severities) = &params.severities {
            view.filter.severities = severities.clone();
        }
        view.filter.package_substring = params.package.clone().unwrap_or_default();
        view.filter.id_substring = params.vuln_id.clone().unwrap_or_default();
        if let Some(field) = params.sort_field.as_deref().and_then(RecordSortField::parse) {
            view.sort.field = field;
        }
        if let Some(dir) = params.sort_dir {
            view.sort.direction = dir;
        }
        view.pagination.page = params.page.unwrap_or(1);
        view
    }

    pub fn error(&self) -> Option<&ViewError> {
        match &self.state {
            LoadState::Failed(err) => Some(err),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort_state(&self) -> SortState<RecordSortField> {
        self.sort
    }

    #[cfg(test)]
    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn begin_load(&mut self) -> RequestTicket {
        self.state = LoadState::Loading;
        self.sequencer.begin()
    }

    /// Apply a `GET /report/{id}` result, unless a newer request superseded it.
    pub fn apply_load(
        &mut self,
        ticket: RequestTicket,
        result: Result<Value, TransportError>,
    ) -> Applied {
        if !self.sequencer.is_current(ticket) {
            debug!(report = %self.report_id, "discarding stale report response");
            return Applied::Stale;
        }

        self.state = match result {
            Ok(doc) if !doc.is_object() => {
                warn!(report = %self.report_id, "report document is not an object");
                LoadState::Failed(ViewError::MalformedData {
                    reason: format!("report {} is not a JSON object", self.report_id),
                })
            }
            Ok(doc) => {
                let normalized = normalize::normalize_report(&doc);
                for w in &normalized.warnings {
                    warn!(report = %self.report_id, location = %w.location, "{}", w.message);
                }
                let report = normalized.value;
                let records = normalize::flatten_report(&report);
                let counts = summary::aggregate(&report);
                info!(report = %self.report_id, findings = records.len(), "report loaded");
                LoadState::Ready(LoadedReport {
                    report,
                    records,
                    counts,
                    warnings: normalized.warnings,
                })
            }
            Err(TransportError::NotFound { .. }) => {
                warn!(report = %self.report_id, "report not found");
                LoadState::Failed(ViewError::NotFound {
                    id: self.report_id.clone(),
                })
            }
            Err(err) => {
                warn!(report = %self.report_id, "failed to load report: {}", err);
                LoadState::Failed(err.into())
            }
        };
        self.clamp_page();
        Applied::Fresh
    }

    /// Fetch and apply in one go.
    pub fn load<T: ReportTransport + ?Sized>(&mut self, transport: &T) -> Result<(), ViewError> {
        let ticket = self.begin_load();
        let result = transport.fetch_report(&self.report_id);
        self.apply_load(ticket, result);
        match self.error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Navigating away: nothing outstanding may land afterwards.
    pub fn unmount(&mut self) {
        self.sequencer.invalidate();
    }

    pub fn toggle_severity(&mut self, severity: Severity) {
        self.filter.toggle_severity(severity);
        self.pagination.page = 1;
    }

    pub fn toggle_all_severities(&mut self) {
        self.filter.toggle_all_severities();
        self.pagination.page = 1;
    }

    pub fn set_severities(&mut self, severities: BTreeSet<Severity>) {
        self.filter.severities = severities;
        self.pagination.page = 1;
    }

    /// Summary chart click.
    pub fn focus_severity(&mut self, severity: Severity) {
        self.filter.focus_severity(severity);
        self.pagination.page = 1;
    }

    pub fn set_package_filter(&mut self, needle: &str) {
        self.filter.package_substring = needle.trim().to_string();
        self.pagination.page = 1;
    }

    pub fn set_id_filter(&mut self, needle: &str) {
        self.filter.id_substring = needle.trim().to_string();
        self.pagination.page = 1;
    }

    /// Column header click.
    pub fn sort_by(&mut self, field: RecordSortField) {
        self.sort.toggle(field);
        self.pagination.page = 1;
    }

    pub fn set_sort(&mut self, field: RecordSortField, direction: SortDirection) {
        self.sort = SortState::new(field, direction);
        self.pagination.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.pagination.set_page_size(page_size);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pagination.page = page;
        self.clamp_page();
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.pagination.page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.pagination.page.saturating_sub(1));
    }

    /// Unfiltered severity counts of the loaded report.
    #[cfg(test)]
    pub fn summary(&self) -> Option<SeverityCounts> {
        match &self.state {
            LoadState::Ready(loaded) => Some(loaded.counts),
            _ => None,
        }
    }

    pub fn filtered_len(&self) -> usize {
        match &self.state {
            LoadState::Ready(loaded) => loaded
                .records
                .iter()
                .filter(|r| self.filter.matches(r))
                .count(),
            _ => 0,
        }
    }

    pub fn current_page(&mut self) -> Option<PageView<VulnerabilityRecord>> {
        let LoadState::Ready(loaded) = &self.state else {
            return None;
        };
        Some(query::run(
            &loaded.records,
            |r| self.filter.matches(r),
            &self.sort,
            &mut self.pagination,
        ))
    }

    /// The query string for the current state.
    pub fn params(&self) -> ViewParams {
        ViewParams {
            severities: (!self.filter.all_severities_selected())
                .then(|| self.filter.severities.clone()),
            package: non_empty(&self.filter.package_substring),
            vuln_id: non_empty(&self.filter.id_substring),
            page: Some(self.pagination.page),
            page_size: Some(self.pagination.page_size),
            sort_field: Some(self.sort.field.as_str().to_string()),
            sort_dir: Some(self.sort.direction),
        }
    }

    pub fn snapshot(&mut self) -> Option<DetailSnapshot> {
        let page = self.current_page()?;
        let query = self.params().to_query_string();
        let LoadState::Ready(loaded) = &self.state else {
            return None;
        };
        Some(DetailSnapshot {
            report_id: self.report_id.clone(),
            artifact_name: loaded.report.artifact_name.clone(),
            summary: loaded.counts,
            findings: PageView {
                items: page.items.iter().map(FindingRow::from).collect(),
                page: page.page,
                page_size: page.page_size,
                total_pages: page.total_pages,
                total_items: page.total_items,
            },
            query,
            warnings: loaded.warnings.clone(),
        })
    }

    fn clamp_page(&mut self) {
        let total = self.filtered_len();
        self.pagination.clamp(total);
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
