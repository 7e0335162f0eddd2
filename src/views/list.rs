use serde_json::Value;
use tracing::{debug, info, warn};

use super::models::{DeleteOutcome, ListSnapshot, LoadState, ReportRow};
use crate::client::{Applied, ReportTransport, RequestSequencer, RequestTicket};
use crate::error::{TransportError, ViewError};
use crate::events::{RefreshBus, Subscription};
use crate::models::{ReportSummary, SeverityCounts};
use crate::normalize::{self, ShapeWarning};
use crate::query::filter::matches_artifact;
use crate::query::paginate::PaginationState;
use crate::query::params::ViewParams;
use crate::query::sort::{SortDirection, SortState, SummarySortField};
use crate::query::{self, PageView};
use crate::selection::SelectionSet;
use crate::summary;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedList {
    pub summaries: Vec<ReportSummary>,
    pub warnings: Vec<ShapeWarning>,
}

/// The stored-report table: artifact search, sort, pager and a selection
/// for bulk deletion.
pub struct ListView {
    sequencer: RequestSequencer,
    state: LoadState<LoadedList>,
    artifact_filter: String,
    sort: SortState<SummarySortField>,
    pagination: PaginationState,
    selection: SelectionSet,
    refresh: Option<Subscription>,
}

impl ListView {
    pub fn new(page_size: usize) -> Self {
        Self {
            sequencer: RequestSequencer::default(),
            state: LoadState::Idle,
            artifact_filter: String::new(),
            sort: SortState::new(SummarySortField::UploadedAt, SortDirection::Desc),
            pagination: PaginationState::new(1, page_size),
            selection: SelectionSet::new(),
            refresh: None,
        }
    }

    /// Restore sort and page from a query string. Filters other than the
    /// artifact search do not apply to the list.
    pub fn from_params(params: &ViewParams, default_page_size: usize) -> Self {
        let mut view = Self::new(params.page_size.unwrap_or(default_page_size));
        if let Some(field) = params.sort_field.as_deref().and_then(SummarySortField::parse) {
            view.sort.field = field;
        }
        if let Some(dir) = params.sort_dir {
            view.sort.direction = dir;
        }
        view.pagination.page = params.page.unwrap_or(1);
        view
    }

    /// Re-fetch whenever `bus` reports a change, checked by [`Self::poll_refresh`].
    pub fn subscribe(&mut self, bus: &RefreshBus) {
        self.refresh = Some(bus.subscribe());
    }

    pub fn error(&self) -> Option<&ViewError> {
        match &self.state {
            LoadState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn sort_state(&self) -> SortState<SummarySortField> {
        self.sort
    }

    #[cfg(test)]
    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn begin_load(&mut self) -> RequestTicket {
        self.state = LoadState::Loading;
        self.sequencer.begin()
    }

    /// Apply a `GET /reports` result, unless a newer request superseded it.
    /// A fresh successful load always clears the selection.
    pub fn apply_load(
        &mut self,
        ticket: RequestTicket,
        result: Result<Value, TransportError>,
    ) -> Applied {
        if !self.sequencer.is_current(ticket) {
            debug!("discarding stale report list response");
            return Applied::Stale;
        }

        self.state = match result {
            Ok(doc) => {
                let normalized = normalize::normalize_report_list(&doc);
                info!(
                    reports = normalized.value.len(),
                    excluded = normalized.warnings.len(),
                    "report list loaded"
                );
                self.selection.clear();
                LoadState::Ready(LoadedList {
                    summaries: normalized.value,
                    warnings: normalized.warnings,
                })
            }
            Err(err) => {
                warn!("failed to load report list: {}", err);
                LoadState::Failed(err.into())
            }
        };
        self.clamp_page();
        Applied::Fresh
    }

    pub fn load<T: ReportTransport + ?Sized>(&mut self, transport: &T) -> Result<(), ViewError> {
        let ticket = self.begin_load();
        let result = transport.fetch_reports();
        self.apply_load(ticket, result);
        match self.error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Re-fetch if a refresh was signalled since the last poll.
    /// Returns whether a fetch happened.
    pub fn poll_refresh<T: ReportTransport + ?Sized>(
        &mut self,
        transport: &T,
    ) -> Result<bool, ViewError> {
        let pending = self.refresh.as_ref().is_some_and(|s| s.take_pending());
        if !pending {
            return Ok(false);
        }
        debug!("refresh signalled, reloading report list");
        self.load(transport)?;
        Ok(true)
    }

    /// Navigating away: drop outstanding responses and the bus subscription.
    pub fn unmount(&mut self) {
        self.sequencer.invalidate();
        self.refresh = None;
    }

    pub fn set_artifact_filter(&mut self, needle: &str) {
        self.artifact_filter = needle.trim().to_string();
        self.pagination.page = 1;
    }

    pub fn sort_by(&mut self, field: SummarySortField) {
        self.sort.toggle(field);
        self.pagination.page = 1;
    }

    pub fn set_sort(&mut self, field: SummarySortField, direction: SortDirection) {
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

    /// Whether `id` is one of the loaded reports.
    pub fn contains(&self, id: &str) -> bool {
        match &self.state {
            LoadState::Ready(loaded) => loaded.summaries.iter().any(|s| s.id == id),
            _ => false,
        }
    }

    pub fn toggle_selected(&mut self, id: &str) {
        self.selection.toggle(id);
    }

    /// Header checkbox: select the whole current page, or clear it when it
    /// is already fully selected.
    pub fn toggle_all_on_page(&mut self) {
        let ids: Vec<String> = self
            .current_page()
            .map(|page| page.items.into_iter().map(|s| s.id).collect())
            .unwrap_or_default();
        self.selection.toggle_all_on_page(&ids);
    }

    /// Delete every selected report after `confirm` agrees, then reload.
    /// A failed delete keeps the selection so the user can retry.
    pub fn delete_selected<T: ReportTransport + ?Sized>(
        &mut self,
        transport: &T,
        confirm: impl FnOnce(&[String]) -> bool,
    ) -> Result<DeleteOutcome, ViewError> {
        if self.selection.is_empty() {
            return Ok(DeleteOutcome::NothingSelected);
        }
        let ids = self.selection.ids();
        if !confirm(&ids) {
            info!(count = ids.len(), "bulk delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let response = transport.delete_reports(&ids).map_err(|err| {
            warn!(count = ids.len(), "bulk delete failed: {}", err);
            ViewError::from(err)
        })?;
        info!(requested = ids.len(), deleted = response.deleted, "bulk delete done");
        self.selection.clear();

        let refresh_error = self.load(transport).err().map(|err| {
            warn!("reload after delete failed: {}", err);
            err.to_string()
        });
        Ok(DeleteOutcome::Deleted {
            requested: ids.len(),
            deleted: response.deleted,
            refresh_error,
        })
    }

    /// Severity totals over every loaded report, ignoring the search box.
    pub fn totals(&self) -> Option<SeverityCounts> {
        match &self.state {
            LoadState::Ready(loaded) => Some(summary::aggregate_summaries(&loaded.summaries)),
            _ => None,
        }
    }

    pub fn current_page(&mut self) -> Option<PageView<ReportSummary>> {
        let LoadState::Ready(loaded) = &self.state else {
            return None;
        };
        Some(query::run(
            &loaded.summaries,
            |s| matches_artifact(s, &self.artifact_filter),
            &self.sort,
            &mut self.pagination,
        ))
    }

    pub fn params(&self) -> ViewParams {
        ViewParams {
            page: Some(self.pagination.page),
            page_size: Some(self.pagination.page_size),
            sort_field: Some(self.sort.field.as_str().to_string()),
            sort_dir: Some(self.sort.direction),
            ..ViewParams::default()
        }
    }

    pub fn snapshot(&mut self) -> Option<ListSnapshot> {
        let page = self.current_page()?;
        let totals = self.totals()?;
        let page_ids: Vec<&str> = page.items.iter().map(|s| s.id.as_str()).collect();
        let warnings = match &self.state {
            LoadState::Ready(loaded) => loaded.warnings.clone(),
            _ => Vec::new(),
        };
        Some(ListSnapshot {
            reports: PageView {
                items: page
                    .items
                    .iter()
                    .map(|s| ReportRow::new(s, self.selection.is_selected(&s.id)))
                    .collect(),
                page: page.page,
                page_size: page.page_size,
                total_pages: page.total_pages,
                total_items: page.total_items,
            },
            totals,
            artifact_filter: self.artifact_filter.clone(),
            selected: self.selection.len(),
            page_selected: self.selection.all_selected_on_page(&page_ids),
            query: self.params().to_query_string(),
            warnings,
        })
    }

    fn clamp_page(&mut self) {
        let total = match &self.state {
            LoadState::Ready(loaded) => loaded
                .summaries
                .iter()
                .filter(|s| matches_artifact(s, &self.artifact_filter))
                .count(),
            _ => 0,
        };
        self.pagination.clamp(total);
    }
}
