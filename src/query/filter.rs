use std::collections::BTreeSet;

use crate::models::{ReportSummary, Severity, VulnerabilityRecord};

/// Active table filters for the detail view.
///
/// An empty `severities` set is legal and matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub severities: BTreeSet<Severity>,
    pub package_substring: String,
    pub id_substring: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            severities: Severity::ALL.into_iter().collect(),
            package_substring: String::new(),
            id_substring: String::new(),
        }
    }
}

impl FilterState {
    pub fn all_severities_selected(&self) -> bool {
        self.severities.len() == Severity::ALL.len()
    }

    pub fn toggle_severity(&mut self, severity: Severity) {
        if !self.severities.remove(&severity) {
            self.severities.insert(severity);
        }
    }

    /// The "All" checkbox: full set becomes empty, anything else becomes full.
    /// The previous partial selection is not remembered.
    pub fn toggle_all_severities(&mut self) {
        if self.all_severities_selected() {
            self.severities.clear();
        } else {
            self.severities = Severity::ALL.into_iter().collect();
        }
    }

    /// Show exactly one severity (summary chart click).
    pub fn focus_severity(&mut self, severity: Severity) {
        self.severities = BTreeSet::from([severity]);
    }

    pub fn matches(&self, record: &VulnerabilityRecord) -> bool {
        matches(record, self)
    }
}

/// A record matches iff every active predicate holds.
pub fn matches(record: &VulnerabilityRecord, state: &FilterState) -> bool {
    state.severities.contains(&record.severity)
        && contains_ignore_case(&record.package_name, &state.package_substring)
        && contains_ignore_case(&record.vulnerability_id, &state.id_substring)
}

/// List view search box: case-insensitive artifact substring.
pub fn matches_artifact(summary: &ReportSummary, needle: &str) -> bool {
    contains_ignore_case(&summary.artifact_name, needle)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
