use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{ReportSummary, VulnerabilityRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// A column that knows how to order the rows of one view.
pub trait SortKey<T>: Copy + PartialEq {
    fn compare(self, a: &T, b: &T) -> Ordering;
}

/// Detail table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordSortField {
    Target,
    VulnerabilityId,
    Package,
    Severity,
}

impl RecordSortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::VulnerabilityId => "vulnerabilityId",
            Self::Package => "package",
            Self::Severity => "severity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "target" => Some(Self::Target),
            "vulnerability" | "vulnerabilityid" | "vulnid" | "id" => Some(Self::VulnerabilityId),
            "package" | "pkg" | "pkgname" => Some(Self::Package),
            "severity" => Some(Self::Severity),
            _ => None,
        }
    }
}

impl SortKey<VulnerabilityRecord> for RecordSortField {
    fn compare(self, a: &VulnerabilityRecord, b: &VulnerabilityRecord) -> Ordering {
        match self {
            Self::Target => locale_compare(&a.target, &b.target),
            Self::VulnerabilityId => locale_compare(&a.vulnerability_id, &b.vulnerability_id),
            Self::Package => locale_compare(&a.package_name, &b.package_name),
            Self::Severity => a.severity.rank().cmp(&b.severity.rank()),
        }
    }
}

/// Report list columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SummarySortField {
    Artifact,
    UploadedAt,
    Critical,
    High,
    Medium,
    Low,
}

impl SummarySortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artifact => "artifact",
            Self::UploadedAt => "uploadedAt",
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "artifact" | "artifactname" => Some(Self::Artifact),
            "uploadedat" | "timestamp" => Some(Self::UploadedAt),
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl SortKey<ReportSummary> for SummarySortField {
    fn compare(self, a: &ReportSummary, b: &ReportSummary) -> Ordering {
        match self {
            Self::Artifact => locale_compare(&a.artifact_name, &b.artifact_name),
            Self::UploadedAt => locale_compare(&a.uploaded_at, &b.uploaded_at),
            Self::Critical => a.critical_count.cmp(&b.critical_count),
            Self::High => a.high_count.cmp(&b.high_count),
            Self::Medium => a.medium_count.cmp(&b.medium_count),
            Self::Low => a.low_count.cmp(&b.low_count),
        }
    }
}

/// Current column and direction of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: Copy + PartialEq> SortState<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Column header click: the active column flips, a new one starts ascending.
    pub fn toggle(&mut self, field: F) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }
}

/// Stable sort; `Desc` inverts the comparator so ties keep input order.
pub fn sort<T, F: SortKey<T>>(mut items: Vec<T>, field: F, direction: SortDirection) -> Vec<T> {
    items.sort_by(|a, b| {
        let ord = field.compare(a, b);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    items
}

/// Case-folded comparison with a byte-order tiebreak, so "apache" sorts
/// next to "Apache" rather than after every uppercase name.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
