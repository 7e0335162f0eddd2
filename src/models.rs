use serde::{Deserialize, Serialize};

/// Five-level finding severity, ordered from most to least urgent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Unknown,
    ];

    /// Fixed sort rank: CRITICAL=0 .. UNKNOWN=4.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Unknown => 4,
        }
    }

    /// Bucket a free-text scanner severity. Anything unrecognized is UNKNOWN.
    pub fn from_label(label: &str) -> Severity {
        Severity::parse(label).unwrap_or(Severity::Unknown)
    }

    /// Strict parse, used for query parameters where junk should be ignored.
    pub fn parse(label: &str) -> Option<Severity> {
        match label.trim().to_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            "UNKNOWN" => Some(Severity::Unknown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Server documents (after shape normalization) ==========

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawVulnerability {
    pub vulnerability_id: String,
    pub package_name: String,
    pub severity: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TargetResult {
    pub target: String,
    #[serde(default)]
    pub vulnerabilities: Vec<RawVulnerability>,
}

/// One scan report as delivered by `GET /report/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub artifact_name: String,
    pub results: Vec<TargetResult>,
}

// ========== View projections ==========

/// Flattened, queryable projection of a [`RawVulnerability`].
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRecord {
    pub target: String,
    pub vulnerability_id: String,
    pub package_name: String,
    /// Uppercased scanner label, kept verbatim for display.
    pub severity_label: String,
    pub severity: Severity,
}

/// One row of the report list.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: String,
    pub artifact_name: String,
    pub uploaded_at: String,
    pub critical_count: u64,
    pub high_count: u64,
    pub medium_count: u64,
    pub low_count: u64,
}

/// Per-severity totals for one report or a set of reports.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub unknown: u64,
    pub total: u64,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Unknown => self.unknown += 1,
        }
        self.total += 1;
    }

    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown => self.unknown,
        }
    }
}
