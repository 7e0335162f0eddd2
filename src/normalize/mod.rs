//! Turns loosely-shaped server documents into typed records.
//!
//! The server has shipped several document shapes over time (PascalCase
//! scanner output, camelCase summaries, wrapped and bare lists). Each field
//! is resolved through a fixed fallback order; anything that matches none of
//! the known shapes is recorded as a [`ShapeWarning`] rather than failing.

mod fields;

use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::models::{
    RawVulnerability, ReportSummary, ScanReport, Severity, TargetResult, VulnerabilityRecord,
};
use crate::summary;

pub use fields::ShapeWarning;
use fields::{first_present, first_str, first_u64};

/// Bumped whenever a fallback order below changes.
pub const NORMALIZER_VERSION: u32 = 1;

const ARTIFACT_KEYS: &[&str] = &["ArtifactName", "artifactName", "artifact"];
const RESULTS_KEYS: &[&str] = &["Results", "results"];
const TARGET_KEYS: &[&str] = &["Target", "target"];
const VULNS_KEYS: &[&str] = &["Vulnerabilities", "vulnerabilities"];
const VULN_ID_KEYS: &[&str] = &["VulnerabilityID", "vulnerabilityId", "id"];
const PKG_KEYS: &[&str] = &["PkgName", "packageName", "pkg"];
const SEVERITY_KEYS: &[&str] = &["Severity", "severity"];

const LIST_CONTAINER_KEYS: &[&str] = &["reports", "results"];
const SUMMARY_ID_KEYS: &[&str] = &["id", "_meta.id"];
const SUMMARY_ARTIFACT_KEYS: &[&str] = &["artifact", "artifactName", "ArtifactName"];
const UPLOADED_AT_KEYS: &[&str] = &[
    "uploadedAt",
    "_meta.uploaded_at",
    "_meta.timestamp",
    "UploadedAt",
    "timestamp",
    "CreatedAt",
];

/// A normalized value plus whatever could not be interpreted on the way.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub value: T,
    pub warnings: Vec<ShapeWarning>,
}

/// Normalize one `GET /report/{id}` document.
pub fn normalize_report(doc: &Value) -> Normalized<ScanReport> {
    let mut warnings = Vec::new();

    if !doc.is_object() {
        warnings.push(ShapeWarning::new("$", "report document is not an object"));
    }

    let artifact_name = match first_str(doc, ARTIFACT_KEYS) {
        Some(name) => name.to_string(),
        None => {
            warnings.push(ShapeWarning::new("$", "missing artifact name"));
            "unknown".to_string()
        }
    };

    let mut results = Vec::new();
    match first_present(doc, RESULTS_KEYS) {
        Some((key, Value::Array(items))) => {
            for (i, item) in items.iter().enumerate() {
                let location = format!("{key}[{i}]");
                if let Some(result) = normalize_target(item, &location, &mut warnings) {
                    results.push(result);
                }
            }
        }
        Some((key, _)) => warnings.push(ShapeWarning::new(key, "results is not a list")),
        None => warnings.push(ShapeWarning::new("$", "missing results")),
    }

    for w in &warnings {
        debug!(location = %w.location, "report shape: {}", w.message);
    }

    Normalized {
        value: ScanReport {
            artifact_name,
            results,
        },
        warnings,
    }
}

fn normalize_target(
    item: &Value,
    location: &str,
    warnings: &mut Vec<ShapeWarning>,
) -> Option<TargetResult> {
    if !item.is_object() {
        warnings.push(ShapeWarning::new(location, "result entry is not an object"));
        return None;
    }

    let target = first_str(item, TARGET_KEYS).unwrap_or_default().to_string();
    let mut vulnerabilities = Vec::new();

    // A missing or null vulnerability list is an ordinary clean target.
    match first_present(item, VULNS_KEYS) {
        Some((key, Value::Array(vulns))) => {
            for (j, v) in vulns.iter().enumerate() {
                let vuln_location = format!("{location}.{key}[{j}]");
                if !v.is_object() {
                    warnings.push(ShapeWarning::new(
                        vuln_location,
                        "vulnerability entry is not an object",
                    ));
                    continue;
                }
                vulnerabilities.push(RawVulnerability {
                    vulnerability_id: required_str(v, VULN_ID_KEYS, &vuln_location, warnings),
                    package_name: required_str(v, PKG_KEYS, &vuln_location, warnings),
                    severity: required_str(v, SEVERITY_KEYS, &vuln_location, warnings),
                });
            }
        }
        Some((key, _)) => warnings.push(ShapeWarning::new(
            format!("{location}.{key}"),
            "vulnerabilities is not a list",
        )),
        None => {}
    }

    Some(TargetResult {
        target,
        vulnerabilities,
    })
}

fn required_str(
    value: &Value,
    keys: &[&str],
    location: &str,
    warnings: &mut Vec<ShapeWarning>,
) -> String {
    match first_str(value, keys) {
        Some(s) => s.to_string(),
        None => {
            warnings.push(ShapeWarning::new(
                location,
                format!("missing field (tried {})", keys.join(", ")),
            ));
            String::new()
        }
    }
}

/// Flatten a report into one record per finding, in document order.
pub fn flatten_report(report: &ScanReport) -> Vec<VulnerabilityRecord> {
    report
        .results
        .iter()
        .flat_map(|result| {
            result.vulnerabilities.iter().map(move |v| {
                let label = v.severity.trim().to_uppercase();
                VulnerabilityRecord {
                    target: result.target.clone(),
                    vulnerability_id: v.vulnerability_id.clone(),
                    package_name: v.package_name.clone(),
                    severity: Severity::from_label(&label),
                    severity_label: label,
                }
            })
        })
        .collect()
}

/// Normalize a `GET /reports` response into list rows.
///
/// Entries without a usable id, and repeats of an id already seen, are
/// dropped: a row must always be navigable and uniquely keyed.
pub fn normalize_report_list(doc: &Value) -> Normalized<Vec<ReportSummary>> {
    debug!(version = NORMALIZER_VERSION, "normalizing report list");
    let mut warnings = Vec::new();

    let entries: &[Value] = match doc {
        Value::Array(items) => items.as_slice(),
        _ => match first_present(doc, LIST_CONTAINER_KEYS) {
            Some((_, Value::Array(items))) => items.as_slice(),
            _ => {
                warnings.push(ShapeWarning::new("$", "no report list found in response"));
                &[]
            }
        },
    };

    let mut seen = HashSet::new();
    let mut summaries = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let location = format!("[{i}]");
        // Ids are keys into `GET /report/{id}`; never rewrite them.
        let id = match first_str(entry, SUMMARY_ID_KEYS) {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => {
                warn!(%location, "excluding report entry without a valid id");
                warnings.push(ShapeWarning::new(location, "missing or empty report id"));
                continue;
            }
        };
        if !seen.insert(id.clone()) {
            warn!(%location, %id, "excluding duplicate report id");
            warnings.push(ShapeWarning::new(location, format!("duplicate report id '{id}'")));
            continue;
        }

        summaries.push(summarize_entry(entry, id));
    }

    Normalized {
        value: summaries,
        warnings,
    }
}

fn summarize_entry(entry: &Value, id: String) -> ReportSummary {
    let artifact_name = first_str(entry, SUMMARY_ARTIFACT_KEYS)
        .unwrap_or("unknown")
        .to_string();
    let uploaded_at = first_str(entry, UPLOADED_AT_KEYS)
        .unwrap_or_default()
        .to_string();

    // Pre-counted summaries carry numbers; raw scan documents must be counted.
    let counted = match first_u64(entry, &["critical", "criticalCount"]) {
        Some(_) => None,
        None => Some(summary::aggregate(&normalize_report(entry).value)),
    };

    let count = |keys: &[&str], severity: Severity| match &counted {
        Some(c) => c.get(severity),
        None => first_u64(entry, keys).unwrap_or(0),
    };

    ReportSummary {
        critical_count: count(&["critical", "criticalCount"], Severity::Critical),
        high_count: count(&["high", "highCount"], Severity::High),
        medium_count: count(&["medium", "mediumCount"], Severity::Medium),
        low_count: count(&["low", "lowCount"], Severity::Low),
        id,
        artifact_name,
        uploaded_at,
    }
}
