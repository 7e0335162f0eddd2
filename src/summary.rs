use crate::models::{ReportSummary, ScanReport, Severity, SeverityCounts};

/// Count findings per severity across every target of a report.
///
/// Always fed the unfiltered report: the summary is ground truth and does not
/// move when the table's filters do.
pub fn aggregate(report: &ScanReport) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for result in &report.results {
        for v in &result.vulnerabilities {
            counts.record(Severity::from_label(&v.severity));
        }
    }
    counts
}

/// Totals across a set of list rows. Summaries carry no UNKNOWN bucket.
pub fn aggregate_summaries(summaries: &[ReportSummary]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for s in summaries {
        counts.critical += s.critical_count;
        counts.high += s.high_count;
        counts.medium += s.medium_count;
        counts.low += s.low_count;
    }
    counts.total = counts.critical + counts.high + counts.medium + counts.low;
    counts
}
