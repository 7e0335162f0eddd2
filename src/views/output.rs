use anyhow::Result;
use serde::Serialize;
use std::fs;
use termcolor::{Color, ColorSpec, WriteColor};

use super::models::{DeleteOutcome, DetailSnapshot, ListSnapshot};
use crate::models::{Severity, SeverityCounts};
use crate::upload::models::UploadReceipt;

/// Output any view as pretty JSON
pub fn output_json<T: Serialize>(value: &T, output_file: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(file_path) = output_file {
        fs::write(file_path, json)?;
        println!("Wrote JSON output to {}", file_path);
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn severity_color(severity: Severity) -> Option<Color> {
    match severity {
        Severity::Critical => Some(Color::Red),
        Severity::High => Some(Color::Yellow),
        Severity::Medium => Some(Color::Cyan),
        Severity::Low => Some(Color::Blue),
        Severity::Unknown => None,
    }
}

fn write_severity_counts<W: WriteColor + ?Sized>(
    out: &mut W,
    counts: &SeverityCounts,
) -> Result<()> {
    for (i, severity) in Severity::ALL.into_iter().enumerate() {
        if severity == Severity::Unknown && counts.unknown == 0 {
            continue;
        }
        if i > 0 {
            write!(out, "  |  ")?;
        }
        out.set_color(ColorSpec::new().set_fg(severity_color(severity)).set_bold(true))?;
        write!(out, "{}: {}", severity, counts.get(severity))?;
        out.reset()?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_pager<W: WriteColor + ?Sized>(
    out: &mut W,
    page: usize,
    total_pages: usize,
    total_items: usize,
    query: &str,
) -> Result<()> {
    writeln!(out, "Page {} of {} ({} items)", page, total_pages, total_items)?;
    out.set_color(ColorSpec::new().set_dimmed(true))?;
    writeln!(out, "?{}", query)?;
    out.reset()?;
    Ok(())
}

/// Detail view: summary chart, then the current page of findings.
pub fn output_detail<W: WriteColor + ?Sized>(out: &mut W, snap: &DetailSnapshot) -> Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "\nReport {}: {}", snap.report_id, snap.artifact_name)?;
    out.reset()?;
    writeln!(out)?;

    write!(out, "Total: {}  ", snap.summary.total)?;
    write_severity_counts(out, &snap.summary)?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;

    if snap.findings.items.is_empty() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(out, "No vulnerabilities match the current filters.")?;
        out.reset()?;
    }

    for row in &snap.findings.items {
        let severity = Severity::from_label(&row.severity);
        out.set_color(ColorSpec::new().set_fg(severity_color(severity)).set_bold(true))?;
        write!(out, "{:<10}", row.severity)?;
        out.reset()?;
        writeln!(out, " {}  {}", row.vulnerability_id, row.package_name)?;
        writeln!(out, "           Target: {}", row.target)?;
        if let Some(url) = &row.advisory_url {
            writeln!(out, "           {}", url)?;
        }
    }

    writeln!(out)?;
    write_pager(
        out,
        snap.findings.page,
        snap.findings.total_pages,
        snap.findings.total_items,
        &snap.query,
    )?;

    if !snap.warnings.is_empty() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(out, "{} unrecognized field(s) in report document", snap.warnings.len())?;
        out.reset()?;
    }
    Ok(())
}

/// List view: one line per stored report, then the totals.
pub fn output_list<W: WriteColor + ?Sized>(out: &mut W, snap: &ListSnapshot) -> Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "\nScan reports")?;
    out.reset()?;
    if !snap.artifact_filter.is_empty() {
        writeln!(out, "  Artifact filter: {}", snap.artifact_filter)?;
    }
    writeln!(out)?;

    if snap.reports.items.is_empty() {
        writeln!(out, "No reports found.")?;
    }

    for row in &snap.reports.items {
        let marker = if row.selected { "[x]" } else { "[ ]" };
        writeln!(
            out,
            "{} {}  {}  {}",
            marker, row.id, row.artifact_name, row.uploaded_at
        )?;
        write!(out, "      ")?;
        let counts = [
            (Severity::Critical, row.critical),
            (Severity::High, row.high),
            (Severity::Medium, row.medium),
            (Severity::Low, row.low),
        ];
        for (severity, count) in counts {
            out.set_color(ColorSpec::new().set_fg(severity_color(severity)))?;
            write!(out, "{}:{} ", severity.as_str().chars().next().unwrap_or('?'), count)?;
            out.reset()?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    write!(out, "All reports: ")?;
    write_severity_counts(out, &snap.totals)?;
    if snap.selected > 0 {
        let scope = if snap.page_selected { " (whole page)" } else { "" };
        writeln!(out, "Selected: {}{}", snap.selected, scope)?;
    }
    write_pager(
        out,
        snap.reports.page,
        snap.reports.total_pages,
        snap.reports.total_items,
        &snap.query,
    )?;

    if !snap.warnings.is_empty() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(out, "{} malformed report entr(ies) skipped", snap.warnings.len())?;
        out.reset()?;
    }
    Ok(())
}

pub fn output_upload<W: WriteColor + ?Sized>(out: &mut W, receipt: &UploadReceipt) -> Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(out, "Upload successful")?;
    out.reset()?;
    writeln!(out, ": {} -> report {}", receipt.filename, receipt.id)?;
    if let Some(artifact) = &receipt.artifact {
        writeln!(out, "  Artifact: {}", artifact)?;
    }
    Ok(())
}

pub fn output_delete<W: WriteColor + ?Sized>(out: &mut W, outcome: &DeleteOutcome) -> Result<()> {
    match outcome {
        DeleteOutcome::NothingSelected => writeln!(out, "No reports selected.")?,
        DeleteOutcome::Cancelled => writeln!(out, "Delete cancelled.")?,
        DeleteOutcome::Deleted {
            requested,
            deleted,
            refresh_error,
        } => {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "Deleted {} of {} report(s)", deleted, requested)?;
            out.reset()?;
            writeln!(out)?;
            if let Some(err) = refresh_error {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                writeln!(out, "Report list could not be refreshed: {}", err)?;
                out.reset()?;
            }
        }
    }
    Ok(())
}
