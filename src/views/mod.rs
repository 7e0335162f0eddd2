pub mod detail;
pub mod list;
pub mod models;
pub mod output;

use anyhow::{Context, Result, bail, ensure};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, Write};
use termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};
use tracing::info;

use crate::client::ReportTransport;
use crate::models::Severity;
use crate::query::paginate::PAGE_SIZE_OPTIONS;
use crate::query::params::ViewParams;
use crate::query::sort::{RecordSortField, SortDirection, SummarySortField};
use detail::DetailView;
use list::ListView;

/// Knobs shared by the list and detail commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PagingArgs {
    /// Column to sort by
    #[arg(long)]
    pub sort_field: Option<String>,
    /// Sort direction: asc or desc
    #[arg(long)]
    pub sort_dir: Option<String>,
    /// Click a column header: sort by it, or flip the direction if already sorted by it
    #[arg(long, conflicts_with = "sort_field")]
    pub sort_by: Option<String>,
    #[arg(long)]
    pub page: Option<usize>,
    /// Move one page forward
    #[arg(long, conflicts_with = "prev")]
    pub next: bool,
    /// Move one page back
    #[arg(long)]
    pub prev: bool,
    /// Rows per page: 10, 25, 50 or 100
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Restore a view from its query string (e.g. "severity=HIGH&page=2")
    #[arg(long)]
    pub query: Option<String>,
    /// Read a saved server response instead of calling the server
    #[arg(long)]
    pub file: Option<String>,
    /// Output format: text or json
    #[arg(long, default_value = "text")]
    pub format: String,
    /// Write output to file instead of stdout
    #[arg(long)]
    pub output: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct FindingFilterArgs {
    /// Only show these severities (repeatable)
    #[arg(long = "severity")]
    pub severities: Vec<String>,
    /// Package name substring
    #[arg(long)]
    pub pkg_name: Option<String>,
    /// Vulnerability ID substring
    #[arg(long)]
    pub vuln_id: Option<String>,
    /// Flip one severity checkbox (repeatable)
    #[arg(long = "toggle-severity")]
    pub toggles: Vec<String>,
    /// Flip the "All" checkbox: select every severity, or none if all are selected
    #[arg(long)]
    pub all_severities: bool,
    /// Show exactly one severity (overrides the others)
    #[arg(long)]
    pub focus: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Report ids to delete
    #[arg(required_unless_present = "page")]
    pub ids: Vec<String>,
    /// Select every report on this page of the list
    #[arg(long)]
    pub page: Option<usize>,
    /// Artifact name substring, applied before --page picks its rows
    #[arg(long, requires = "page")]
    pub artifact: Option<String>,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
    /// Output format: text or json
    #[arg(long, default_value = "text")]
    pub format: String,
    /// Write output to file instead of stdout
    #[arg(long)]
    pub output: Option<String>,
}

/// Print the stored report list.
pub fn list_reports<T: ReportTransport + ?Sized>(
    transport: &T,
    artifact: Option<&str>,
    paging: &PagingArgs,
    default_page_size: usize,
) -> Result<()> {
    let params = ViewParams::parse(paging.query.as_deref().unwrap_or_default());
    let mut view = ListView::from_params(&params, default_page_size);

    if let Some(field) = &paging.sort_field {
        let field = SummarySortField::parse(field)
            .with_context(|| format!("Unknown sort field for reports: {}", field))?;
        view.set_sort(field, parse_direction(paging.sort_dir.as_deref())?);
    } else if let Some(dir) = &paging.sort_dir {
        view.set_sort(view.sort_state().field, parse_direction(Some(dir))?);
    }
    if let Some(field) = &paging.sort_by {
        let field = SummarySortField::parse(field)
            .with_context(|| format!("Unknown sort field for reports: {}", field))?;
        view.sort_by(field);
    }
    if let Some(needle) = artifact {
        view.set_artifact_filter(needle);
    }
    if let Some(size) = paging.page_size {
        view.set_page_size(check_page_size(size)?);
    }

    match &paging.file {
        Some(path) => {
            let ticket = view.begin_load();
            view.apply_load(ticket, Ok(read_saved_response(path)?));
        }
        None => view.load(transport)?,
    }
    if let Some(page) = paging.page.or(params.page) {
        view.go_to_page(page);
    }
    if paging.next {
        view.next_page();
    } else if paging.prev {
        view.previous_page();
    }

    let snapshot = view
        .snapshot()
        .context("Report list did not finish loading")?;
    view.unmount();
    match paging.format.as_str() {
        "json" => output::output_json(&snapshot, paging.output.as_deref()),
        _ => with_text_output(paging.output.as_deref(), |out| {
            output::output_list(out, &snapshot)
        }),
    }
}

/// Print one report's findings.
pub fn show_report<T: ReportTransport + ?Sized>(
    transport: &T,
    id: &str,
    filters: &FindingFilterArgs,
    paging: &PagingArgs,
    default_page_size: usize,
) -> Result<()> {
    let params = ViewParams::parse(paging.query.as_deref().unwrap_or_default());
    let mut view = DetailView::from_params(id, &params, default_page_size);

    if !filters.severities.is_empty() {
        let severities = filters
            .severities
            .iter()
            .map(String::as_str)
            .map(parse_severity)
            .collect::<Result<_>>()?;
        view.set_severities(severities);
    }
    if filters.all_severities {
        view.toggle_all_severities();
    }
    for label in &filters.toggles {
        view.toggle_severity(parse_severity(label)?);
    }
    if let Some(focus) = &filters.focus {
        view.focus_severity(parse_severity(focus)?);
    }
    if let Some(pkg) = &filters.pkg_name {
        view.set_package_filter(pkg);
    }
    if let Some(vuln) = &filters.vuln_id {
        view.set_id_filter(vuln);
    }
    if let Some(field) = &paging.sort_field {
        let field = RecordSortField::parse(field)
            .with_context(|| format!("Unknown sort field for findings: {}", field))?;
        view.set_sort(field, parse_direction(paging.sort_dir.as_deref())?);
    } else if let Some(dir) = &paging.sort_dir {
        view.set_sort(view.sort_state().field, parse_direction(Some(dir))?);
    }
    if let Some(field) = &paging.sort_by {
        let field = RecordSortField::parse(field)
            .with_context(|| format!("Unknown sort field for findings: {}", field))?;
        view.sort_by(field);
    }
    if let Some(size) = paging.page_size {
        view.set_page_size(check_page_size(size)?);
    }

    match &paging.file {
        Some(path) => {
            let ticket = view.begin_load();
            view.apply_load(ticket, Ok(read_saved_response(path)?));
            if let Some(err) = view.error() {
                return Err(err.clone().into());
            }
        }
        None => view.load(transport)?,
    }
    if let Some(page) = paging.page.or(params.page) {
        view.go_to_page(page);
    }
    if paging.next {
        view.next_page();
    } else if paging.prev {
        view.previous_page();
    }

    let snapshot = view.snapshot().context("Report did not finish loading")?;
    view.unmount();
    match paging.format.as_str() {
        "json" => output::output_json(&snapshot, paging.output.as_deref()),
        _ => with_text_output(paging.output.as_deref(), |out| {
            output::output_detail(out, &snapshot)
        }),
    }
}

/// Select reports in a fresh list session and bulk-delete them. `--page`
/// selects a whole page the way the header checkbox does; ids add to that.
pub fn delete_reports<T: ReportTransport + ?Sized>(
    transport: &T,
    args: &DeleteArgs,
    page_size: usize,
) -> Result<()> {
    let mut view = ListView::new(page_size);
    if let Some(needle) = &args.artifact {
        view.set_artifact_filter(needle);
    }
    view.load(transport)?;

    if let Some(page) = args.page {
        view.go_to_page(page);
        view.toggle_all_on_page();
        ensure!(
            !view.selection().is_empty(),
            "Page {} of the report list is empty",
            page
        );
    }
    for id in &args.ids {
        if !view.contains(id) {
            bail!("Report {} not found", id);
        }
        if !view.selection().is_selected(id) {
            view.toggle_selected(id);
        }
    }

    let outcome = view.delete_selected(transport, |selected| {
        args.yes || confirm_delete(selected.len())
    })?;
    info!(?outcome, "delete command finished");
    view.unmount();

    let output_file = args.output.as_deref();
    match args.format.as_str() {
        "json" => output::output_json(&outcome, output_file),
        _ => with_text_output(output_file, |out| output::output_delete(out, &outcome)),
    }
}

fn parse_direction(dir: Option<&str>) -> Result<SortDirection> {
    match dir {
        None => Ok(SortDirection::Asc),
        Some(d) => {
            SortDirection::parse(d).with_context(|| format!("Unknown sort direction: {}", d))
        }
    }
}

fn parse_severity(label: &str) -> Result<Severity> {
    Severity::parse(label).with_context(|| format!("Unknown severity: {}", label))
}

fn check_page_size(size: usize) -> Result<usize> {
    ensure!(
        PAGE_SIZE_OPTIONS.contains(&size),
        "Page size must be one of {:?}, got {}",
        PAGE_SIZE_OPTIONS,
        size
    );
    Ok(size)
}

fn read_saved_response(path: &str) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read saved response: {}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse saved response: {}", path))
}

fn confirm_delete(count: usize) -> bool {
    print!("Delete {} report(s)? [y/N] ", count);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Colored text on stdout, or plain text into `output_file`.
pub(crate) fn with_text_output(
    output_file: Option<&str>,
    render: impl FnOnce(&mut dyn WriteColor) -> Result<()>,
) -> Result<()> {
    match output_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            let mut out = NoColor::new(file);
            render(&mut out)?;
            println!("Wrote output to {}", path);
        }
        None => {
            let mut out = StandardStream::stdout(ColorChoice::Auto);
            render(&mut out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeTransport;
    use serde_json::json;
    use std::io::Write as _;

    fn list_doc() -> Value {
        json!([
            {"_meta": {"id": "a1", "uploaded_at": "2024-02-01T00:00:00Z"}, "ArtifactName": "debian:12",
             "Results": [{"Target": "debian", "Vulnerabilities": [{"VulnerabilityID": "CVE-1", "PkgName": "x", "Severity": "HIGH"}]}]},
            {"id": "b2", "artifact": "ubuntu:22.04", "critical": 3, "high": 0, "medium": 0, "low": 0}
        ])
    }

    #[test]
    fn test_list_from_saved_file_to_json() {
        let mut saved = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        saved.write_all(list_doc().to_string().as_bytes()).unwrap();
        let out = tempfile::Builder::new().suffix(".json").tempfile().unwrap();

        let paging = PagingArgs {
            file: Some(saved.path().to_string_lossy().to_string()),
            format: "json".to_string(),
            output: Some(out.path().to_string_lossy().to_string()),
            sort_field: Some("artifact".to_string()),
            ..PagingArgs::default()
        };
        let transport = FakeTransport::default();
        list_reports(&transport, None, &paging, 10).unwrap();
        assert_eq!(transport.list_calls.get(), 0);

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
        assert_eq!(written["reports"]["items"][0]["id"], "a1");
        assert_eq!(written["reports"]["items"][0]["high"], 1);
        assert_eq!(written["totals"]["critical"], 3);
    }

    #[test]
    fn test_show_writes_plain_text() {
        let mut transport = FakeTransport::default();
        transport.reports.insert(
            "a1".to_string(),
            json!({"ArtifactName": "debian:12", "Results": [{"Target": "debian", "Vulnerabilities": [
                {"VulnerabilityID": "CVE-2024-1", "PkgName": "zlib", "Severity": "LOW"},
                {"VulnerabilityID": "CVE-2024-2", "PkgName": "curl", "Severity": "HIGH"}
            ]}]}),
        );
        let out = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let filters = FindingFilterArgs {
            severities: vec!["high".to_string()],
            ..FindingFilterArgs::default()
        };
        let paging = PagingArgs {
            format: "text".to_string(),
            output: Some(out.path().to_string_lossy().to_string()),
            ..PagingArgs::default()
        };
        show_report(&transport, "a1", &filters, &paging, 10).unwrap();

        let text = std::fs::read_to_string(out.path()).unwrap();
        assert!(text.contains("CVE-2024-2"));
        assert!(!text.contains("CVE-2024-1  zlib"));
        assert!(text.contains("LOW: 1"));
        assert!(text.contains("severity=HIGH"));
    }

    #[test]
    fn test_show_focus_overrides_severities() {
        let mut transport = FakeTransport::default();
        transport.reports.insert(
            "a1".to_string(),
            json!({"Results": [{"Target": "t", "Vulnerabilities": [
                {"VulnerabilityID": "CVE-2024-1", "PkgName": "zlib", "Severity": "LOW"},
                {"VulnerabilityID": "CVE-2024-2", "PkgName": "curl", "Severity": "HIGH"}
            ]}]}),
        );
        let out = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let filters = FindingFilterArgs {
            severities: vec!["HIGH".to_string()],
            focus: Some("low".to_string()),
            ..FindingFilterArgs::default()
        };
        let paging = PagingArgs {
            format: "json".to_string(),
            output: out.path().to_str().map(String::from),
            ..PagingArgs::default()
        };
        show_report(&transport, "a1", &filters, &paging, 10).unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
        assert_eq!(written["findings"]["totalItems"], 1);
        assert_eq!(written["findings"]["items"][0]["vulnerabilityId"], "CVE-2024-1");
        assert_eq!(written["artifactName"], "unknown");
    }

    #[test]
    fn test_show_missing_report() {
        let transport = FakeTransport::default();
        let paging = PagingArgs {
            format: "text".to_string(),
            ..PagingArgs::default()
        };
        let err = show_report(&transport, "nope", &FindingFilterArgs::default(), &paging, 10)
            .unwrap_err();
        assert_eq!(err.to_string(), "Report nope not found");
    }

    #[test]
    fn test_show_rejects_unknown_severity() {
        let transport = FakeTransport::default();
        let filters = FindingFilterArgs {
            severities: vec!["urgent".to_string()],
            ..FindingFilterArgs::default()
        };
        let err = show_report(&transport, "a1", &filters, &PagingArgs::default(), 10).unwrap_err();
        assert!(err.to_string().contains("Unknown severity"));
        assert_eq!(transport.report_calls.get(), 0);
    }

    fn findings_doc() -> Value {
        let vulns: Vec<Value> = (0..30)
            .map(|i| {
                let severity = ["CRITICAL", "HIGH", "MEDIUM"][i % 3];
                json!({
                    "VulnerabilityID": format!("CVE-2024-{i:04}"),
                    "PkgName": format!("pkg{i:02}"),
                    "Severity": severity
                })
            })
            .collect();
        json!({"ArtifactName": "app:1", "Results": [{"Target": "t", "Vulnerabilities": vulns}]})
    }

    fn show_json(filters: &FindingFilterArgs, paging: PagingArgs) -> Value {
        let mut transport = FakeTransport::default();
        transport.reports.insert("a1".to_string(), findings_doc());
        let out = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let paging = PagingArgs {
            format: "json".to_string(),
            output: out.path().to_str().map(String::from),
            ..paging
        };
        show_report(&transport, "a1", filters, &paging, 10).unwrap();
        serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap()
    }

    fn delete_args(ids: &[&str]) -> DeleteArgs {
        DeleteArgs {
            ids: ids.iter().map(|id| id.to_string()).collect(),
            yes: true,
            format: "json".to_string(),
            ..DeleteArgs::default()
        }
    }

    #[test]
    fn test_show_all_severities_clears_then_toggle_adds_one() {
        let filters = FindingFilterArgs {
            all_severities: true,
            toggles: vec!["medium".to_string()],
            ..FindingFilterArgs::default()
        };
        let written = show_json(&filters, PagingArgs::default());
        assert_eq!(written["findings"]["totalItems"], 10);
        assert_eq!(written["findings"]["items"][0]["severity"], "MEDIUM");
        assert_eq!(written["summary"]["total"], 30);
        assert!(written["query"].as_str().unwrap().starts_with("severity=MEDIUM&"));
    }

    #[test]
    fn test_show_sort_by_flips_restored_column() {
        let paging = PagingArgs {
            query: Some("sortField=package&sortDir=asc".to_string()),
            sort_by: Some("pkg".to_string()),
            ..PagingArgs::default()
        };
        let written = show_json(&FindingFilterArgs::default(), paging);
        assert_eq!(written["findings"]["items"][0]["packageName"], "pkg29");
        assert!(written["query"].as_str().unwrap().ends_with("sortField=package&sortDir=desc"));
    }

    #[test]
    fn test_show_next_and_prev_stay_in_range() {
        let paging = PagingArgs {
            query: Some("page=2".to_string()),
            next: true,
            ..PagingArgs::default()
        };
        let written = show_json(&FindingFilterArgs::default(), paging);
        assert_eq!(written["findings"]["page"], 3);

        let paging = PagingArgs {
            query: Some("page=3".to_string()),
            next: true,
            ..PagingArgs::default()
        };
        let written = show_json(&FindingFilterArgs::default(), paging);
        assert_eq!(written["findings"]["page"], 3);

        let paging = PagingArgs {
            prev: true,
            ..PagingArgs::default()
        };
        let written = show_json(&FindingFilterArgs::default(), paging);
        assert_eq!(written["findings"]["page"], 1);
    }

    #[test]
    fn test_page_size_must_be_an_offered_option() {
        let transport = FakeTransport::with_list(list_doc());
        let paging = PagingArgs {
            page_size: Some(7),
            ..PagingArgs::default()
        };
        let err = list_reports(&transport, None, &paging, 10).unwrap_err();
        assert!(err.to_string().contains("Page size must be one of"));
        assert_eq!(transport.list_calls.get(), 0);

        let written = show_json(
            &FindingFilterArgs::default(),
            PagingArgs {
                page_size: Some(25),
                ..PagingArgs::default()
            },
        );
        assert_eq!(written["findings"]["totalPages"], 2);
    }

    #[test]
    fn test_delete_unknown_id_sends_nothing() {
        let transport = FakeTransport::with_list(list_doc());
        let err = delete_reports(&transport, &delete_args(&["zzz"]), 10).unwrap_err();
        assert!(err.to_string().contains("zzz"));
        assert!(transport.delete_calls.borrow().is_empty());
    }

    #[test]
    fn test_delete_with_yes() {
        let transport = FakeTransport::with_list(list_doc());
        let out = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let args = DeleteArgs {
            output: out.path().to_str().map(String::from),
            ..delete_args(&["b2", "a1", "b2"])
        };
        delete_reports(&transport, &args, 10).unwrap();
        assert_eq!(
            transport.delete_calls.borrow().as_slice(),
            &[vec!["a1".to_string(), "b2".to_string()]]
        );
    }

    #[test]
    fn test_delete_whole_page() {
        let reports: Vec<Value> = (0..12)
            .map(|i| {
                json!({
                    "id": format!("r{i:02}"),
                    "artifact": if i < 11 { "nginx" } else { "redis" },
                    "uploadedAt": format!("2024-05-{:02}T10:00:00Z", i + 1),
                    "critical": 0
                })
            })
            .collect();
        let transport = FakeTransport::with_list(json!(reports));
        let args = DeleteArgs {
            page: Some(2),
            ..delete_args(&[])
        };
        delete_reports(&transport, &args, 10).unwrap();
        assert_eq!(
            transport.delete_calls.borrow().as_slice(),
            &[vec!["r00".to_string(), "r01".to_string()]]
        );

        let transport = FakeTransport::with_list(json!(reports));
        let args = DeleteArgs {
            page: Some(1),
            artifact: Some("redis".to_string()),
            ..delete_args(&["r00"])
        };
        delete_reports(&transport, &args, 10).unwrap();
        assert_eq!(
            transport.delete_calls.borrow().as_slice(),
            &[vec!["r00".to_string(), "r11".to_string()]]
        );
    }

    #[test]
    fn test_delete_empty_page_sends_nothing() {
        let transport = FakeTransport::with_list(json!([]));
        let args = DeleteArgs {
            page: Some(1),
            ..delete_args(&[])
        };
        let err = delete_reports(&transport, &args, 10).unwrap_err();
        assert!(err.to_string().contains("empty"));
        assert!(transport.delete_calls.borrow().is_empty());
    }
}
