pub mod models;
mod validator;

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::client::ReportTransport;
use crate::events::RefreshBus;
use crate::views::list::ListView;
use crate::views::{self, output};
use models::UploadCandidate;
pub use validator::UploadValidator;

/// Validate and upload one report file. With `show_list`, the report list
/// is printed afterwards, refreshed through the bus.
pub fn upload_report<T: ReportTransport + ?Sized>(
    transport: &T,
    path: &Path,
    mime_type: &str,
    show_list: bool,
    page_size: usize,
    format: &str,
) -> Result<()> {
    let bus = RefreshBus::new();
    let mut list = ListView::new(page_size);
    if show_list {
        list.subscribe(&bus);
    }

    let mut machine = UploadValidator::new(bus);
    let candidate = UploadCandidate::from_path(path, mime_type)?;
    machine.select_file(candidate)?;
    if let Some(selected) = machine.candidate() {
        info!(
            file = %selected.filename,
            bytes = selected.size_bytes,
            json = selected.is_json_family(),
            "submitting upload"
        );
    }
    let receipt = machine.submit(transport)?;
    info!(id = %receipt.id, state = %machine.state(), "upload finished");

    match format {
        "json" => output::output_json(&receipt, None)?,
        _ => views::with_text_output(None, |out| output::output_upload(out, &receipt))?,
    }

    if list.poll_refresh(transport)?
        && let Some(snapshot) = list.snapshot()
    {
        match format {
            "json" => output::output_json(&snapshot, None)?,
            _ => views::with_text_output(None, |out| output::output_list(out, &snapshot))?,
        }
    }
    list.unmount();
    Ok(())
}
