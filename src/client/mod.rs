#[cfg(test)]
pub(crate) mod fake;
mod http;
pub mod models;

use serde_json::Value;

use crate::error::TransportError;
use crate::upload::models::UploadCandidate;

pub use http::HttpTransport;
use models::{DeleteResponse, UploadResponse};

/// The report server, as seen by the views.
pub trait ReportTransport {
    /// `GET /reports`, undecoded: the list normalizer owns the shape.
    fn fetch_reports(&self) -> Result<Value, TransportError>;

    /// `GET /report/{id}`. A missing report is [`TransportError::NotFound`].
    fn fetch_report(&self, id: &str) -> Result<Value, TransportError>;

    /// `POST /upload-report` with the candidate as a multipart file.
    fn upload_report(&self, candidate: &UploadCandidate) -> Result<UploadResponse, TransportError>;

    /// `DELETE /reports` with `{report_ids: [...]}`.
    fn delete_reports(&self, ids: &[String]) -> Result<DeleteResponse, TransportError>;
}

/// Identifies one issued request of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Whether a response was applied or dropped as superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Fresh,
    Stale,
}

/// Orders the requests of a single view so that only the newest response
/// is ever applied, and nothing is applied after the view goes away.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
    floor: u64,
}

impl RequestSequencer {
    pub fn begin(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest && ticket.0 > self.floor
    }

    /// Make every outstanding ticket stale.
    pub fn invalidate(&mut self) {
        self.floor = self.latest;
    }
}
