use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::ReportTransport;
use super::models::{DeleteRequest, DeleteResponse, UploadResponse};
use crate::error::TransportError;
use crate::upload::models::UploadCandidate;

const USER_AGENT: &str = concat!("scanview/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client for the report server.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(server_url)
            .with_context(|| format!("Invalid server URL: {}", server_url))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Network {
                message: format!("server URL cannot carry a path: {}", self.base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl ReportTransport for HttpTransport {
    fn fetch_reports(&self) -> Result<Value, TransportError> {
        let url = self.endpoint(&["reports"])?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().map_err(network)?;
        decode(ensure_success(response)?)
    }

    fn fetch_report(&self, id: &str) -> Result<Value, TransportError> {
        let url = self.endpoint(&["report", id])?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().map_err(network)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound {
                resource: id.to_string(),
            });
        }
        decode(ensure_success(response)?)
    }

    fn upload_report(&self, candidate: &UploadCandidate) -> Result<UploadResponse, TransportError> {
        let url = self.endpoint(&["upload-report"])?;
        let mut part = multipart::Part::bytes(candidate.content.clone())
            .file_name(candidate.filename.clone());
        if !candidate.declared_mime_type.is_empty() {
            part = part
                .mime_str(&candidate.declared_mime_type)
                .map_err(|e| TransportError::Network {
                    message: e.to_string(),
                })?;
        }
        let form = multipart::Form::new().part("file", part);

        info!(%url, file = %candidate.filename, bytes = candidate.size_bytes, "uploading report");
        let response = self.client.post(url).multipart(form).send().map_err(network)?;
        decode(ensure_success(response)?)
    }

    fn delete_reports(&self, ids: &[String]) -> Result<DeleteResponse, TransportError> {
        let url = self.endpoint(&["reports"])?;
        info!(%url, count = ids.len(), "deleting reports");
        let response = self
            .client
            .delete(url)
            .json(&DeleteRequest { report_ids: ids })
            .send()
            .map_err(network)?;
        decode(ensure_success(response)?)
    }
}

fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network {
        message: err.to_string(),
    }
}

/// Any non-2xx becomes a status error carrying the server's own message.
fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body: if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        } else {
            body
        },
    })
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    response.json().map_err(|e| TransportError::Decode {
        message: e.to_string(),
    })
}
