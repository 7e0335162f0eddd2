//! Pre-flight checks for an upload, as an explicit state machine:
//!
//! ```text
//! Idle --select_file--> Idle (candidate stored, or rejected and discarded)
//! Idle --submit--> Validating --json ok--> Uploading --id--> Idle(Succeeded)
//!                      |                       \--no id / failure--> Idle(Failed)
//!                      \--bad json--> Idle(Failed), no request issued
//! ```
//!
//! Nothing retries on its own; every failure waits for a new submission.

use tracing::{debug, info, warn};

use super::models::{IdleStatus, MAX_UPLOAD_BYTES, UploadCandidate, UploadReceipt, UploadState};
use crate::client::ReportTransport;
use crate::client::models::UploadResponse;
use crate::error::{TransportError, ValidationError, ViewError};
use crate::events::{RefreshBus, RefreshEvent};

pub struct UploadValidator {
    state: UploadState,
    candidate: Option<UploadCandidate>,
    bus: RefreshBus,
}

impl UploadValidator {
    /// `bus` is told about every successful upload.
    pub fn new(bus: RefreshBus) -> Self {
        Self {
            state: UploadState::Idle(IdleStatus::Ready),
            candidate: None,
            bus,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn candidate(&self) -> Option<&UploadCandidate> {
        self.candidate.as_ref()
    }

    /// Store a candidate, or reject and discard it. Stays idle either way.
    pub fn select_file(&mut self, candidate: UploadCandidate) -> Result<(), ValidationError> {
        if self.state.is_busy() {
            return Err(ValidationError::UploadInProgress);
        }

        if let Err(err) = check_candidate(&candidate) {
            warn!(file = %candidate.filename, "rejected upload candidate: {}", err);
            self.candidate = None;
            self.state = UploadState::Idle(IdleStatus::Failed {
                message: err.to_string(),
            });
            return Err(err);
        }

        debug!(
            file = %candidate.filename,
            bytes = candidate.size_bytes,
            "upload candidate selected"
        );
        self.candidate = Some(candidate);
        self.state = UploadState::Idle(IdleStatus::Ready);
        Ok(())
    }

    /// Validate the stored candidate and send it through `transport`.
    pub fn submit<T: ReportTransport + ?Sized>(
        &mut self,
        transport: &T,
    ) -> Result<UploadReceipt, ViewError> {
        let candidate = self.begin_submit()?;
        let result = transport.upload_report(candidate);
        self.finish_upload(result)
    }

    /// Idle -> Validating -> Uploading. Returns the candidate to send.
    fn begin_submit(&mut self) -> Result<&UploadCandidate, ViewError> {
        if self.state.is_busy() {
            return Err(ValidationError::UploadInProgress.into());
        }
        let Some(candidate) = self.candidate.as_ref() else {
            return Err(ValidationError::NoFileSelected.into());
        };

        self.state = UploadState::Validating;
        debug!(file = %candidate.filename, "upload: validating");

        if candidate.is_json_family()
            && let Err(e) = serde_json::from_slice::<serde::de::IgnoredAny>(&candidate.content)
        {
            let err = ValidationError::InvalidJson {
                reason: e.to_string(),
            };
            warn!(file = %candidate.filename, "upload aborted: {}", err);
            self.state = UploadState::Idle(IdleStatus::Failed {
                message: err.to_string(),
            });
            return Err(err.into());
        }

        self.state = UploadState::Uploading;
        debug!(file = %candidate.filename, "upload: sending");
        Ok(candidate)
    }

    /// Uploading -> Idle, with the transport's verdict.
    fn finish_upload(
        &mut self,
        result: Result<UploadResponse, TransportError>,
    ) -> Result<UploadReceipt, ViewError> {
        let outcome = result.and_then(|response| match response.id {
            Some(id) if !id.trim().is_empty() => Ok((id, response.artifact)),
            _ => Err(TransportError::MissingId),
        });

        match outcome {
            Ok((id, artifact)) => {
                let filename = self
                    .candidate
                    .take()
                    .map(|c| c.filename)
                    .unwrap_or_default();
                info!(%id, file = %filename, "upload succeeded");
                self.state = UploadState::Idle(IdleStatus::Succeeded { id: id.clone() });
                self.bus.publish(RefreshEvent::ReportsChanged);
                Ok(UploadReceipt {
                    id,
                    artifact,
                    filename,
                })
            }
            Err(err) => {
                warn!("upload failed: {}", err);
                self.state = UploadState::Idle(IdleStatus::Failed {
                    message: err.to_string(),
                });
                Err(ViewError::Transport(err))
            }
        }
    }
}

fn check_candidate(candidate: &UploadCandidate) -> Result<(), ValidationError> {
    if !candidate.has_allowed_extension() {
        return Err(ValidationError::UnsupportedExtension {
            filename: candidate.filename.clone(),
        });
    }
    if !candidate.has_allowed_mime_type() {
        return Err(ValidationError::UnsupportedMimeType {
            mime: candidate.declared_mime_type.clone(),
        });
    }
    if candidate.size_bytes > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size: candidate.size_bytes,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}
