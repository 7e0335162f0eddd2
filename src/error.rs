//! Error taxonomy for the view sessions.

use thiserror::Error;

/// Pre-flight upload failures. Always raised before any network call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please select a file first")]
    NoFileSelected,

    #[error(
        "Invalid file type '{filename}'. Only .json, .spdx.json, .cdx.json, or .tar files are allowed"
    )]
    UnsupportedExtension { filename: String },

    #[error("Unsupported content type '{mime}'")]
    UnsupportedMimeType { mime: String },

    #[error("File too large ({size} bytes). Max allowed size is {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("invalid JSON content: {reason}")]
    InvalidJson { reason: String },

    #[error("An upload is already in progress")]
    UploadInProgress,
}

/// Failures of the HTTP collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Could not decode server response: {message}")]
    Decode { message: String },

    #[error("Upload succeeded but no ID returned")]
    MissingId,
}

/// Everything a view can surface to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Terminal for the current navigation; there is nothing to retry.
    #[error("Report {id} not found")]
    NotFound { id: String },

    #[error(transparent)]
    Transport(TransportError),

    #[error("Malformed data: {reason}")]
    MalformedData { reason: String },
}

impl ViewError {
    /// Whether an explicit user retry can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ViewError::Transport(_))
    }

    /// The one thing the user can do about this error.
    pub fn next_step(&self) -> &'static str {
        if self.is_retryable() {
            return "Run the same command again to retry.";
        }
        match self {
            ViewError::Validation(_) => "Choose a different file and upload again.",
            ViewError::NotFound { .. } => "Go back with `scanview list` and pick another report.",
            _ => "The server sent data this client does not understand.",
        }
    }
}

impl From<TransportError> for ViewError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotFound { resource } => ViewError::NotFound { id: resource },
            other => ViewError::Transport(other),
        }
    }
}
