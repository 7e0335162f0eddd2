use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &[".json", ".spdx.json", ".cdx.json", ".tar"];

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/json",
    "application/x-tar",
    "application/vnd.cyclonedx+json",
    "application/spdx+json",
];

/// A file the user picked, held only while it is validated and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadCandidate {
    pub filename: String,
    /// Empty when the picker did not report a type.
    pub declared_mime_type: String,
    pub size_bytes: u64,
    pub content: Vec<u8>,
}

impl UploadCandidate {
    pub fn new(filename: &str, declared_mime_type: &str, content: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            declared_mime_type: declared_mime_type.trim().to_string(),
            size_bytes: content.len() as u64,
            content,
        }
    }

    /// Read a candidate from disk. Oversized files are not read at all;
    /// their size alone gets them rejected.
    pub fn from_path(path: &Path, declared_mime_type: &str) -> Result<Self> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to stat upload file: {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let content = if metadata.len() > MAX_UPLOAD_BYTES {
            Vec::new()
        } else {
            fs::read(path)
                .with_context(|| format!("Failed to read upload file: {}", path.display()))?
        };

        Ok(Self {
            filename,
            declared_mime_type: declared_mime_type.trim().to_string(),
            size_bytes: metadata.len(),
            content,
        })
    }

    pub fn has_allowed_extension(&self) -> bool {
        let name = self.filename.to_lowercase();
        ALLOWED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    }

    pub fn has_allowed_mime_type(&self) -> bool {
        self.declared_mime_type.is_empty()
            || ALLOWED_MIME_TYPES.contains(&self.declared_mime_type.to_lowercase().as_str())
    }

    /// `.json`, `.spdx.json` and `.cdx.json` payloads must parse before sending.
    pub fn is_json_family(&self) -> bool {
        self.filename.to_lowercase().ends_with(".json")
    }
}

/// Why the machine is idle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IdleStatus {
    #[default]
    Ready,
    Succeeded {
        id: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle(IdleStatus),
    Validating,
    Uploading,
}

impl UploadState {
    pub fn is_busy(&self) -> bool {
        matches!(self, UploadState::Validating | UploadState::Uploading)
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadState::Idle(IdleStatus::Ready) => write!(f, "idle"),
            UploadState::Idle(IdleStatus::Succeeded { id }) => write!(f, "idle (uploaded {})", id),
            UploadState::Idle(IdleStatus::Failed { message }) => {
                write!(f, "idle (error: {})", message)
            }
            UploadState::Validating => write!(f, "validating"),
            UploadState::Uploading => write!(f, "uploading"),
        }
    }
}

/// What a successful upload hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub filename: String,
}
