use serde::{Deserialize, Serialize};

/// Body of a successful `POST /upload-report`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub artifact: Option<String>,
}

/// Body of `DELETE /reports`.
#[derive(Debug, Serialize)]
pub struct DeleteRequest<'a> {
    pub report_ids: &'a [String],
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub deleted: u64,
}
