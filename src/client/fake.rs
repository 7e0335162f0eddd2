use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::ReportTransport;
use super::models::{DeleteResponse, UploadResponse};
use crate::error::TransportError;
use crate::upload::models::UploadCandidate;

/// In-memory server stand-in that counts every call.
pub struct FakeTransport {
    pub list: RefCell<Result<Value, TransportError>>,
    pub reports: HashMap<String, Value>,
    pub upload: RefCell<Result<UploadResponse, TransportError>>,
    pub delete: RefCell<Result<DeleteResponse, TransportError>>,
    pub list_calls: Cell<usize>,
    pub report_calls: Cell<usize>,
    pub upload_calls: Cell<usize>,
    pub delete_calls: RefCell<Vec<Vec<String>>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            list: RefCell::new(Ok(Value::Array(Vec::new()))),
            reports: HashMap::new(),
            upload: RefCell::new(Ok(UploadResponse {
                id: Some("new-id".to_string()),
                artifact: None,
            })),
            delete: RefCell::new(Ok(DeleteResponse::default())),
            list_calls: Cell::new(0),
            report_calls: Cell::new(0),
            upload_calls: Cell::new(0),
            delete_calls: RefCell::new(Vec::new()),
        }
    }
}

impl FakeTransport {
    pub fn with_list(list: Value) -> Self {
        Self {
            list: RefCell::new(Ok(list)),
            ..Self::default()
        }
    }
}

impl ReportTransport for FakeTransport {
    fn fetch_reports(&self) -> Result<Value, TransportError> {
        self.list_calls.set(self.list_calls.get() + 1);
        self.list.borrow().clone()
    }

    fn fetch_report(&self, id: &str) -> Result<Value, TransportError> {
        self.report_calls.set(self.report_calls.get() + 1);
        self.reports
            .get(id)
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                resource: id.to_string(),
            })
    }

    fn upload_report(
        &self,
        _candidate: &UploadCandidate,
    ) -> Result<UploadResponse, TransportError> {
        self.upload_calls.set(self.upload_calls.get() + 1);
        self.upload.borrow().clone()
    }

    fn delete_reports(&self, ids: &[String]) -> Result<DeleteResponse, TransportError> {
        self.delete_calls.borrow_mut().push(ids.to_vec());
        self.delete.borrow().clone()
    }
}
