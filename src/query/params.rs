//! Addressable view state, read from and written to a query string.
//!
//! Keys: `severity` (repeatable), `pkgName`, `vulnId`, `page`, `pageSize`,
//! `sortField`, `sortDir`.

use std::collections::BTreeSet;
use url::form_urlencoded;

use super::sort::SortDirection;
use crate::models::Severity;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    /// `None` when no `severity` key is present at all.
    pub severities: Option<BTreeSet<Severity>>,
    pub package: Option<String>,
    pub vuln_id: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort_field: Option<String>,
    pub sort_dir: Option<SortDirection>,
}

impl ViewParams {
    /// Parse a query string (leading `?` optional). Unusable values are
    /// ignored so a hand-edited URL never breaks the view.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = ViewParams::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "severity" => {
                    let set = params.severities.get_or_insert_with(BTreeSet::new);
                    if let Some(s) = Severity::parse(&value) {
                        set.insert(s);
                    }
                }
                "pkgName" => params.package = non_empty(&value),
                "vulnId" => params.vuln_id = non_empty(&value),
                "page" => params.page = value.parse().ok().filter(|p| *p >= 1),
                "pageSize" => params.page_size = value.parse().ok().filter(|s| *s > 0),
                "sortField" => params.sort_field = non_empty(&value),
                "sortDir" => params.sort_dir = SortDirection::parse(&value),
                _ => {}
            }
        }
        params
    }

    /// Serialize in a fixed key order. An explicitly empty severity set is
    /// written as `severity=` so it survives a reload as "match nothing".
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(severities) = &self.severities {
            if severities.is_empty() {
                out.append_pair("severity", "");
            }
            for s in severities {
                out.append_pair("severity", s.as_str());
            }
        }
        if let Some(pkg) = &self.package {
            out.append_pair("pkgName", pkg);
        }
        if let Some(id) = &self.vuln_id {
            out.append_pair("vulnId", id);
        }
        if let Some(page) = self.page {
            out.append_pair("page", &page.to_string());
        }
        if let Some(size) = self.page_size {
            out.append_pair("pageSize", &size.to_string());
        }
        if let Some(field) = &self.sort_field {
            out.append_pair("sortField", field);
        }
        if let Some(dir) = self.sort_dir {
            out.append_pair("sortDir", dir.as_str());
        }
        out.finish()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
