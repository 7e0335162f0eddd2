use chrono::{DateTime, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

const CVE_ADVISORY_BASE: &str = "https://cve.mitre.org/cgi-bin/cvename.cgi?name=";
const DISPLAY_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

lazy_static! {
    static ref CVE_ID: Regex = Regex::new(r"^CVE-\d{4}-\d{4,}$").unwrap();
}

/// Advisory link for CVE identifiers; other identifiers have none.
pub fn advisory_url(vulnerability_id: &str) -> Option<String> {
    let id = vulnerability_id.trim();
    if CVE_ID.is_match(id) {
        Some(format!("{}{}", CVE_ADVISORY_BASE, id))
    } else {
        None
    }
}

/// Render an upload time as `dd-mm-YYYY HH:MM:SS`, in the offset it was
/// recorded with. Unparsable input is shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DISPLAY_FORMAT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(DISPLAY_FORMAT).to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_url_for_cve() {
        assert_eq!(
            advisory_url("CVE-2023-44487").as_deref(),
            Some("https://cve.mitre.org/cgi-bin/cvename.cgi?name=CVE-2023-44487")
        );
    }

    #[test]
    fn test_advisory_url_other_ids() {
        assert_eq!(advisory_url("GHSA-xxxx-yyyy-zzzz"), None);
        assert_eq!(advisory_url("cve-2023-1"), None);
        assert_eq!(advisory_url(""), None);
    }

    #[test]
    fn test_format_rfc3339() {
        assert_eq!(format_timestamp("2024-03-05T14:07:09Z"), "05-03-2024 14:07:09");
        assert_eq!(
            format_timestamp("2024-03-05T14:07:09.123+02:00"),
            "05-03-2024 14:07:09"
        );
    }

    #[test]
    fn test_format_naive() {
        assert_eq!(format_timestamp("2024-12-31T23:59:59.5"), "31-12-2024 23:59:59");
        assert_eq!(format_timestamp("2024-12-31 08:00:00"), "31-12-2024 08:00:00");
    }

    #[test]
    fn test_format_fallback() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp(""), "");
    }
}
