use serde::Serialize;
use serde_json::Value;

/// A document fragment that did not match any known shape.
/// Recorded instead of failing so one bad entry never blocks the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeWarning {
    pub location: String,
    pub message: String,
}

impl ShapeWarning {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Resolve a dotted path (`_meta.id`) inside a JSON value.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// First candidate path holding a non-null value, in fallback order.
pub fn first_present<'a, 'p>(
    value: &'a Value,
    candidates: &[&'p str],
) -> Option<(&'p str, &'a Value)> {
    candidates.iter().find_map(|path| {
        lookup(value, path)
            .filter(|v| !v.is_null())
            .map(|v| (*path, v))
    })
}

/// First candidate path holding a string, in fallback order.
pub fn first_str<'a>(value: &'a Value, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|path| lookup(value, path).and_then(Value::as_str))
}

/// First candidate path holding a non-negative integer, in fallback order.
pub fn first_u64(value: &Value, candidates: &[&str]) -> Option<u64> {
    candidates
        .iter()
        .find_map(|path| lookup(value, path).and_then(Value::as_u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested() {
        let doc = json!({"_meta": {"id": "r1"}});
        assert_eq!(lookup(&doc, "_meta.id"), Some(&json!("r1")));
        assert_eq!(lookup(&doc, "_meta.missing"), None);
        assert_eq!(lookup(&json!([1, 2]), "_meta"), None);
    }

    #[test]
    fn test_first_str_respects_order() {
        let doc = json!({"artifact": "b", "ArtifactName": "a"});
        assert_eq!(first_str(&doc, &["ArtifactName", "artifact"]), Some("a"));
        assert_eq!(first_str(&doc, &["artifactName", "artifact"]), Some("b"));
    }

    #[test]
    fn test_first_str_skips_non_strings() {
        let doc = json!({"id": 42, "_meta": {"id": "r9"}});
        assert_eq!(first_str(&doc, &["id", "_meta.id"]), Some("r9"));
    }

    #[test]
    fn test_first_present_skips_null() {
        let doc = json!({"Results": null, "results": []});
        let (name, value) = first_present(&doc, &["Results", "results"]).unwrap();
        assert_eq!(name, "results");
        assert!(value.is_array());
    }
}
