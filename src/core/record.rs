use serde_json::{Map, Value};

/// One API record with nested objects collapsed into dot-separated keys,
/// e.g. `{"stats": {"dedupeRatio": 2.0}}` becomes `stats.dedupeRatio`.
/// Arrays are leaves and keep their JSON value.
pub type FlatRecord = Map<String, Value>;

pub fn flatten(value: &Value) -> FlatRecord {
    let mut out = Map::new();
    if let Value::Object(map) = value {
        flatten_into(&mut out, None, map);
    }
    out
}

fn flatten_into(out: &mut FlatRecord, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&path), inner),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

/// Reads a numeric cell. Strings holding a number count too, anything else is `None`.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Renders a cell for category keys and sheet text.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_become_dot_paths_in_source_order() {
        let rec = flatten(&json!({
            "name": "vm-01",
            "stats": {"dedupeRatio": 2.5, "bytes": {"post": 10}},
            "tags": ["a", "b"],
            "host": null
        }));
        let keys: Vec<&str> = rec.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["name", "stats.dedupeRatio", "stats.bytes.post", "tags", "host"]
        );
        assert_eq!(rec["tags"], json!(["a", "b"]));
        assert_eq!(rec["host"], Value::Null);
    }

    #[test]
    fn non_object_record_flattens_to_nothing() {
        assert!(flatten(&json!(42)).is_empty());
        assert!(flatten(&json!({"empty": {}})).contains_key("empty"));
    }

    #[test]
    fn numbers_parse_from_strings_but_not_from_garbage() {
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(as_number(&json!("1024.5")), Some(1024.5));
        assert_eq!(as_number(&json!("n/a")), None);
        assert_eq!(as_number(&json!(null)), None);
        assert_eq!(as_number(&json!(true)), None);
    }
}
