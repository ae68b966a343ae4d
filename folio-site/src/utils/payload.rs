//! Helpers for form-shaped payloads: every value may arrive as a string.

use folio_core::FolioError;
use serde_json::{Map, Value};

/// `null`, or a string with nothing but whitespace.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Write `value` at a dotted `path`, creating intermediate objects.
pub fn set_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(inner) = slot {
                set_path(inner, rest, value);
            }
        }
    }
}

/// A field that holds JSON: multipart sends it as text, JSON bodies inline.
pub fn parse_json_field(field: &str, value: Value) -> Result<Value, FolioError> {
    match value {
        Value::String(raw) => serde_json::from_str(&raw).map_err(|e| {
            FolioError::bad_request(format!("Field {field} must be valid JSON"))
                .with_field_error(field, e.to_string())
        }),
        other => Ok(other),
    }
}

/// Position input: absent, an integer, or an integer in a string.
///
/// Blank means absent. Fractions, words and negative numbers are rejected.
pub fn parse_position(field: &str, value: Option<Value>) -> Result<Option<i64>, FolioError> {
    let invalid = || {
        FolioError::bad_request(format!("Invalid {field}: expected a non-negative integer"))
            .with_field_error(field, "must be a non-negative integer")
    };

    let position = match value {
        None => return Ok(None),
        Some(v) if is_blank(&v) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid)?,
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };

    if position < 0 {
        return Err(invalid());
    }
    Ok(Some(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positions_parse_from_numbers_and_strings() {
        assert_eq!(parse_position("position", None).unwrap(), None);
        assert_eq!(parse_position("position", Some(json!(""))).unwrap(), None);
        assert_eq!(parse_position("position", Some(json!(3))).unwrap(), Some(3));
        assert_eq!(parse_position("position", Some(json!(" 2 "))).unwrap(), Some(2));

        for bad in [json!(-1), json!("-4"), json!(1.5), json!("two"), json!([1]), json!(true)] {
            let err = parse_position("position", Some(bad)).unwrap_err();
            assert_eq!(err.code(), 400);
        }
    }

    #[test]
    fn dotted_paths_build_nested_objects() {
        let mut doc = Map::new();
        set_path(&mut doc, "socialLinks.facebook", json!("fb"));
        set_path(&mut doc, "socialLinks.twitter", json!("tw"));
        set_path(&mut doc, "title", json!("Dr"));

        assert_eq!(
            Value::Object(doc),
            json!({"socialLinks": {"facebook": "fb", "twitter": "tw"}, "title": "Dr"})
        );
    }

    #[test]
    fn json_fields_accept_text_or_inline_values() {
        assert_eq!(parse_json_field("features", json!("[1,2]")).unwrap(), json!([1, 2]));
        assert_eq!(parse_json_field("features", json!(["a"])).unwrap(), json!(["a"]));
        assert_eq!(parse_json_field("features", json!("[oops")).unwrap_err().code(), 400);
    }
}
