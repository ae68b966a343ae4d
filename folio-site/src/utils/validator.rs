use std::collections::BTreeMap;

use folio_core::FolioError;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "email" => Some("must be a valid email"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        "url" => Some("must be a valid URL"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn collect(out: &mut BTreeMap<String, Vec<String>>, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        let key = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(str::to_string))
                        .unwrap_or_else(|| e.code.to_string());
                    out.entry(key.clone()).or_default().push(msg);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(out, &key, nested),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    collect(out, &format!("{key}[{idx}]"), nested);
                }
            }
        }
    }
}

/// Deserialize `data` into `T` and run its `validator` rules.
///
/// Failures are 400s carrying `{field: [messages]}`.
pub fn validate<T>(data: &Value, error_message: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data.clone()).map_err(|e| {
        FolioError::bad_request(error_message)
            .with_errors(json!({"_schema": [e.to_string()]}))
            .into_anyhow()
    })?;

    parsed.validate().map_err(|e| {
        let mut fields = BTreeMap::new();
        collect(&mut fields, "", &e);
        FolioError::bad_request(error_message)
            .with_errors(json!(fields))
            .into_anyhow()
    })?;

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Contact {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn field_errors_are_grouped_by_name() {
        let err = validate::<Contact>(&json!({"name": "", "email": "nope"}), "Invalid contact").unwrap_err();
        let folio = FolioError::from_anyhow(&err).unwrap();

        assert_eq!(folio.code(), 400);
        let errors = folio.errors.as_ref().unwrap();
        assert_eq!(errors["name"], json!(["name is required"]));
        assert_eq!(errors["email"], json!(["must be a valid email"]));
    }

    #[test]
    fn shape_errors_land_under_schema() {
        let err = validate::<Contact>(&json!({"name": 3}), "Invalid contact").unwrap_err();
        let folio = FolioError::from_anyhow(&err).unwrap();
        assert!(folio.errors.as_ref().unwrap().get("_schema").is_some());
    }
}
