//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use tsoft_api::{Envelope, Product};

use crate::error::CliError;

/// Unwrap an envelope or turn its messages into an upstream error.
pub fn ensure<T>(envelope: Envelope<T>, operation: &str) -> Result<T, CliError> {
    envelope
        .into_result()
        .map_err(|messages| CliError::upstream(operation, &messages))
}

/// Check a write went through; the upstream may or may not echo the
/// written record back.
pub fn ensure_done<T>(envelope: Envelope<T>, operation: &str) -> Result<Option<T>, CliError> {
    if envelope.success {
        Ok(envelope.data)
    } else {
        Err(CliError::upstream(operation, &envelope.messages))
    }
}

/// Parse repeated `KEY=VALUE` arguments, keeping their order.
pub fn parse_pairs(raw: &[String], field: &str) -> Result<IndexMap<String, String>, CliError> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.trim().to_owned(), value.to_owned()))
                .ok_or_else(|| CliError::Validation {
                    field: field.into(),
                    reason: format!("expected KEY=VALUE, got '{pair}'"),
                })
        })
        .collect()
}

/// Overwrite product fields by their upstream (PascalCase) names.
pub fn set_fields(product: &Product, fields: &IndexMap<String, String>) -> Result<Product, CliError> {
    let mut value = serde_json::to_value(product)?;
    let Some(object) = value.as_object_mut() else {
        return Err(CliError::Validation {
            field: "product".into(),
            reason: "product did not serialize to an object".into(),
        });
    };
    for (key, text) in fields {
        if !object.contains_key(key) {
            return Err(CliError::Validation {
                field: key.clone(),
                reason: "not a product field (use the PascalCase upstream name)".into(),
            });
        }
        object.insert(key.clone(), serde_json::Value::String(text.clone()));
    }
    Ok(serde_json::from_value(value)?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tsoft_api::Scalar;

    use super::*;

    #[test]
    fn writes_without_an_echo_still_succeed() {
        let echo_less = Envelope::<Product> {
            success: true,
            data: None,
            messages: Vec::new(),
        };
        let done = ensure_done(echo_less, "product update");
        assert!(done.unwrap().is_none());

        let failed = ensure_done(Envelope::<Product>::failure("duplicate code"), "product creation");
        assert!(failed.unwrap_err().to_string().contains("duplicate code"));
    }

    #[test]
    fn pairs_keep_order_and_allow_equals_in_value() {
        let raw = vec!["b=1".to_owned(), "a=x=y".to_owned()];
        let pairs = parse_pairs(&raw, "filter").unwrap();
        let collected: Vec<_> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(collected, [("b", "1"), ("a", "x=y")]);
    }

    #[test]
    fn pair_without_key_is_rejected() {
        let err = parse_pairs(&["=1".to_owned()], "filter").unwrap_err();
        assert!(matches!(err, CliError::Validation { field, .. } if field == "filter"));
    }

    #[test]
    fn set_fields_by_upstream_name() {
        let product = Product {
            product_code: Scalar::from("P1"),
            ..Product::default()
        };
        let mut fields = IndexMap::new();
        fields.insert("ProductName".to_owned(), "Mug".to_owned());

        let updated = set_fields(&product, &fields).unwrap();
        assert_eq!(updated.product_name.as_str(), "Mug");
        assert_eq!(updated.product_code.as_str(), "P1");

        fields.insert("Nope".to_owned(), "x".to_owned());
        assert!(set_fields(&product, &fields).is_err());
    }
}
