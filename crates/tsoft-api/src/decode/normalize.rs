// Decode-time normalization of the upstream JSON tree.
//
// Runs once per response body, before any typed decode:
//   * object keys get an upper-case first letter, so `productCode` and
//     `ProductCode` land on the same field
//   * number and boolean leaves become their canonical text
//
// When a folded key collides with one already present the first spelling
// in the object wins.
//
// The upstream is not consistent about case beyond the first letter either
// (`PRODUCTCODE`, `productcode`, `ProductID`). Those are matched against the
// target type's own field names by `fit_keys` right before a typed decode.

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde_json::{Map, Value};

use super::scalar::canonical;

pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut folded = Map::with_capacity(map.len());
            for (key, child) in map {
                folded.entry(fold_key(key)).or_insert_with(|| normalize(child));
            }
            Value::Object(folded)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Number(_) | Value::Bool(_) => canonical(&value).map_or(Value::Null, Value::String),
        Value::Null | Value::String(_) => value,
    }
}

/// Upper-case the first character of a key if it is an ASCII lower-case
/// letter.
pub fn fold_key(key: String) -> String {
    match key.as_bytes().first() {
        Some(first) if first.is_ascii_lowercase() => {
            let mut folded = key;
            folded[..1].make_ascii_uppercase();
            folded
        }
        _ => key,
    }
}

/// Rename object keys that match one of `T`'s fields ignoring ASCII case
/// to that field's exact spelling.
///
/// Only the top level is touched; nested entity lists fit their own keys
/// when they are decoded. An exact spelling always wins over a folded one.
pub fn fit_keys<T: DeserializeOwned>(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(fit_map(map, field_names::<T>())),
        other => other,
    }
}

fn fit_map(map: Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
    if fields.is_empty() {
        return map;
    }

    let (exact, loose): (Vec<_>, Vec<_>) = map
        .into_iter()
        .partition(|(key, _)| fields.contains(&key.as_str()));
    let mut fitted: Map<String, Value> = exact.into_iter().collect();
    for (key, child) in loose {
        let key = fields
            .iter()
            .find(|field| field.eq_ignore_ascii_case(&key))
            .map_or(key, |field| (*field).to_owned());
        fitted.entry(key).or_insert(child);
    }
    fitted
}

/// Serialized field names of a derived struct, empty for anything else.
pub fn field_names<T: DeserializeOwned>() -> &'static [&'static str] {
    let mut fields: &'static [&'static str] = &[];
    // The introspector always errors once it has seen the field list.
    let _ = T::deserialize(FieldNames(&mut fields));
    fields
}

/// Deserializer that records the field list a derived struct asks for.
struct FieldNames<'a>(&'a mut &'static [&'static str]);

impl<'de> Deserializer<'de> for FieldNames<'_> {
    type Error = de::value::Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("not a struct"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        *self.0 = fields;
        Err(de::Error::custom("field names recorded"))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn keys_fold_and_leaves_become_text() {
        let raw = json!({
            "success": true,
            "data": [{ "productId": 12, "SellingPrice": 272.5, "isActive": false, "note": null }]
        });

        assert_eq!(
            normalize(raw),
            json!({
                "Success": "true",
                "Data": [{ "ProductId": "12", "SellingPrice": "272.5", "IsActive": "false", "Note": null }]
            })
        );
    }

    #[test]
    fn first_spelling_wins_on_collision() {
        // serde_json maps iterate in key order: "Data" sorts before "data".
        let raw = json!({ "data": "lower", "Data": "upper" });
        assert_eq!(normalize(raw), json!({ "Data": "upper" }));
    }

    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default, rename_all = "PascalCase")]
    struct Line {
        product_code: String,
        product_id: String,
    }

    #[test]
    fn field_names_come_from_the_derive() {
        assert_eq!(field_names::<Line>(), ["ProductCode", "ProductId"]);
        assert!(field_names::<String>().is_empty());
    }

    #[test]
    fn keys_fit_fields_ignoring_case() {
        let fitted = fit_keys::<Line>(normalize(json!({
            "PRODUCTCODE": "TS-1",
            "ProductID": 7,
            "stockCount": 2
        })));
        assert_eq!(
            fitted,
            json!({ "ProductCode": "TS-1", "ProductId": "7", "StockCount": "2" })
        );
    }

    #[test]
    fn exact_key_beats_a_loose_spelling() {
        let fitted = fit_keys::<Line>(json!({ "productcode": "loose", "ProductCode": "exact" }));
        assert_eq!(fitted, json!({ "ProductCode": "exact" }));
    }

    #[test]
    fn non_letter_keys_are_untouched() {
        assert_eq!(fold_key("_id".into()), "_id");
        assert_eq!(fold_key("ürün".into()), "ürün");
        assert_eq!(fold_key("renk".into()), "Renk");
    }
}
