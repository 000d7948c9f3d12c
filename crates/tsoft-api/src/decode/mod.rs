// Lenient response decoder
//
// Turns a raw response body into an `Envelope<T>` by trying, in order:
//   1. wrapped        {"Success":..,"Data":<T>,"Message":..}
//   2. wrapped-array  {"Data":[<T>, ..]} for single-entity targets
//   3. direct         the body itself is a <T>
//   4. data-unwrap    {"Data":{..}} decoded as <T>
//   5. status-only    {"Success":..,"Message":..} with nothing to decode
// The first strategy that produces data wins. Never panics, never errors.
//
// Root keys are matched ignoring case.

pub mod normalize;
pub mod scalar;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::envelope::Envelope;
use crate::transport::preview;

pub use normalize::{fit_keys, normalize};
pub use scalar::{Scalar, canonical};

/// Characters of an undecodable body echoed to the error log.
const FAILURE_PREVIEW: usize = 1000;

/// JSON shape a payload type decodes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    List,
}

/// A type the decoder can produce.
///
/// The shape check matters: derived entity structs would otherwise accept
/// a JSON array positionally.
pub trait Payload: Sized {
    const SHAPE: Shape;

    /// Decode from a normalized tree; `None` when the shape or content
    /// does not fit.
    fn from_tree(value: Value) -> Option<Self>;

    /// True when the payload carries nothing useful (an empty list, or an
    /// entity with no populated attribute).
    fn is_blank(&self) -> bool;
}

impl<T: DeserializeOwned> Payload for Vec<T> {
    const SHAPE: Shape = Shape::List;

    fn from_tree(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(decode_items(items)),
            _ => None,
        }
    }

    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Implements [`Payload`] for entity structs that derive `Default` and
/// `PartialEq`.
macro_rules! entity_payload {
    ($($entity:ty),+ $(,)?) => {
        $(
            impl $crate::decode::Payload for $entity {
                const SHAPE: $crate::decode::Shape = $crate::decode::Shape::Object;

                fn from_tree(value: serde_json::Value) -> Option<Self> {
                    match value {
                        serde_json::Value::Object(_) => {
                            serde_json::from_value($crate::decode::fit_keys::<Self>(value)).ok()
                        }
                        _ => None,
                    }
                }

                fn is_blank(&self) -> bool {
                    *self == Self::default()
                }
            }
        )+
    };
}
pub(crate) use entity_payload;

// ── Lenient field helpers ────────────────────────────────────────────

/// Decode object elements, dropping anything that does not fit.
fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(fit_keys::<T>(normalize(item))).ok())
        .collect()
}

/// `deserialize_with` for entity lists: null or non-array becomes empty,
/// undecodable elements are dropped.
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => decode_items(items),
        _ => Vec::new(),
    })
}

/// `deserialize_with` for text lists: scalars are kept as canonical text,
/// everything else is dropped.
pub fn lenient_text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().filter_map(canonical).collect(),
        _ => Vec::new(),
    })
}

// ── Cascade ──────────────────────────────────────────────────────────

/// Decode a response body into an envelope.
pub fn decode<T: Payload>(body: &str) -> Envelope<T> {
    if body.trim().is_empty() {
        return Envelope::failure("Empty response");
    }

    debug!(length = body.len(), "parsing response");

    let tree = match serde_json::from_str::<Value>(body) {
        Ok(tree) => normalize(tree),
        Err(e) => {
            debug!(error = %e, "response is not JSON");
            return undecodable(body);
        }
    };

    if let Some(envelope) = wrapped(&tree) {
        debug!("wrapped format parsed");
        return envelope;
    }
    debug!("wrapped format did not match");

    if let Some(envelope) = wrapped_array(&tree) {
        debug!("wrapped array format parsed");
        return envelope;
    }
    debug!("wrapped array format did not match");

    // A bare entity with nothing populated is a status body, not data.
    let direct = shaped::<T>(&tree).filter(|data| T::SHAPE == Shape::List || !data.is_blank());
    if let Some(data) = direct {
        debug!("direct format parsed");
        return Envelope::ok(data);
    }
    debug!("direct format did not match");

    if let Some(envelope) = data_unwrap(&tree) {
        debug!("data property parsed");
        return envelope;
    }
    debug!("data property extraction failed");

    if let Some(envelope) = status_only(&tree) {
        debug!(success = envelope.success, "status-only response");
        return envelope;
    }

    undecodable(body)
}

fn undecodable<T>(body: &str) -> Envelope<T> {
    error!(
        body = %preview(body, FAILURE_PREVIEW),
        "all response parsing strategies failed"
    );
    Envelope::failure(format!("Failed to parse response. Length: {}", body.len()))
}

/// Decode `value` when its JSON shape matches `T`.
fn shaped<T: Payload>(value: &Value) -> Option<T> {
    let fits = match T::SHAPE {
        Shape::Object => value.is_object(),
        Shape::List => value.is_array(),
    };
    if fits { T::from_tree(value.clone()) } else { None }
}

fn root_object(tree: &Value) -> Option<&Map<String, Value>> {
    tree.as_object()
}

/// Look up `key`, falling back to a spelling that differs only in case.
fn field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

fn wrapped<T: Payload>(tree: &Value) -> Option<Envelope<T>> {
    let root = root_object(tree)?;
    let data = field(root, "Data").filter(|data| !data.is_null())?;
    let data = shaped::<T>(data)?;
    Some(Envelope {
        success: success_flag(root, false),
        data: Some(data),
        messages: messages(root),
    })
}

fn wrapped_array<T: Payload>(tree: &Value) -> Option<Envelope<T>> {
    if T::SHAPE != Shape::Object {
        return None;
    }
    let root = root_object(tree)?;
    let first = field(root, "Data")?.as_array()?.first()?;
    let data = shaped::<T>(first)?;
    Some(Envelope {
        success: success_flag(root, false),
        data: Some(data),
        messages: messages(root),
    })
}

fn data_unwrap<T: Payload>(tree: &Value) -> Option<Envelope<T>> {
    let root = root_object(tree)?;
    let data = field(root, "Data").filter(|data| data.is_object())?;
    let data = T::from_tree(data.clone())?;
    Some(Envelope {
        success: success_flag(root, true),
        data: Some(data),
        messages: messages(root),
    })
}

/// A root object that only reports an outcome: a `Success` flag and/or
/// messages, with no data any strategy could use.
fn status_only<T>(tree: &Value) -> Option<Envelope<T>> {
    let root = root_object(tree)?;
    let flagged = field(root, "Success").is_some();
    let messages = messages(root);
    if !flagged && messages.is_empty() {
        return None;
    }
    Some(Envelope {
        success: success_flag(root, false),
        data: None,
        messages,
    })
}

/// Read the root `Success` flag, already normalized to text.
fn success_flag(root: &Map<String, Value>, default: bool) -> bool {
    field(root, "Success")
        .and_then(canonical)
        .map_or(default, |flag| {
            Scalar::from(flag).as_bool().unwrap_or(default)
        })
}

/// Flatten `Message` / `Messages` into plain strings.
///
/// The upstream sends a bare string, a list of strings, or a list of
/// `{"Text": [..]}` items depending on endpoint.
fn messages(root: &Map<String, Value>) -> Vec<String> {
    let mut out = Vec::new();
    for key in ["Message", "Messages"] {
        if let Some(value) = field(root, key) {
            collect_messages(value, &mut out);
        }
    }
    out
}

fn collect_messages(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_messages(item, out)),
        Value::Object(map) => {
            if let Some(text) = field(map, "Text") {
                collect_messages(text, out);
            }
        }
        scalar => {
            if let Some(text) = canonical(scalar).filter(|text| !text.is_empty()) {
                out.push(text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default, rename_all = "PascalCase")]
    struct Item {
        product_id: Scalar,
        product_name: Scalar,
    }

    entity_payload!(Item);

    #[test]
    fn empty_body_is_reported() {
        let env = decode::<Item>("   ");
        assert!(!env.success);
        assert_eq!(env.messages, ["Empty response"]);
    }

    #[test]
    fn wrapped_list_keeps_flag_and_messages() {
        let env = decode::<Vec<Item>>(
            r#"{"success":false,"data":[{"ProductId":1}],"message":[{"text":["Limit exceeded"]}]}"#,
        );
        assert!(!env.success);
        assert_eq!(env.data.map(|d| d.len()), Some(1));
        assert_eq!(env.messages, ["Limit exceeded"]);
    }

    #[test]
    fn wrapped_success_defaults_false() {
        let env = decode::<Vec<Item>>(r#"{"data":[]}"#);
        assert!(!env.success);
        assert_eq!(env.data, Some(Vec::new()));
    }

    #[test]
    fn entity_from_wrapped_array_takes_first_element() {
        let env = decode::<Item>(r#"{"data":[{"ProductId":"1"},{"ProductId":"2"}],"success":true}"#);
        assert!(env.success);
        assert_eq!(env.data.unwrap_or_default().product_id, Scalar::from("1"));
    }

    #[test]
    fn wrapped_array_without_flag_is_not_success() {
        let env = decode::<Item>(r#"{"data":[{"ProductId":"1"}]}"#);
        assert!(!env.success);
        assert_eq!(env.data.unwrap_or_default().product_id, Scalar::from("1"));
    }

    #[test]
    fn failure_status_is_not_read_as_a_blank_entity() {
        let env = decode::<Item>(r#"{"Success":false,"Message":"Product not found"}"#);
        assert!(!env.success);
        assert_eq!(env.data, None);
        assert_eq!(env.messages, ["Product not found"]);
    }

    #[test]
    fn bare_success_status_carries_no_data() {
        let env = decode::<Item>(r#"{"success":"true"}"#);
        assert!(env.success);
        assert_eq!(env.data, None);
    }

    #[test]
    fn keys_match_ignoring_case() {
        let env = decode::<Vec<Item>>(
            r#"{"SUCCESS":true,"DATA":[{"PRODUCTID":5,"productname":"Shirt"}],"MESSAGE":"ok"}"#,
        );
        assert!(env.success);
        assert_eq!(env.messages, ["ok"]);
        let items = env.data.unwrap_or_default();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, Scalar::from("5"));
        assert_eq!(items[0].product_name, Scalar::from("Shirt"));

        let single = decode::<Item>(r#"{"ProductID":"8"}"#);
        assert_eq!(single.data.unwrap_or_default().product_id, Scalar::from("8"));
    }

    #[test]
    fn bare_object_decodes_directly() {
        let env = decode::<Item>(r#"{"ProductId":"9","ProductName":"Shirt"}"#);
        assert!(env.success);
        assert_eq!(env.data.unwrap_or_default().product_name, Scalar::from("Shirt"));
    }

    #[test]
    fn bare_array_decodes_directly_for_lists() {
        let env = decode::<Vec<Item>>(r#"[{"ProductId":1},{"ProductId":"2"}, 5]"#);
        assert!(env.success);
        let ids: Vec<_> = env
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.product_id.to_string())
            .collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn bare_empty_array_is_an_empty_list() {
        let env = decode::<Vec<Item>>("[]");
        assert!(env.success);
        assert_eq!(env.data, Some(Vec::new()));
    }

    #[test]
    fn list_target_never_takes_an_object_root() {
        let env = decode::<Vec<Item>>(r#"{"ProductId":"9"}"#);
        assert!(!env.success);
    }

    #[test]
    fn wrapped_entity_without_flag_is_not_success() {
        let env = decode::<Item>(r#"{"Data":{"ProductId":"4"},"Messages":"ok"}"#);
        assert!(!env.success);
        assert_eq!(env.data.as_ref().map(|d| d.product_id.to_string()), Some("4".into()));
        assert_eq!(env.messages, ["ok"]);
    }

    #[test]
    fn long_prices_keep_every_digit() {
        use crate::model::Product;

        let as_number = decode::<Product>(
            r#"{"Success":true,"Data":[{"ProductCode":"P1","SellingPrice":300.00000000299997}]}"#,
        );
        let as_text = decode::<Product>(
            r#"{"Success":true,"Data":[{"ProductCode":"P1","SellingPrice":"300.00000000299997"}]}"#,
        );

        let number_price = as_number.data.unwrap_or_default().selling_price;
        assert_eq!(number_price.as_deref(), Some("300.00000000299997"));
        assert_eq!(number_price, as_text.data.unwrap_or_default().selling_price);
    }

    #[test]
    fn invalid_json_reports_length() {
        let body = "not valid json at all";
        let env = decode::<Vec<Item>>(body);
        assert!(!env.success);
        assert_eq!(
            env.messages,
            [format!("Failed to parse response. Length: {}", body.len())]
        );
    }

    #[test]
    fn lenient_lists_drop_bad_elements() {
        #[derive(Debug, Default, Deserialize)]
        #[serde(default, rename_all = "PascalCase")]
        struct Holder {
            #[serde(deserialize_with = "lenient_list")]
            items: Vec<Item>,
            #[serde(deserialize_with = "lenient_text_list")]
            path: Vec<String>,
        }

        let holder: Holder = serde_json::from_value(serde_json::json!({
            "Items": [{ "productId": 3 }, "junk", [1, 2]],
            "Path": ["A", 2, { "x": 1 }]
        }))
        .unwrap_or_default();

        assert_eq!(holder.items.len(), 1);
        assert_eq!(holder.items[0].product_id, Scalar::from("3"));
        assert_eq!(holder.path, ["A", "2"]);

        let empty: Holder =
            serde_json::from_value(serde_json::json!({ "Items": null, "Path": "A" })).unwrap_or_default();
        assert!(empty.items.is_empty());
        assert!(empty.path.is_empty());
    }
}
