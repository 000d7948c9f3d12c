// Request payloads for the two upstream API styles.
//
// The payload variant decides the transport style: form fields go out as a
// legacy form POST, query parameters as a JSON-API GET, and JSON bodies as a
// JSON-API POST.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Ordered form fields for the legacy API.
///
/// Setting a key twice overwrites the earlier value but keeps its
/// position, matching how the upstream parses repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: IndexMap<String, String>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.fields.insert(key.into(), value.to_string());
    }

    /// Merge caller-supplied filters, overwriting existing keys.
    pub fn merge<'a, I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in extra {
            self.fields.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The same fields as JSON-API query parameters.
    pub fn to_query(&self) -> Query {
        self.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    /// `application/x-www-form-urlencoded` body text.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// `key=value&...` rendering for debug logs with `secret_key` masked.
    pub(crate) fn redacted(&self, secret_key: &str) -> String {
        self.iter()
            .map(|(k, v)| {
                if k == secret_key {
                    format!("{k}=***")
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Query parameters for JSON-API GETs.
pub type Query = Vec<(String, String)>;

/// A request payload. The variant selects the transport style.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Legacy form POST.
    Form(Form),
    /// JSON-API GET with query parameters.
    Query(Query),
    /// JSON-API POST with a JSON body.
    Json(Value),
}

impl Request {
    /// JSON-API GET without parameters.
    pub fn get() -> Self {
        Self::Query(Vec::new())
    }

    /// Serialize a JSON-API body.
    ///
    /// Null members are stripped recursively so the upstream never sees
    /// explicit nulls; a payload that fails to serialize degrades to an
    /// empty object.
    pub fn json(body: &impl Serialize) -> Self {
        let mut value = serde_json::to_value(body).unwrap_or_else(|_| Value::Object(Default::default()));
        strip_nulls(&mut value);
        Self::Json(value)
    }

    /// Short label used in logs.
    pub fn style(&self) -> &'static str {
        match self {
            Self::Form(_) => "legacy POST",
            Self::Query(_) => "json GET",
            Self::Json(_) => "json POST",
        }
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_overwrites_in_place() {
        let form = Form::new()
            .field("limit", 50)
            .field("page", 1)
            .field("limit", 10);
        let keys: Vec<_> = form.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["limit", "page"]);
        assert_eq!(form.get("limit"), Some("10"));
    }

    #[test]
    fn form_encoding_escapes_values() {
        let form = Form::new().field("q", "a b&c").field("name", "Kırmızı");
        assert_eq!(form.encode(), "q=a+b%26c&name=K%C4%B1rm%C4%B1z%C4%B1");
    }

    #[test]
    fn redaction_masks_only_the_secret() {
        let form = Form::new().field("ProductCode", "T1").field("token", "s3cret");
        assert_eq!(form.redacted("token"), "ProductCode=T1&token=***");
    }

    #[test]
    fn json_bodies_drop_nulls() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            product_name: &'static str,
            brand: Option<&'static str>,
            nested: serde_json::Value,
        }

        let request = Request::json(&Body {
            product_name: "Shirt",
            brand: None,
            nested: json!({ "keep": 1, "drop": null }),
        });

        assert_eq!(
            request,
            Request::Json(json!({ "productName": "Shirt", "nested": { "keep": 1 } }))
        );
    }
}
