// Loosely-typed scalar values.
//
// The upstream sends the same attribute as a string on one endpoint and a
// number or boolean on another. Every scalar is kept as canonical text and
// coerced only where it is used.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// Canonical text of a JSON scalar.
///
/// Strings map to themselves, numbers to invariant decimal text (integers
/// exactly, floats in shortest round-trip form), booleans to
/// `"true"`/`"false"`. Null, objects and arrays have no scalar text.
pub fn canonical(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number_text(number)),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn number_text(number: &Number) -> String {
    if let Some(int) = number.as_i64() {
        int.to_string()
    } else if let Some(uint) = number.as_u64() {
        uint.to_string()
    } else {
        number
            .as_f64()
            .map_or_else(|| number.to_string(), |float| float.to_string())
    }
}

/// An optional text value decoded from any JSON scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scalar(Option<String>);

impl Scalar {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Some(text.into()))
    }

    pub const fn absent() -> Self {
        Self(None)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// The text, or `""` when absent.
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or_default()
    }

    /// Present and non-empty.
    pub fn is_present(&self) -> bool {
        self.0.as_deref().is_some_and(|text| !text.is_empty())
    }

    /// The text when present and non-empty.
    pub fn non_empty(&self) -> Option<&str> {
        self.0.as_deref().filter(|text| !text.is_empty())
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }

    pub fn parse<T: FromStr>(&self) -> Option<T> {
        self.0.as_deref().and_then(|text| text.trim().parse().ok())
    }

    /// Integer value. Whole-number decimals such as `"12.0"` are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        self.parse::<i64>().or_else(|| {
            let float = self.as_f64()?;
            #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
            let whole = float as i64;
            (float.fract() == 0.0).then_some(whole)
        })
    }

    /// Decimal value using `.` as the separator regardless of locale.
    pub fn as_f64(&self) -> Option<f64> {
        self.parse::<f64>().filter(|float| float.is_finite())
    }

    /// Boolean value from the flag spellings the upstream uses.
    pub fn as_bool(&self) -> Option<bool> {
        let text = self.0.as_deref()?.trim().to_ascii_lowercase();
        match text.as_str() {
            "1" | "true" | "yes" | "active" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Scalar {
    fn from(text: String) -> Self {
        Self(Some(text))
    }
}

impl From<Option<String>> for Scalar {
    fn from(text: Option<String>) -> Self {
        Self(text)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self(canonical(&value)))
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
