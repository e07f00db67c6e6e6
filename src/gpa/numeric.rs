use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A boundary value that may hold a number, raw text typed by a user, or nothing.
///
/// Form fields (credits, scores, previous CGPA/credits) arrive in any of these
/// shapes. None of them is an error: [`NumericInput::value`] is the single
/// place where they are turned into a usable number.
///
/// Example YAML:
/// ```yaml
/// credits: 3        # Number
/// credits: " 1.5 "  # Text, coerces to 1.5
/// credits: ""       # Text, unusable
/// credits: ~        # Absent
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NumericInput {
    Number(f64),
    Text(String),
    #[default]
    Absent,
}

impl NumericInput {
    /// The usable value, if any. Non-finite numbers count as unusable.
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericInput::Number(n) => Some(*n).filter(|v| v.is_finite()),
            NumericInput::Text(s) => coerce(s),
            NumericInput::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.value().is_none()
    }
}

/// Trim and parse a decimal number. Empty, non-parsing and non-finite input
/// yields `None`.
pub fn coerce(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<u32> for NumericInput {
    fn from(value: u32) -> Self {
        NumericInput::Number(f64::from(value))
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(value: String) -> Self {
        NumericInput::Text(value)
    }
}

impl<T: Into<NumericInput>> From<Option<T>> for NumericInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl Serialize for NumericInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NumericInput::Number(n) => serializer.serialize_f64(*n),
            NumericInput::Text(s) => serializer.serialize_str(s),
            NumericInput::Absent => serializer.serialize_none(),
        }
    }
}

struct NumericInputVisitor;

impl<'de> Visitor<'de> for NumericInputVisitor {
    type Value = NumericInput;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a string, or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(NumericInput::Number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(NumericInput::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(NumericInput::Number(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(NumericInput::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(NumericInput::Text(v))
    }

    // Booleans and other scalars are kept as text so they coerce to nothing
    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(NumericInput::Text(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NumericInput::Absent)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NumericInput::Absent)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(NumericInputVisitor)
    }
}

impl<'de> Deserialize<'de> for NumericInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumericInputVisitor)
    }
}
