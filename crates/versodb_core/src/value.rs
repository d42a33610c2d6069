//! Runtime field values and their stringly on-disk encoding.
//!
//! Every scalar field value is stored on disk as its string representation
//! (never as a native JSON number or bool). Parsing is always driven by the
//! [`FieldType`] declared in the governing table schema, not by the JSON
//! token kind found in the document.

use crate::schema::FieldType;
use thiserror::Error;

/// A runtime scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No value (stored as JSON null).
    Unset,
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Text string.
    Text(String),
}

/// Failure to parse a stored string back into a typed value.
#[derive(Debug, Error)]
#[error("cannot parse {raw:?} as {field_type}")]
pub struct ValueParseError {
    /// The declared field type.
    pub field_type: FieldType,
    /// The raw stored string.
    pub raw: String,
}

impl FieldValue {
    /// Renders the value to its stored string form.
    ///
    /// Returns `None` for [`FieldValue::Unset`], which is stored as JSON null.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Unset => None,
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Bool(v) => Some(v.to_string()),
            Self::Text(v) => Some(v.clone()),
        }
    }

    /// Parses a stored string according to a declared field type.
    ///
    /// # Errors
    ///
    /// Returns [`ValueParseError`] if the string does not parse as the
    /// declared type. Record-typed fields never reach this path; they are
    /// stored as foreign-key identifiers, not as rendered values.
    pub fn parse(field_type: &FieldType, raw: &str) -> Result<Self, ValueParseError> {
        let fail = || ValueParseError {
            field_type: field_type.clone(),
            raw: raw.to_string(),
        };

        match field_type {
            FieldType::Int => raw.parse::<i64>().map(Self::Int).map_err(|_| fail()),
            FieldType::Float => raw.parse::<f64>().map(Self::Float).map_err(|_| fail()),
            FieldType::Bool => raw.parse::<bool>().map(Self::Bool).map_err(|_| fail()),
            FieldType::Text => Ok(Self::Text(raw.to_string())),
            FieldType::Record(_) => Err(fail()),
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text value, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true if the value is unset.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_scalars_as_strings() {
        assert_eq!(FieldValue::Int(42).render(), Some("42".to_string()));
        assert_eq!(FieldValue::Bool(true).render(), Some("true".to_string()));
        assert_eq!(FieldValue::Float(1.5).render(), Some("1.5".to_string()));
        assert_eq!(
            FieldValue::Text("abc".into()).render(),
            Some("abc".to_string())
        );
        assert_eq!(FieldValue::Unset.render(), None);
    }

    #[test]
    fn parse_round_trip() {
        let cases = [
            (FieldType::Int, "42", FieldValue::Int(42)),
            (FieldType::Float, "1.5", FieldValue::Float(1.5)),
            (FieldType::Bool, "false", FieldValue::Bool(false)),
            (FieldType::Text, "hello", FieldValue::Text("hello".into())),
        ];

        for (field_type, raw, expected) in cases {
            assert_eq!(FieldValue::parse(&field_type, raw).unwrap(), expected);
        }
    }

    #[test]
    fn parse_failure_names_type_and_raw() {
        let err = FieldValue::parse(&FieldType::Int, "not a number").unwrap_err();
        assert_eq!(err.raw, "not a number");
        assert!(err.to_string().contains("int"));
    }

    #[test]
    fn record_type_never_parses_as_value() {
        let err = FieldValue::parse(&FieldType::Record("Player".into()), "1");
        assert!(err.is_err());
    }
}
