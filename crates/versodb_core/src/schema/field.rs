//! Persisted field descriptors: type tags, kinds, and table fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable string tag for the integer type.
const TAG_INT: &str = "int";
/// Stable string tag for the float type.
const TAG_FLOAT: &str = "float";
/// Stable string tag for the bool type.
const TAG_BOOL: &str = "bool";
/// Stable string tag for the string type.
const TAG_TEXT: &str = "string";

/// A stable, string-tagged reference to a persisted value type.
///
/// Schema files written by older application versions may carry a record tag
/// that no longer has a live registration; [`FieldType::Record`] tolerates
/// that so historical schemas always rehydrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// Boolean.
    Bool,
    /// Text string.
    Text,
    /// Another storable record type, referenced by its stable tag.
    Record(String),
}

impl FieldType {
    /// Returns the stable tag for this type.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Int => TAG_INT,
            Self::Float => TAG_FLOAT,
            Self::Bool => TAG_BOOL,
            Self::Text => TAG_TEXT,
            Self::Record(tag) => tag,
        }
    }

    /// Parses a stable tag back into a field type.
    ///
    /// Any tag that is not a known scalar names a record type.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            TAG_INT => Self::Int,
            TAG_FLOAT => Self::Float,
            TAG_BOOL => Self::Bool,
            TAG_TEXT => Self::Text,
            other => Self::Record(other.to_string()),
        }
    }

    /// Returns true if this type is itself a storable record type.
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.tag().to_string()
    }
}

/// Whether a persisted member is a plain field or an accessor property.
///
/// Stored on disk as the `isProperty` boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum FieldKind {
    /// A plain data field.
    Plain,
    /// An accessor property.
    Property,
}

impl From<bool> for FieldKind {
    fn from(is_property: bool) -> Self {
        if is_property {
            Self::Property
        } else {
            Self::Plain
        }
    }
}

impl From<FieldKind> for bool {
    fn from(kind: FieldKind) -> Self {
        kind == FieldKind::Property
    }
}

/// A single persisted attribute descriptor within a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableField {
    /// The declared value type.
    #[serde(rename = "fieldType")]
    pub field_type: FieldType,
    /// The persisted field name.
    #[serde(rename = "fieldName")]
    pub field_name: String,
    /// Plain field or accessor property.
    #[serde(rename = "isProperty")]
    pub kind: FieldKind,
}

impl TableField {
    /// Creates a new table field descriptor.
    #[must_use]
    pub fn new(field_type: FieldType, field_name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            field_type,
            field_name: field_name.into(),
            kind,
        }
    }

    /// Returns true if `other` names the same field.
    #[must_use]
    pub fn same_name(&self, other: &TableField) -> bool {
        self.field_name == other.field_name
    }

    /// Returns true if `other` is identical: same name, type, and kind.
    #[must_use]
    pub fn identical(&self, other: &TableField) -> bool {
        self.same_name(other) && self.field_type == other.field_type && self.kind == other.kind
    }

    /// Returns the document key this field writes to.
    ///
    /// Record-typed fields persist as a foreign-key identifier under
    /// `<fieldName>_ID`, never as an embedded document.
    #[must_use]
    pub fn document_key(&self) -> String {
        if self.field_type.is_record() {
            format!("{}_ID", self.field_name)
        } else {
            self.field_name.clone()
        }
    }
}
