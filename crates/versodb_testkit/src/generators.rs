//! Property-based test generators using proptest.
//!
//! Strategies for schema elements and field values that respect the
//! stored wire formats.

use proptest::prelude::*;
use versodb_core::{FieldKind, FieldType, FieldValue, TableField};

/// Strategy for version strings in the `major.minor` shape the schema
/// catalog stores.
pub fn version_strategy() -> impl Strategy<Value = String> {
    (0u32..100, 0u32..100).prop_map(|(major, minor)| format!("{major}.{minor}"))
}

/// Strategy for persisted field names.
///
/// Avoids `ID` (reserved) and the `_ID` suffix (foreign-key keys).
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9]{0,15}")
        .expect("invalid regex")
        .prop_filter("reserved field name", |s| s != "ID" && !s.ends_with("_ID"))
}

/// Strategy for scalar field types.
pub fn scalar_field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Int),
        Just(FieldType::Float),
        Just(FieldType::Bool),
        Just(FieldType::Text),
    ]
}

/// Strategy for scalar table fields.
pub fn table_field_strategy() -> impl Strategy<Value = TableField> {
    (
        scalar_field_type_strategy(),
        field_name_strategy(),
        any::<bool>(),
    )
        .prop_map(|(field_type, name, is_property)| {
            TableField::new(field_type, name, FieldKind::from(is_property))
        })
}

/// Strategy for a field value matching a given scalar type.
pub fn field_value_for(field_type: &FieldType) -> BoxedStrategy<FieldValue> {
    match field_type {
        FieldType::Int => any::<i64>().prop_map(FieldValue::Int).boxed(),
        FieldType::Float => {
            // Finite only: the stored string form must parse back.
            prop_oneof![prop::num::f64::NORMAL, Just(0.0)]
                .prop_map(FieldValue::Float)
                .boxed()
        }
        FieldType::Bool => any::<bool>().prop_map(FieldValue::Bool).boxed(),
        _ => prop::string::string_regex("[ -~]{0,32}")
            .expect("invalid regex")
            .prop_map(FieldValue::Text)
            .boxed(),
    }
}
