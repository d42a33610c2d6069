//! Per-record-type field lists.

use crate::error::{SchemaError, SchemaResult, StorageError, StorageResult};
use crate::record::{FieldAccessor, Record, ID_FIELD};
use crate::schema::field::{FieldKind, FieldType, TableField};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The ordered set of persisted fields for one record type within one
/// schema version.
///
/// Built either by introspecting a live record type's descriptor table
/// (fresh schema) or by rehydrating a stored document (historical schema).
/// A historical schema may name a type tag or field type with no live
/// counterpart; rehydration tolerates that and never validates against
/// compiled types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Stable tag of the record type this table stores.
    #[serde(rename = "itemType")]
    pub item_type: String,
    /// Persisted fields, identifier first, then declaration order.
    pub fields: Vec<TableField>,
}

impl TableSchema {
    /// Introspects a live record type into a fresh table schema.
    ///
    /// Every descriptor-listed field is included; the identifier field is
    /// included implicitly even when the descriptor table omits it.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::NotStorable`] if a descriptor named `ID` is not an
    ///   integer accessor property
    /// - [`SchemaError::DuplicateField`] if two descriptors share a name
    pub fn from_type<T: Record>() -> SchemaResult<Self> {
        let mut fields = vec![TableField::new(FieldType::Int, ID_FIELD, FieldKind::Property)];
        let mut seen: HashSet<&'static str> = HashSet::new();
        seen.insert(ID_FIELD);

        for descriptor in T::descriptors() {
            if descriptor.name == ID_FIELD {
                if descriptor.field_type != FieldType::Int
                    || descriptor.kind != FieldKind::Property
                    || !matches!(descriptor.accessor, FieldAccessor::Scalar { .. })
                {
                    return Err(SchemaError::not_storable(
                        T::TYPE_TAG,
                        "ID must be an integer accessor property",
                    ));
                }
                // Already included implicitly.
                continue;
            }
            if !seen.insert(descriptor.name) {
                return Err(SchemaError::duplicate_field(T::TYPE_TAG, descriptor.name));
            }
            fields.push(TableField::new(
                descriptor.field_type,
                descriptor.name,
                descriptor.kind,
            ));
        }

        Ok(Self {
            item_type: T::TYPE_TAG.to_string(),
            fields,
        })
    }

    /// Rehydrates a table schema from its stored document form.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the document does not have the
    /// `{itemType, fields}` shape.
    pub fn from_document(document: serde_json::Value) -> StorageResult<Self> {
        serde_json::from_value(document)
            .map_err(|e| StorageError::corrupt("<document>", e.to_string()))
    }

    /// Serializes the table schema to its stored document form.
    #[must_use]
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Membership test for a field.
    ///
    /// With `by_name_only`, only names are compared; otherwise the field
    /// must be identical (name, type, and kind).
    #[must_use]
    pub fn contains_field(&self, field: &TableField, by_name_only: bool) -> bool {
        self.fields.iter().any(|f| {
            if by_name_only {
                f.same_name(field)
            } else {
                f.identical(field)
            }
        })
    }

    /// Adds a field to the schema.
    ///
    /// With `replace`, an existing field with the same name is removed
    /// first; the remove-then-add is atomic (the schema is unchanged on
    /// error).
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateField`] if a field with that name
    /// already exists and `replace` is off.
    pub fn add_field(&mut self, field: TableField, replace: bool) -> SchemaResult<()> {
        if self.contains_field(&field, true) {
            if !replace {
                return Err(SchemaError::duplicate_field(
                    &self.item_type,
                    &field.field_name,
                ));
            }
            self.remove_field(&field.field_name)?;
        }
        self.fields.push(field);
        Ok(())
    }

    /// Removes the field with the given name, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::FieldNotFound`] if no field has that name.
    pub fn remove_field(&mut self, name: &str) -> SchemaResult<TableField> {
        let position = self
            .fields
            .iter()
            .position(|f| f.field_name == name)
            .ok_or_else(|| SchemaError::field_not_found(&self.item_type, name))?;
        Ok(self.fields.remove(position))
    }

    /// Returns the field with the given name, or `None` if absent.
    ///
    /// Absence is a normal outcome here; callers use this for
    /// optional-field tolerance when reading historical documents.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&TableField> {
        self.fields.iter().find(|f| f.field_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldDescriptor, RecordId};
    use crate::value::FieldValue;

    #[derive(Debug, Default)]
    struct Player {
        id: RecordId,
        name: String,
        #[allow(dead_code)]
        secret: String,
    }

    impl Record for Player {
        const TYPE_TAG: &'static str = "Player";

        fn id(&self) -> RecordId {
            self.id
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = id;
        }

        // `secret` is deliberately not listed: unmarked members never persist.
        fn descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::scalar(
                "Name",
                FieldType::Text,
                FieldKind::Plain,
                |p| p.name.clone().into(),
                |p, v| {
                    if let FieldValue::Text(s) = v {
                        p.name = s;
                    }
                },
            )]
        }
    }

    #[derive(Debug, Default)]
    struct Clashing {
        id: RecordId,
        value: i64,
    }

    impl Record for Clashing {
        const TYPE_TAG: &'static str = "Clashing";

        fn id(&self) -> RecordId {
            self.id
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = id;
        }

        fn descriptors() -> Vec<FieldDescriptor<Self>> {
            let scalar = |name| {
                FieldDescriptor::scalar(
                    name,
                    FieldType::Int,
                    FieldKind::Plain,
                    |c: &Clashing| c.value.into(),
                    |c, v| {
                        if let FieldValue::Int(i) = v {
                            c.value = i;
                        }
                    },
                )
            };
            vec![scalar("Value"), scalar("Value")]
        }
    }

    #[test]
    fn from_type_includes_id_and_marked_fields_only() {
        let schema = TableSchema::from_type::<Player>().unwrap();

        assert_eq!(schema.item_type, "Player");
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].field_name, "ID");
        assert_eq!(schema.fields[0].kind, FieldKind::Property);
        assert_eq!(schema.fields[1].field_name, "Name");
        assert!(schema.field_by_name("secret").is_none());
    }

    #[test]
    fn from_type_rejects_duplicate_descriptor_names() {
        let err = TableSchema::from_type::<Clashing>().unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn add_remove_round_trip() {
        let mut schema = TableSchema::from_type::<Player>().unwrap();
        let original = schema.fields.clone();

        let field = TableField::new(FieldType::Int, "Score", FieldKind::Plain);
        schema.add_field(field.clone(), false).unwrap();
        assert!(schema.contains_field(&field, false));

        schema.remove_field("Score").unwrap();
        assert_eq!(schema.fields, original);
    }

    #[test]
    fn add_duplicate_fails_without_replace() {
        let mut schema = TableSchema::from_type::<Player>().unwrap();
        let field = TableField::new(FieldType::Int, "Name", FieldKind::Plain);

        let err = schema.add_field(field.clone(), false).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));

        // replace=true swaps the field out wholesale
        schema.add_field(field, true).unwrap();
        let replaced = schema.field_by_name("Name").unwrap();
        assert_eq!(replaced.field_type, FieldType::Int);
    }

    #[test]
    fn remove_missing_field_fails() {
        let mut schema = TableSchema::from_type::<Player>().unwrap();
        let err = schema.remove_field("Nope").unwrap_err();
        assert!(matches!(err, SchemaError::FieldNotFound { .. }));
    }

    #[test]
    fn document_round_trip() {
        let schema = TableSchema::from_type::<Player>().unwrap();
        let document = schema.to_document();

        assert_eq!(document["itemType"], "Player");
        let back = TableSchema::from_document(document).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn rehydrates_unknown_historical_types() {
        let document = serde_json::json!({
            "itemType": "Ghost",
            "fields": [
                {"fieldType": "int", "fieldName": "ID", "isProperty": true},
                {"fieldType": "VanishedType", "fieldName": "thing", "isProperty": false},
            ]
        });

        let schema = TableSchema::from_document(document).unwrap();
        assert_eq!(schema.item_type, "Ghost");
        assert_eq!(
            schema.fields[1].field_type,
            FieldType::Record("VanishedType".to_string())
        );
    }
}
