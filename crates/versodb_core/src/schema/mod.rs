//! Schema model: fields, per-type table schemas, versioned schema sets,
//! and the on-disk version catalog.

mod builder;
mod field;
mod table_schema;

pub use builder::SchemaBuilder;
pub use field::{FieldKind, FieldType, TableField};
pub use table_schema::TableSchema;

use crate::error::{SchemaError, SchemaResult, StorageError, StorageResult};
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// A named snapshot of which record types and fields are persisted.
///
/// At most one [`TableSchema`] exists per record type. Deriving a new
/// version from a reference schema deep-clones the table list; two schema
/// instances never share a mutable backing sequence, so mutating one
/// version cannot silently mutate another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The version string naming this snapshot.
    pub version: String,
    /// Table schemas, one per record type.
    #[serde(rename = "tableSchemas")]
    pub table_schemas: Vec<TableSchema>,
}

impl Schema {
    /// Creates an empty schema for a version.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            table_schemas: Vec::new(),
        }
    }

    /// Creates a schema for a version whose initial table list is a deep
    /// clone of a reference schema's.
    #[must_use]
    pub fn derived_from(version: impl Into<String>, reference: &Schema) -> Self {
        Self {
            version: version.into(),
            table_schemas: reference.table_schemas.clone(),
        }
    }

    /// Rehydrates a schema from its stored document form.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the document does not have the
    /// `{version, tableSchemas}` shape.
    pub fn from_document(document: serde_json::Value) -> StorageResult<Self> {
        serde_json::from_value(document)
            .map_err(|e| StorageError::corrupt("<document>", e.to_string()))
    }

    /// Serializes the schema to its stored document form.
    #[must_use]
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Adds a table schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateTable`] if a table schema for the
    /// same record type already exists.
    pub fn add_table_schema(&mut self, table_schema: TableSchema) -> SchemaResult<()> {
        if self.get_table_schema(&table_schema.item_type).is_some() {
            return Err(SchemaError::duplicate_table(&table_schema.item_type));
        }
        self.table_schemas.push(table_schema);
        Ok(())
    }

    /// Removes the table schema for a record type tag, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TableNotFound`] if absent.
    pub fn remove_table_schema(&mut self, type_tag: &str) -> SchemaResult<TableSchema> {
        let position = self
            .table_schemas
            .iter()
            .position(|t| t.item_type == type_tag)
            .ok_or_else(|| SchemaError::table_not_found(type_tag))?;
        Ok(self.table_schemas.remove(position))
    }

    /// Returns the table schema for a record type tag, or `None` if absent.
    #[must_use]
    pub fn get_table_schema(&self, type_tag: &str) -> Option<&TableSchema> {
        self.table_schemas.iter().find(|t| t.item_type == type_tag)
    }

    /// Drops the table schema for `T` and re-introspects a fresh one from
    /// the live type.
    ///
    /// This is a wholesale replace, never a merge: custom field ordering or
    /// manual removals done on the old table schema are lost.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::TableNotFound`] if no table schema exists for `T`
    /// - Introspection errors from [`TableSchema::from_type`]
    pub fn rebuild_table_schema<T: Record>(&mut self) -> SchemaResult<()> {
        let rebuilt = TableSchema::from_type::<T>()?;
        self.remove_table_schema(T::TYPE_TAG)?;
        self.table_schemas.push(rebuilt);
        Ok(())
    }
}
