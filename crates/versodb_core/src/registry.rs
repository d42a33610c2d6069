//! Registry mapping stable type tags to live record types.
//!
//! Stored schemas name record types by string tag. Instead of resolving
//! those tags through runtime type lookup, the host registers every
//! storable type at startup; a stored tag with no registration fails fast
//! with [`SchemaError::UnknownType`].

use crate::error::{SchemaError, SchemaResult};
use crate::record::Record;
use crate::schema::TableSchema;
use crate::table::{AnyTable, Table};
use std::collections::HashMap;
use std::path::PathBuf;

/// Per-type entry: how to introspect the type and build its table.
struct Registration {
    /// Builds a fresh table schema from the live type.
    introspect: fn() -> SchemaResult<TableSchema>,
    /// Builds a table bound to a schema and backing file.
    build_table: fn(TableSchema, PathBuf) -> Box<dyn AnyTable>,
}

/// The set of storable record types known to this process.
#[derive(Default)]
pub struct RecordRegistry {
    registrations: HashMap<&'static str, Registration>,
}

impl RecordRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record type under its stable tag.
    ///
    /// Re-registering the same tag replaces the previous registration.
    pub fn register<T: Record>(&mut self) {
        self.registrations.insert(
            T::TYPE_TAG,
            Registration {
                introspect: TableSchema::from_type::<T>,
                build_table: |schema, path| Box::new(Table::<T>::new(schema, path)),
            },
        );
    }

    /// Returns true if a type is registered under this tag.
    #[must_use]
    pub fn contains(&self, type_tag: &str) -> bool {
        self.registrations.contains_key(type_tag)
    }

    /// Returns the registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.registrations.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Introspects a fresh table schema for a registered tag.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownType`] if the tag has no registration
    /// - Introspection errors from the live type
    pub fn introspect(&self, type_tag: &str) -> SchemaResult<TableSchema> {
        let registration = self
            .registrations
            .get(type_tag)
            .ok_or_else(|| SchemaError::unknown_type(type_tag))?;
        (registration.introspect)()
    }

    /// Builds a table for a stored table schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] if the schema's type tag has no
    /// registration.
    pub fn build_table(
        &self,
        schema: TableSchema,
        path: PathBuf,
    ) -> SchemaResult<Box<dyn AnyTable>> {
        let registration = self
            .registrations
            .get(schema.item_type.as_str())
            .ok_or_else(|| SchemaError::unknown_type(&schema.item_type))?;
        Ok((registration.build_table)(schema, path))
    }
}

impl std::fmt::Debug for RecordRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldDescriptor, RecordId};
    use crate::schema::{FieldKind, FieldType};
    use crate::value::FieldValue;

    #[derive(Debug, Default)]
    struct Player {
        id: RecordId,
        name: String,
    }

    impl Record for Player {
        const TYPE_TAG: &'static str = "Player";

        fn id(&self) -> RecordId {
            self.id
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = id;
        }

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

    #[test]
    fn register_and_introspect() {
        let mut registry = RecordRegistry::new();
        registry.register::<Player>();

        assert!(registry.contains("Player"));
        assert_eq!(registry.tags(), ["Player"]);

        let schema = registry.introspect("Player").unwrap();
        assert_eq!(schema.item_type, "Player");
    }

    #[test]
    fn unknown_tag_fails_fast() {
        let registry = RecordRegistry::new();
        let err = registry.introspect("Ghost").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));
    }

    #[test]
    fn builds_typed_table() {
        let mut registry = RecordRegistry::new();
        registry.register::<Player>();

        let schema = registry.introspect("Player").unwrap();
        let table = registry
            .build_table(schema, PathBuf::from("/tmp/Player_table.json"))
            .unwrap();
        assert_eq!(table.type_tag(), "Player");
        assert!(table.as_any().downcast_ref::<Table<Player>>().is_some());
    }
}
