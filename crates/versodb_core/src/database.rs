//! The database facade: wires settings, schema builder, and tables
//! together and owns the load lifecycle.

use crate::config::Config;
use crate::dir::DatabaseDir;
use crate::document::Document;
use crate::error::{DbError, DbResult, SchemaError, StorageError, StorageResult};
use crate::record::{resolve_links, FieldAccessor, LinkResolver, Record, RecordId};
use crate::registry::RecordRegistry;
use crate::schema::{SchemaBuilder, TableSchema};
use crate::table::{AnyTable, ScanBatches, Table};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Persisted database state: `{currentVersion}` in `database.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DatabaseState {
    /// The schema version the database last ran against.
    #[serde(rename = "currentVersion")]
    current_version: Option<String>,
}

/// An embedded, file-backed document store with a versioned schema.
///
/// One `Database` owns one directory, one active schema version, and one
/// [`Table`] per record type named by that schema. The single active
/// mutator model applies: no internal locking beyond the directory's
/// advisory lock, no transactions.
///
/// # Example
///
/// ```rust,ignore
/// let mut db = Database::open(Path::new("game_db"), Config::new("1.0"))?;
/// db.register::<Player>();
/// db.load()?;
///
/// let mut player = Player { name: "Shuckle".into(), ..Player::default() };
/// db.create_record(&mut player)?;
/// ```
pub struct Database {
    config: Config,
    dir: DatabaseDir,
    registry: RecordRegistry,
    builder: SchemaBuilder,
    tables: HashMap<String, Box<dyn AnyTable>>,
    state: DatabaseState,
    loaded: bool,
}

impl Database {
    /// Opens a database directory and its schema version catalog.
    ///
    /// Record types must be registered and [`Database::load`] called before
    /// any table access.
    ///
    /// # Errors
    ///
    /// Directory, lock, and schema catalog errors.
    pub fn open(path: &Path, config: Config) -> DbResult<Self> {
        let dir = DatabaseDir::open(path, &config)?;
        let builder = SchemaBuilder::new(dir.schemas_dir(), &config)?;
        let state = read_state(&dir, &config)?;

        Ok(Self {
            config,
            dir,
            registry: RecordRegistry::new(),
            builder,
            tables: HashMap::new(),
            state,
            loaded: false,
        })
    }

    /// Registers a storable record type.
    ///
    /// Every type named by the active schema must be registered before
    /// [`Database::load`]; a stored tag without a registration is skipped
    /// at load with an error logged.
    pub fn register<T: Record>(&mut self) {
        self.registry.register::<T>();
    }

    /// Loads the database: picks the governing schema version, builds a
    /// table per table schema, and loads each table's documents.
    ///
    /// With `auto_update` off and a recorded version in `database.json`,
    /// that version is loaded instead of the latest. The recorded version
    /// is updated to whatever ends up active.
    ///
    /// # Errors
    ///
    /// - [`DbError::AlreadyLoaded`] on a second call
    /// - Schema load errors, table file errors
    pub fn load(&mut self) -> DbResult<()> {
        if self.loaded {
            return Err(DbError::AlreadyLoaded);
        }

        if !self.config.auto_update {
            if let Some(version) = self.state.current_version.clone() {
                self.builder.load_schema(&version)?;
            }
        }

        self.state.current_version = Some(self.builder.active_schema().version.clone());
        self.save_state()?;

        for table_schema in self.builder.active_schema().table_schemas.clone() {
            let tag = table_schema.item_type.clone();
            let path = self.dir.table_path(&tag, &self.config);
            match self.registry.build_table(table_schema, path) {
                Ok(mut table) => {
                    table.load()?;
                    self.tables.insert(tag, table);
                }
                Err(e) => {
                    tracing::error!(table = %tag, error = %e, "failed to build table, skipping");
                }
            }
        }

        self.loaded = true;
        tracing::debug!(
            version = %self.builder.active_schema().version,
            tables = self.tables.len(),
            "database loaded"
        );
        Ok(())
    }

    /// Returns true once [`Database::load`] has run.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns the schema version catalog and active schema.
    #[must_use]
    pub fn schema_builder(&self) -> &SchemaBuilder {
        &self.builder
    }

    /// Returns the schema builder for mutation (schema edits, version
    /// creation, saves).
    pub fn schema_builder_mut(&mut self) -> &mut SchemaBuilder {
        &mut self.builder
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the tags of all loaded tables, sorted.
    #[must_use]
    pub fn table_tags(&self) -> Vec<&str> {
        let mut tags: Vec<_> = self.tables.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Returns the table for `T`.
    ///
    /// # Errors
    ///
    /// - [`DbError::NotLoaded`] before [`Database::load`]
    /// - [`SchemaError::TableNotFound`] if the active schema has no table
    ///   for `T`
    pub fn table<T: Record>(&self) -> DbResult<&Table<T>> {
        if !self.loaded {
            return Err(DbError::NotLoaded);
        }
        self.tables
            .get(T::TYPE_TAG)
            .and_then(|t| t.as_any().downcast_ref::<Table<T>>())
            .ok_or_else(|| SchemaError::table_not_found(T::TYPE_TAG).into())
    }

    /// Returns the table for `T`, mutably.
    ///
    /// # Errors
    ///
    /// - [`DbError::NotLoaded`] before [`Database::load`]
    /// - [`SchemaError::TableNotFound`] if the active schema has no table
    ///   for `T`
    pub fn table_mut<T: Record>(&mut self) -> DbResult<&mut Table<T>> {
        if !self.loaded {
            return Err(DbError::NotLoaded);
        }
        self.tables
            .get_mut(T::TYPE_TAG)
            .and_then(|t| t.as_any_mut().downcast_mut::<Table<T>>())
            .ok_or_else(|| SchemaError::table_not_found(T::TYPE_TAG).into())
    }

    /// Adds a table for a registered type to the active schema and builds
    /// its (empty) table.
    ///
    /// The schema edit is in-memory; persist it explicitly through
    /// [`Database::schema_builder_mut`].
    ///
    /// # Errors
    ///
    /// - [`SchemaError::DuplicateTable`] if the active schema already has a
    ///   table for `T`
    /// - Introspection and table file errors
    pub fn create_table<T: Record>(&mut self) -> DbResult<()> {
        let table_schema = TableSchema::from_type::<T>()?;
        self.builder
            .active_schema_mut()
            .add_table_schema(table_schema.clone())?;

        let path = self.dir.table_path(T::TYPE_TAG, &self.config);
        let mut table = Table::<T>::new(table_schema, path);
        table.load()?;
        self.tables.insert(T::TYPE_TAG.to_string(), Box::new(table));
        Ok(())
    }

    /// Saves a record: lazily persists attached-but-unsaved linked records
    /// into their own tables, stores the record's document, and saves the
    /// table file.
    ///
    /// # Errors
    ///
    /// Table lookup and file errors.
    pub fn save_record<T: Record>(&mut self, record: &mut T) -> DbResult<()> {
        self.persist_links(record)?;
        let table = self.table_mut::<T>()?;
        table.save_item(record, true);
        table.save()?;
        Ok(())
    }

    /// Creates a record, assigning it the next identifier, then saves its
    /// table file. Returns the assigned identifier.
    ///
    /// # Errors
    ///
    /// Table lookup and file errors.
    pub fn create_record<T: Record>(&mut self, record: &mut T) -> DbResult<RecordId> {
        self.persist_links(record)?;
        let table = self.table_mut::<T>()?;
        let id = table.create_item(record);
        table.save()?;
        Ok(id)
    }

    /// Loads a record by identifier with its linked fields resolved one
    /// level deep.
    ///
    /// # Errors
    ///
    /// Table lookup errors; a missing record is `Ok(None)`.
    pub fn get_record<T: Record>(&self, id: RecordId) -> DbResult<Option<T>> {
        let Some(mut record) = self.table::<T>()?.get_one_by_id(id) else {
            return Ok(None);
        };
        resolve_links(&mut record, self)?;
        Ok(Some(record))
    }

    /// Returns an incremental scan over `T`'s table using the configured
    /// batch size.
    ///
    /// # Errors
    ///
    /// Table lookup errors.
    pub fn scan<T, F>(&self, filter: F) -> DbResult<ScanBatches<'_, T, F>>
    where
        T: Record,
        F: Fn(&Document) -> bool,
    {
        Ok(self
            .table::<T>()?
            .scan_batches(filter, self.config.scan_batch_size))
    }

    /// Saves every loaded table's file.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub fn save_all(&self) -> StorageResult<()> {
        for table in self.tables.values() {
            table.save()?;
        }
        Ok(())
    }

    fn persist_links<T: Record>(&mut self, record: &mut T) -> DbResult<()> {
        for descriptor in T::descriptors() {
            let FieldAccessor::Link {
                target,
                id,
                set_id,
                take_unsaved,
                ..
            } = descriptor.accessor
            else {
                continue;
            };

            if id(record) != 0 {
                continue;
            }
            let Some(boxed) = take_unsaved(record) else {
                continue;
            };

            let table = self
                .tables
                .get_mut(target)
                .ok_or_else(|| SchemaError::table_not_found(target))?;
            let new_id = table.persist_any(boxed)?;
            table.save()?;
            set_id(record, new_id);
            tracing::debug!(
                field = descriptor.name,
                target_tag = target,
                id = new_id,
                "lazily persisted linked record"
            );
        }
        Ok(())
    }

    fn save_state(&self) -> StorageResult<()> {
        let path = self.dir.state_file_path(&self.config);
        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| StorageError::corrupt(&path, e.to_string()))?;
        fs::write(&path, json)?;
        Ok(())
    }
}

impl LinkResolver for Database {
    fn resolve(&self, target: &str, id: RecordId) -> DbResult<Option<Box<dyn Any>>> {
        let table = self
            .tables
            .get(target)
            .ok_or_else(|| SchemaError::table_not_found(target))?;
        Ok(table.get_any(id))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.dir.path())
            .field("version", &self.builder.active_schema().version)
            .field("tables", &self.table_tags())
            .field("loaded", &self.loaded)
            .finish()
    }
}

fn read_state(dir: &DatabaseDir, config: &Config) -> DbResult<DatabaseState> {
    let path = dir.state_file_path(config);
    if !path.exists() {
        return Ok(DatabaseState::default());
    }
    let text = fs::read_to_string(&path).map_err(StorageError::from)?;
    if text.trim().is_empty() {
        return Ok(DatabaseState::default());
    }
    let state = serde_json::from_str(&text)
        .map_err(|e| StorageError::corrupt(&path, e.to_string()))?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldDescriptor, Link};
    use crate::schema::{FieldKind, FieldType};
    use crate::value::FieldValue;
    use tempfile::TempDir;

    #[derive(Debug, Default, Clone, PartialEq)]
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

    #[derive(Debug, Default)]
    struct Item {
        id: RecordId,
        name: String,
        owner: Link<Player>,
    }

    impl Record for Item {
        const TYPE_TAG: &'static str = "Item";

        fn id(&self) -> RecordId {
            self.id
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = id;
        }

        fn descriptors() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::scalar(
                    "Name",
                    FieldType::Text,
                    FieldKind::Plain,
                    |i| i.name.clone().into(),
                    |i, v| {
                        if let FieldValue::Text(s) = v {
                            i.name = s;
                        }
                    },
                ),
                FieldDescriptor::link(
                    "owner",
                    Player::TYPE_TAG,
                    FieldKind::Plain,
                    |i| i.owner.id(),
                    |i, id| i.owner = Link::Id(id),
                    |i| i.owner.take_unsaved().map(|p| Box::new(p) as Box<dyn Any>),
                    |i, boxed| {
                        if let Ok(player) = boxed.downcast::<Player>() {
                            i.owner = Link::Loaded(*player);
                        }
                    },
                ),
            ]
        }
    }

    fn open_db(path: &Path, version: &str) -> Database {
        let mut db = Database::open(path, Config::new(version)).unwrap();
        db.register::<Player>();
        db.register::<Item>();
        db
    }

    #[test]
    fn fresh_database_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let mut db = open_db(tmp.path(), "1.0");
        db.load().unwrap();

        assert!(db.is_loaded());
        assert_eq!(db.schema_builder().active_schema().version, "1.0");
        // Recorded in database.json
        let state = fs::read_to_string(tmp.path().join("database.json")).unwrap();
        assert!(state.contains("\"currentVersion\": \"1.0\""));
    }

    #[test]
    fn table_access_requires_load() {
        let tmp = TempDir::new().unwrap();
        let db = open_db(tmp.path(), "1.0");
        assert!(matches!(
            db.table::<Player>().unwrap_err(),
            DbError::NotLoaded
        ));
    }

    #[test]
    fn double_load_fails() {
        let tmp = TempDir::new().unwrap();
        let mut db = open_db(tmp.path(), "1.0");
        db.load().unwrap();
        assert!(matches!(db.load().unwrap_err(), DbError::AlreadyLoaded));
    }

    #[test]
    fn records_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let mut db = open_db(tmp.path(), "1.0");
            db.load().unwrap();
            db.create_table::<Player>().unwrap();
            db.schema_builder_mut().save_active_schema().unwrap();

            let mut player = Player {
                name: "Red".into(),
                ..Player::default()
            };
            db.create_record(&mut player).unwrap();
            assert_eq!(player.id, 1);
        }

        let mut db = open_db(tmp.path(), "1.0");
        db.load().unwrap();
        let player: Player = db.get_record(1).unwrap().unwrap();
        assert_eq!(player.name, "Red");
    }

    #[test]
    fn unregistered_table_is_skipped() {
        let tmp = TempDir::new().unwrap();
        {
            let mut db = open_db(tmp.path(), "1.0");
            db.load().unwrap();
            db.create_table::<Player>().unwrap();
            // Hand-add a table schema for a type this process never registers
            db.schema_builder_mut()
                .active_schema_mut()
                .add_table_schema(TableSchema {
                    item_type: "Ghost".into(),
                    fields: vec![],
                })
                .unwrap();
            db.schema_builder_mut().save_active_schema().unwrap();
        }

        let mut db = Database::open(tmp.path(), Config::new("1.0")).unwrap();
        db.register::<Player>();
        db.load().unwrap();

        assert_eq!(db.table_tags(), ["Player"]);
    }

    #[test]
    fn pinned_version_without_auto_update() {
        let tmp = TempDir::new().unwrap();
        {
            let mut db = open_db(tmp.path(), "1.0");
            db.load().unwrap();
            db.create_table::<Player>().unwrap();
            db.schema_builder_mut().save_active_schema().unwrap();
        }
        {
            // A newer schema version appears
            let mut db = open_db(tmp.path(), "2.0");
            db.schema_builder_mut()
                .create_schema_for_current_version(None)
                .unwrap();
            db.schema_builder_mut().save_active_schema().unwrap();
        }

        let mut db =
            Database::open(tmp.path(), Config::new("2.0").auto_update(false)).unwrap();
        db.register::<Player>();
        db.load().unwrap();
        // Pinned to the version recorded in database.json
        assert_eq!(db.schema_builder().active_schema().version, "1.0");
    }

    #[test]
    fn linked_record_lazily_persists_and_resolves() {
        let tmp = TempDir::new().unwrap();
        let mut db = open_db(tmp.path(), "1.0");
        db.load().unwrap();
        db.create_table::<Player>().unwrap();
        db.create_table::<Item>().unwrap();

        let mut item = Item {
            name: "sword".into(),
            owner: Link::Loaded(Player {
                name: "Blue".into(),
                ..Player::default()
            }),
            ..Item::default()
        };
        db.create_record(&mut item).unwrap();

        // The owner went into the Player table first
        assert_eq!(item.owner.id(), 1);
        let owner: Player = db.get_record(1).unwrap().unwrap();
        assert_eq!(owner.name, "Blue");

        // And the item's document carries the foreign key, not a copy
        let stored = &db.table::<Item>().unwrap().documents()[0];
        assert_eq!(stored["owner_ID"], serde_json::json!(1));

        // Resolution brings back the same player by identifier
        let resolved: Item = db.get_record(item.id).unwrap().unwrap();
        assert_eq!(resolved.owner.get().unwrap().name, "Blue");
    }

    #[test]
    fn scan_uses_configured_batch_size() {
        let tmp = TempDir::new().unwrap();
        let mut db = Database::open(
            tmp.path(),
            Config::new("1.0").scan_batch_size(2),
        )
        .unwrap();
        db.register::<Player>();
        db.load().unwrap();
        db.create_table::<Player>().unwrap();

        for i in 0..5 {
            let mut player = Player {
                name: format!("p{i}"),
                ..Player::default()
            };
            db.create_record(&mut player).unwrap();
        }

        let batches: Vec<Vec<Player>> = db.scan::<Player, _>(|_| true).unwrap().collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[2].len(), 1);
    }
}
