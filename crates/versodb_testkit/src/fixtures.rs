//! Test fixtures and database helpers.
//!
//! Provides record types with hand-written descriptor tables and
//! convenience wrappers for setting up temporary databases.

use std::any::Any;
use std::path::Path;
use tempfile::TempDir;
use versodb_core::{
    Config, Database, FieldDescriptor, FieldKind, FieldType, FieldValue, Link, Record, RecordId,
};

/// A player with the three scalar kinds plus a property-backed flag.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Player {
    /// Assigned identifier (0 until first save).
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Experience level.
    pub level: i64,
    /// Whether the account is premium.
    pub premium: bool,
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
        vec![
            FieldDescriptor::scalar(
                "Name",
                FieldType::Text,
                FieldKind::Plain,
                |p| p.name.clone().into(),
                |p, v| {
                    if let FieldValue::Text(s) = v {
                        p.name = s;
                    }
                },
            ),
            FieldDescriptor::scalar(
                "Level",
                FieldType::Int,
                FieldKind::Plain,
                |p| p.level.into(),
                |p, v| {
                    if let FieldValue::Int(i) = v {
                        p.level = i;
                    }
                },
            ),
            FieldDescriptor::scalar(
                "Premium",
                FieldType::Bool,
                FieldKind::Property,
                |p| p.premium.into(),
                |p, v| {
                    if let FieldValue::Bool(b) = v {
                        p.premium = b;
                    }
                },
            ),
        ]
    }
}

/// An inventory item holding a linked reference to its owning [`Player`].
#[derive(Debug, Default)]
pub struct GameItem {
    /// Assigned identifier (0 until first save).
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Remaining durability.
    pub durability: f64,
    /// The owning player, persisted as a foreign key.
    pub owner: Link<Player>,
}

impl Record for GameItem {
    const TYPE_TAG: &'static str = "GameItem";

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
            FieldDescriptor::scalar(
                "Durability",
                FieldType::Float,
                FieldKind::Plain,
                |i| i.durability.into(),
                |i, v| {
                    if let FieldValue::Float(f) = v {
                        i.durability = f;
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

/// A temporary on-disk database with the fixture types registered.
///
/// The backing directory is deleted on drop.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// Kept alive so the directory outlives the database.
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Opens a fresh database in a temporary directory without loading it.
    ///
    /// [`Player`] and [`GameItem`] are registered; nothing is loaded, so
    /// the test controls the full lifecycle.
    pub fn open(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let mut db = Database::open(temp_dir.path(), config).expect("failed to open database");
        db.register::<Player>();
        db.register::<GameItem>();
        Self { db, temp_dir }
    }

    /// Opens, loads, and ensures tables for both fixture types exist in
    /// the active schema (saving the schema when it had to change).
    pub fn loaded(app_version: &str) -> Self {
        let mut test_db = Self::open(Config::new(app_version));
        test_db.db.load().expect("failed to load database");
        ensure_fixture_tables(&mut test_db.db);
        test_db
    }

    /// Returns the database directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Drops the open database (releasing the directory lock) and opens
    /// the same directory again with a new configuration.
    ///
    /// The reopened database is registered but not loaded.
    pub fn reopen(self, config: Config) -> Self {
        let Self { db, temp_dir } = self;
        drop(db);

        let mut db = Database::open(temp_dir.path(), config).expect("failed to reopen database");
        db.register::<Player>();
        db.register::<GameItem>();
        Self { db, temp_dir }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl std::ops::DerefMut for TestDatabase {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}

/// Adds tables for both fixture types when the active schema lacks them,
/// persisting the schema if it changed.
pub fn ensure_fixture_tables(db: &mut Database) {
    let mut changed = false;

    if db
        .schema_builder()
        .active_schema()
        .get_table_schema(Player::TYPE_TAG)
        .is_none()
    {
        db.create_table::<Player>().expect("failed to add Player table");
        changed = true;
    }
    if db
        .schema_builder()
        .active_schema()
        .get_table_schema(GameItem::TYPE_TAG)
        .is_none()
    {
        db.create_table::<GameItem>()
            .expect("failed to add GameItem table");
        changed = true;
    }

    if changed {
        db.schema_builder()
            .save_active_schema()
            .expect("failed to save schema");
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// A loaded database pre-populated with `count` players named `p0..`.
    pub fn populated_database(count: usize) -> TestDatabase {
        let mut test_db = TestDatabase::loaded("1.0");
        for i in 0..count {
            let mut player = Player {
                name: format!("p{i}"),
                level: i as i64,
                ..Player::default()
            };
            test_db
                .db
                .create_record(&mut player)
                .expect("failed to create player");
        }
        test_db
    }

    /// A loaded database with one player owning `count` items.
    pub fn player_with_items(count: usize) -> (TestDatabase, RecordId) {
        let mut test_db = TestDatabase::loaded("1.0");
        let mut player = Player {
            name: "owner".into(),
            ..Player::default()
        };
        let player_id = test_db
            .db
            .create_record(&mut player)
            .expect("failed to create player");

        for i in 0..count {
            let mut item = GameItem {
                name: format!("item{i}"),
                durability: 1.0,
                owner: Link::Id(player_id),
                ..GameItem::default()
            };
            test_db
                .db
                .create_record(&mut item)
                .expect("failed to create item");
        }

        (test_db, player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_database_has_fixture_tables() {
        let test_db = TestDatabase::loaded("1.0");
        assert_eq!(test_db.table_tags(), ["GameItem", "Player"]);
    }

    #[test]
    fn populated_scenario_counts() {
        let test_db = scenarios::populated_database(4);
        let table = test_db.table::<Player>().unwrap();
        assert_eq!(table.documents().len(), 4);
        assert_eq!(table.current_id(), 4);
    }

    #[test]
    fn player_with_items_links_by_id() {
        let (test_db, player_id) = scenarios::player_with_items(2);
        let items = test_db
            .table::<GameItem>()
            .unwrap()
            .get_many(|d| versodb_core::document_id(d) != 0);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.owner.id() == player_id));
    }
}
