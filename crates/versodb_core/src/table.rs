//! Per-record-type storage: the document array, identifier counter, and
//! CRUD/query operations bound to one table schema.

use crate::document::{document_id, document_str, Document, TableData};
use crate::error::{DbResult, SchemaError, StorageError, StorageResult};
use crate::record::{FieldAccessor, FieldDescriptor, Record, RecordId, ID_FIELD};
use crate::value::FieldValue;
use serde::Serialize;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A tolerated per-field deserialization failure.
///
/// A single bad field degrades gracefully: the field is skipped, the record
/// is still returned with its other fields populated, and the failure is
/// recorded here (and logged).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Identifier of the affected document (0 if unknown).
    pub record_id: RecordId,
    /// Name of the affected field.
    pub field: String,
    /// What went wrong.
    pub reason: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record {}: field {}: {}",
            self.record_id, self.field, self.reason
        )
    }
}

/// Borrowed view of a table for serialization without cloning documents.
#[derive(Serialize)]
struct TableDataRef<'a> {
    #[serde(rename = "currentID")]
    current_id: RecordId,
    datas: &'a [Document],
}

/// Typed storage for one record type, governed by one [`TableSchema`].
///
/// The table holds the raw document array in memory. Mutating operations
/// ([`Table::create_item`], [`Table::save_item`], [`Table::remove_item`])
/// touch only the in-memory array; persistence is the caller's explicit
/// choice via [`Table::save`], which supports batch-updates-save-once
/// workflows.
///
/// Identifiers are monotonic and never reused, even after removals:
/// `current_id` is strictly the maximum identifier ever issued.
///
/// [`TableSchema`]: crate::schema::TableSchema
#[derive(Debug)]
pub struct Table<T: Record> {
    /// The schema governing which fields (de)serialize.
    schema: crate::schema::TableSchema,
    /// Backing file path.
    path: PathBuf,
    /// All documents, in insertion order.
    documents: Vec<Document>,
    /// The last identifier ever issued.
    current_id: RecordId,
    /// The record type's descriptor table, fetched once.
    descriptors: Vec<FieldDescriptor<T>>,
    /// Tolerated per-field failures recorded during reads.
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<T: Record> Table<T> {
    /// Creates a table bound to a schema and a backing file.
    ///
    /// The caller guarantees the schema belongs to `T`; the facade resolves
    /// schemas to types through the record registry.
    #[must_use]
    pub fn new(schema: crate::schema::TableSchema, path: PathBuf) -> Self {
        debug_assert_eq!(schema.item_type, T::TYPE_TAG);
        Self {
            schema,
            path,
            documents: Vec::new(),
            current_id: 0,
            descriptors: T::descriptors(),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Returns the schema governing this table.
    #[must_use]
    pub fn schema(&self) -> &crate::schema::TableSchema {
        &self.schema
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the raw document array.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Returns the last identifier ever issued.
    #[must_use]
    pub fn current_id(&self) -> RecordId {
        self.current_id
    }

    /// Drains and returns the diagnostics recorded since the last call.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow_mut().drain(..).collect()
    }

    /// Loads the table from its backing file.
    ///
    /// An absent file is not an error: the table initializes empty and the
    /// file is written immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the file exists but does not
    /// parse, or I/O errors.
    pub fn load(&mut self) -> StorageResult<()> {
        if !self.path.exists() {
            self.current_id = 0;
            self.documents.clear();
            self.save()?;
            tracing::debug!(table = T::TYPE_TAG, "initialized empty table");
            return Ok(());
        }

        let text = fs::read_to_string(&self.path)?;
        let data: TableData = serde_json::from_str(&text)
            .map_err(|e| StorageError::corrupt(&self.path, e.to_string()))?;
        self.current_id = data.current_id;
        self.documents = data.datas;
        tracing::debug!(
            table = T::TYPE_TAG,
            documents = self.documents.len(),
            "loaded table"
        );
        Ok(())
    }

    /// Saves the table, overwriting its backing file in full.
    ///
    /// There is no atomic rename or fsync: a crash mid-write can corrupt
    /// the file. This is an accepted risk of the design.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the write.
    pub fn save(&self) -> StorageResult<()> {
        let data = TableDataRef {
            current_id: self.current_id,
            datas: &self.documents,
        };
        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| StorageError::corrupt(&self.path, e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Returns the record with the given identifier, or `None`.
    #[must_use]
    pub fn get_one_by_id(&self, id: RecordId) -> Option<T> {
        self.get_one(|d| document_id(d) == id)
    }

    /// Returns the first record whose document matches the filter, or
    /// `None`. Absence is a normal outcome, not an error.
    pub fn get_one(&self, filter: impl Fn(&Document) -> bool) -> Option<T> {
        self.documents
            .iter()
            .find(|d| filter(d))
            .map(|d| self.load_record(d))
    }

    /// Returns all records whose documents match the filter, in document
    /// order.
    pub fn get_many(&self, filter: impl Fn(&Document) -> bool) -> Vec<T> {
        self.documents
            .iter()
            .filter(|d| filter(d))
            .map(|d| self.load_record(d))
            .collect()
    }

    /// Returns an incremental producer of matching records.
    ///
    /// Each call to `next` scans forward and yields up to `batch_size`
    /// decoded matches, letting a cooperative host interleave long scans
    /// with its own loop. The sequence is finite and restartable only from
    /// the start (call `scan_batches` again).
    pub fn scan_batches<F>(&self, filter: F, batch_size: usize) -> ScanBatches<'_, T, F>
    where
        F: Fn(&Document) -> bool,
    {
        ScanBatches {
            table: self,
            filter,
            position: 0,
            batch_size: batch_size.max(1),
        }
    }

    /// Returns true if a document with this identifier exists.
    #[must_use]
    pub fn id_exists(&self, id: RecordId) -> bool {
        self.documents.iter().any(|d| document_id(d) == id)
    }

    /// Returns true if no document stores `value` under `key`.
    #[must_use]
    pub fn is_unique(&self, key: &str, value: &str) -> bool {
        !self
            .documents
            .iter()
            .any(|d| document_str(d, key) == Some(value))
    }

    /// Assigns the next identifier to the record and stores it.
    ///
    /// Identifiers are strictly increasing and never reused. Does not
    /// persist to disk.
    pub fn create_item(&mut self, record: &mut T) -> RecordId {
        self.current_id += 1;
        record.set_id(self.current_id);
        self.save_item(record, false);
        record.id()
    }

    /// Serializes the record per the backing schema and stores its
    /// document, replacing any existing document with the same identifier.
    ///
    /// A record with identifier 0 is redirected to [`Table::create_item`]
    /// when `authorize_creation` is on. Does not persist to disk.
    pub fn save_item(&mut self, record: &mut T, authorize_creation: bool) {
        if record.id() == 0 && authorize_creation {
            self.create_item(record);
            return;
        }

        let document = self.serialize_record(record);
        let id = record.id();
        // Defensive: the uniqueness invariant means at most one match.
        self.documents.retain(|d| document_id(d) != id);
        self.documents.push(document);
    }

    /// Removes all documents with this identifier.
    ///
    /// Returns true if anything was removed. The identifier is never
    /// reissued. Does not persist to disk.
    pub fn remove_item(&mut self, id: RecordId) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| document_id(d) != id);
        self.documents.len() != before
    }

    /// Serializes one record into a document per the backing schema.
    ///
    /// Every schema field is written: scalars as their string rendering
    /// (null when unset), linked references as `<name>_ID` foreign keys.
    /// A schema field the live type no longer carries writes null and
    /// records a diagnostic.
    pub fn serialize_record(&self, record: &T) -> Document {
        let mut document = Document::new();

        for field in &self.schema.fields {
            if field.field_name == ID_FIELD {
                document.insert(ID_FIELD.to_string(), serde_json::json!(record.id()));
                continue;
            }

            let key = field.document_key();
            match self.descriptor_by_name(&field.field_name) {
                Some(descriptor) => match &descriptor.accessor {
                    FieldAccessor::Link { id, .. } if field.field_type.is_record() => {
                        document.insert(key, serde_json::json!(id(record)));
                    }
                    FieldAccessor::Scalar { get, .. } if !field.field_type.is_record() => {
                        let value = match get(record).render() {
                            Some(s) => serde_json::Value::String(s),
                            None => serde_json::Value::Null,
                        };
                        document.insert(key, value);
                    }
                    _ => {
                        self.record_diagnostic(
                            record.id(),
                            &field.field_name,
                            "schema field kind disagrees with the live type",
                        );
                        document.insert(key, serde_json::Value::Null);
                    }
                },
                None => {
                    self.record_diagnostic(
                        record.id(),
                        &field.field_name,
                        "schema field has no counterpart on the live type",
                    );
                    document.insert(key, serde_json::Value::Null);
                }
            }
        }

        document
    }

    /// Deserializes one document into a record per the backing schema.
    ///
    /// Tolerant-read policy: document keys unknown to the schema are
    /// ignored; schema fields absent, null, or unparseable in this document
    /// are left at their default value with a diagnostic recorded. Linked
    /// references come back as their foreign-key identifier; resolution to
    /// a loaded record is the facade's job.
    pub fn load_record(&self, document: &Document) -> T {
        let mut record = T::default();
        record.set_id(document_id(document));

        for field in &self.schema.fields {
            if field.field_name == ID_FIELD {
                continue;
            }

            let key = field.document_key();
            let Some(descriptor) = self.descriptor_by_name(&field.field_name) else {
                self.record_diagnostic(
                    record.id(),
                    &field.field_name,
                    "schema field has no counterpart on the live type",
                );
                continue;
            };

            let Some(value) = document.get(&key) else {
                self.record_diagnostic(record.id(), &field.field_name, "missing in document");
                continue;
            };

            match &descriptor.accessor {
                FieldAccessor::Link { set_id, .. } if field.field_type.is_record() => {
                    match value.as_u64() {
                        Some(fk) => {
                            if fk != 0 {
                                set_id(&mut record, fk);
                            }
                        }
                        None => {
                            self.record_diagnostic(
                                record.id(),
                                &field.field_name,
                                "foreign key is not an integer",
                            );
                        }
                    }
                }
                FieldAccessor::Scalar { set, .. } if !field.field_type.is_record() => match value {
                    serde_json::Value::String(raw) => {
                        match FieldValue::parse(&field.field_type, raw) {
                            Ok(parsed) => set(&mut record, parsed),
                            Err(e) => {
                                self.record_diagnostic(
                                    record.id(),
                                    &field.field_name,
                                    e.to_string(),
                                );
                            }
                        }
                    }
                    serde_json::Value::Null => {
                        self.record_diagnostic(record.id(), &field.field_name, "null in document");
                    }
                    other => {
                        self.record_diagnostic(
                            record.id(),
                            &field.field_name,
                            format!("expected stored string, found {other}"),
                        );
                    }
                },
                _ => {
                    self.record_diagnostic(
                        record.id(),
                        &field.field_name,
                        "schema field kind disagrees with the live type",
                    );
                }
            }
        }

        record
    }

    fn descriptor_by_name(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    fn record_diagnostic(&self, record_id: RecordId, field: &str, reason: impl Into<String>) {
        let diagnostic = Diagnostic {
            record_id,
            field: field.to_string(),
            reason: reason.into(),
        };
        tracing::warn!(
            table = T::TYPE_TAG,
            record_id,
            field,
            reason = %diagnostic.reason,
            "tolerated field failure"
        );
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

/// Lazy producer of partial query result batches.
///
/// Finite, and restartable only from the start. The host scheduler decides
/// when to yield between batches based on elapsed wall-time; this type
/// assumes no particular thread or scheduling model.
pub struct ScanBatches<'a, T: Record, F> {
    table: &'a Table<T>,
    filter: F,
    position: usize,
    batch_size: usize,
}

impl<T: Record, F: Fn(&Document) -> bool> Iterator for ScanBatches<'_, T, F> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::new();
        while self.position < self.table.documents.len() && batch.len() < self.batch_size {
            let document = &self.table.documents[self.position];
            self.position += 1;
            if (self.filter)(document) {
                batch.push(self.table.load_record(document));
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Type-erased table operations, used by the database facade to hold
/// tables of heterogeneous record types and to wire link resolution
/// across them.
pub trait AnyTable {
    /// Returns the stored record type's tag.
    fn type_tag(&self) -> &'static str;

    /// Loads the table from disk.
    fn load(&mut self) -> StorageResult<()>;

    /// Saves the table to disk.
    fn save(&self) -> StorageResult<()>;

    /// Creates a boxed record, assigning it the next identifier.
    ///
    /// Nested links inside the record are stored as their current
    /// identifiers; they are not followed.
    fn persist_any(&mut self, record: Box<dyn Any>) -> DbResult<RecordId>;

    /// Loads a record by identifier, boxed as `Any`.
    fn get_any(&self, id: RecordId) -> Option<Box<dyn Any>>;

    /// Returns the number of documents.
    fn len(&self) -> usize;

    /// Returns true if the table has no documents.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the last identifier ever issued.
    fn current_id(&self) -> RecordId;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Record> AnyTable for Table<T> {
    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn load(&mut self) -> StorageResult<()> {
        Table::load(self)
    }

    fn save(&self) -> StorageResult<()> {
        Table::save(self)
    }

    fn persist_any(&mut self, record: Box<dyn Any>) -> DbResult<RecordId> {
        let mut record = record
            .downcast::<T>()
            .map_err(|_| SchemaError::unknown_type(T::TYPE_TAG))?;
        Ok(self.create_item(&mut record))
    }

    fn get_any(&self, id: RecordId) -> Option<Box<dyn Any>> {
        self.get_one_by_id(id)
            .map(|record| Box::new(record) as Box<dyn Any>)
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    fn current_id(&self) -> RecordId {
        self.current_id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Link;
    use crate::schema::{FieldKind, FieldType, TableField, TableSchema};
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Player {
        id: RecordId,
        name: String,
        score: i64,
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
                    "Score",
                    FieldType::Int,
                    FieldKind::Plain,
                    |p| p.score.into(),
                    |p, v| {
                        if let FieldValue::Int(i) = v {
                            p.score = i;
                        }
                    },
                ),
            ]
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

    fn player_table(dir: &TempDir) -> Table<Player> {
        Table::new(
            TableSchema::from_type::<Player>().unwrap(),
            dir.path().join("Player_table.json"),
        )
    }

    fn item_table(dir: &TempDir) -> Table<Item> {
        Table::new(
            TableSchema::from_type::<Item>().unwrap(),
            dir.path().join("Item_table.json"),
        )
    }

    #[test]
    fn load_initializes_missing_file() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);

        table.load().unwrap();
        assert_eq!(table.current_id(), 0);
        assert!(table.documents().is_empty());
        // The empty table is written immediately
        assert!(table.path().exists());
    }

    #[test]
    fn load_corrupt_file_fails() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        fs::write(table.path(), "{not json").unwrap();

        let err = table.load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn create_two_items_scenario() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        table.load().unwrap();

        let mut a = Player {
            name: "a".into(),
            ..Player::default()
        };
        let mut b = Player {
            name: "b".into(),
            ..Player::default()
        };
        assert_eq!(table.create_item(&mut a), 1);
        assert_eq!(table.create_item(&mut b), 2);

        let all = table.get_many(|_| true);
        assert_eq!(all.len(), 2);
        assert_eq!((all[0].id, all[0].name.as_str()), (1, "a"));
        assert_eq!((all[1].id, all[1].name.as_str()), (2, "b"));
    }

    #[test]
    fn save_item_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        table.load().unwrap();

        let mut player = Player {
            name: "solo".into(),
            ..Player::default()
        };
        table.create_item(&mut player);
        player.score = 10;
        table.save_item(&mut player, true);
        table.save_item(&mut player, true);

        assert_eq!(table.documents().len(), 1);
        let reloaded = table.get_one_by_id(player.id).unwrap();
        assert_eq!(reloaded.score, 10);
    }

    #[test]
    fn ids_survive_removal() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        table.load().unwrap();

        let mut a = Player::default();
        let mut b = Player::default();
        table.create_item(&mut a);
        table.create_item(&mut b);

        assert!(table.remove_item(a.id));
        assert!(!table.remove_item(a.id));

        let mut c = Player::default();
        assert_eq!(table.create_item(&mut c), 3);
    }

    #[test]
    fn documents_are_stringly_typed() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        table.load().unwrap();

        let mut player = Player {
            name: "s".into(),
            score: 42,
            ..Player::default()
        };
        table.create_item(&mut player);

        let document = &table.documents()[0];
        assert_eq!(document["ID"], serde_json::json!(1));
        assert_eq!(document["Score"], serde_json::json!("42"));
        assert_eq!(document["Name"], serde_json::json!("s"));
    }

    #[test]
    fn missing_field_defaults_with_diagnostic() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        // A historical document written before Score existed
        fs::write(
            tmp.path().join("Player_table.json"),
            serde_json::json!({
                "currentID": 1,
                "datas": [{"ID": 1, "Name": "old"}],
            })
            .to_string(),
        )
        .unwrap();
        table.load().unwrap();

        let player = table.get_one_by_id(1).unwrap();
        assert_eq!(player.name, "old");
        assert_eq!(player.score, 0);

        let diagnostics = table.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].field, "Score");
        assert!(table.take_diagnostics().is_empty());
    }

    #[test]
    fn unknown_document_keys_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        fs::write(
            tmp.path().join("Player_table.json"),
            serde_json::json!({
                "currentID": 1,
                "datas": [{"ID": 1, "Name": "n", "Score": "1", "Legacy": "x"}],
            })
            .to_string(),
        )
        .unwrap();
        table.load().unwrap();

        let player = table.get_one_by_id(1).unwrap();
        assert_eq!(player.name, "n");
        assert!(table.take_diagnostics().is_empty());
    }

    #[test]
    fn unparseable_field_skipped_with_diagnostic() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        fs::write(
            tmp.path().join("Player_table.json"),
            serde_json::json!({
                "currentID": 1,
                "datas": [{"ID": 1, "Name": "n", "Score": "many"}],
            })
            .to_string(),
        )
        .unwrap();
        table.load().unwrap();

        let player = table.get_one_by_id(1).unwrap();
        assert_eq!(player.score, 0);
        assert_eq!(table.take_diagnostics().len(), 1);
    }

    #[test]
    fn linked_field_serializes_as_foreign_key() {
        let tmp = TempDir::new().unwrap();
        let mut items = item_table(&tmp);
        items.load().unwrap();

        let mut item = Item {
            name: "sword".into(),
            owner: Link::Id(7),
            ..Item::default()
        };
        items.create_item(&mut item);

        let document = &items.documents()[0];
        assert_eq!(document["owner_ID"], serde_json::json!(7));
        assert!(document.get("owner").is_none());

        let reloaded = items.get_one_by_id(item.id).unwrap();
        assert_eq!(reloaded.owner, Link::Id(7));
    }

    #[test]
    fn save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        {
            let mut table = player_table(&tmp);
            table.load().unwrap();
            let mut player = Player {
                name: "persisted".into(),
                score: 3,
                ..Player::default()
            };
            table.create_item(&mut player);
            table.save().unwrap();
        }

        let mut table = player_table(&tmp);
        table.load().unwrap();
        assert_eq!(table.current_id(), 1);
        let player = table.get_one_by_id(1).unwrap();
        assert_eq!(player.name, "persisted");
        assert_eq!(player.score, 3);
    }

    #[test]
    fn probes() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        table.load().unwrap();

        let mut player = Player {
            name: "unique".into(),
            ..Player::default()
        };
        table.create_item(&mut player);

        assert!(table.id_exists(1));
        assert!(!table.id_exists(2));
        assert!(!table.is_unique("Name", "unique"));
        assert!(table.is_unique("Name", "other"));
    }

    #[test]
    fn scan_batches_yields_partial_results() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        table.load().unwrap();

        for i in 0..10 {
            let mut player = Player {
                name: format!("p{i}"),
                score: i,
                ..Player::default()
            };
            table.create_item(&mut player);
        }

        let batches: Vec<Vec<Player>> = table
            .scan_batches(|d| document_str(d, "Score") != Some("0"), 4)
            .collect();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 4);
        assert_eq!(batches[1].len(), 4);
        assert_eq!(batches[2].len(), 1);

        let total: usize = batches.iter().map(Vec::len).sum();
        assert_eq!(total, 9);
    }

    #[test]
    fn persist_any_assigns_identifier() {
        let tmp = TempDir::new().unwrap();
        let mut table = player_table(&tmp);
        table.load().unwrap();

        let id = table
            .persist_any(Box::new(Player {
                name: "boxed".into(),
                ..Player::default()
            }))
            .unwrap();
        assert_eq!(id, 1);

        let boxed = table.get_any(1).unwrap();
        let player = boxed.downcast::<Player>().unwrap();
        assert_eq!(player.name, "boxed");
    }

    proptest! {
        #[test]
        fn created_ids_strictly_increase(removals in proptest::collection::vec(any::<bool>(), 1..40)) {
            let tmp = TempDir::new().unwrap();
            let mut table = player_table(&tmp);
            table.load().unwrap();

            let mut last = 0;
            for remove_after in removals {
                let mut player = Player::default();
                let id = table.create_item(&mut player);
                prop_assert!(id > last);
                last = id;
                if remove_after {
                    table.remove_item(id);
                }
            }
        }
    }
}
