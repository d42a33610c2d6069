//! # VersoDB Core
//!
//! An embedded, file-backed document store with explicit schema
//! versioning.
//!
//! A VersoDB database is a directory of plain JSON files: one schema file
//! per schema version under `Schemas/`, one table file per record type
//! under `Tables/`, and a `database.json` state file recording which
//! version the database last ran against. Record types declare their
//! persisted shape through a static field-descriptor table; the schema
//! files, not the live types, govern what each table reads and writes.
//!
//! ## Design Principles
//!
//! - Human-diffable storage: pretty-printed JSON, whole-file overwrites,
//!   no binary formats
//! - Explicit versioning: schema evolution happens by deriving a new
//!   version file, never by mutating an old one
//! - Tolerant reads: a single bad field degrades to a default plus a
//!   [`Diagnostic`], never a failed load
//! - Single active mutator: one process holds the directory lock, no
//!   transactions, no internal locking
//!
//! ## Example
//!
//! ```rust,ignore
//! use versodb_core::{Config, Database};
//!
//! let mut db = Database::open(Path::new("game_db"), Config::new("1.0"))?;
//! db.register::<Player>();
//! db.load()?;
//!
//! let mut player = Player { name: "Shuckle".into(), ..Player::default() };
//! let id = db.create_record(&mut player)?;
//! let loaded: Option<Player> = db.get_record(id)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod dir;
mod document;
mod error;
mod record;
mod registry;
pub mod schema;
mod table;
mod value;

pub use config::Config;
pub use database::Database;
pub use dir::DatabaseDir;
pub use document::{document_id, document_str, Document, TableData};
pub use error::{
    DbError, DbResult, SchemaError, SchemaResult, StorageError, StorageResult,
};
pub use record::{
    resolve_links, FieldAccessor, FieldDescriptor, Link, LinkResolver, Record, RecordId,
    ID_FIELD,
};
pub use registry::RecordRegistry;
pub use schema::{FieldKind, FieldType, Schema, SchemaBuilder, TableField, TableSchema};
pub use table::{AnyTable, Diagnostic, ScanBatches, Table};
pub use value::{FieldValue, ValueParseError};
