//! CLI command implementations.
//!
//! Commands that read the database work on the raw JSON files, never
//! through a loaded [`versodb_core::Database`]: the CLI has no record
//! type registrations and must not take the directory lock away from a
//! running application.

pub mod create_version;
pub mod inspect;
pub mod verify;
pub mod versions;

use std::path::{Path, PathBuf};

/// Default layout names, matching [`versodb_core::Config::new`].
pub const SCHEMAS_FOLDER: &str = "Schemas";
/// Table file subdirectory.
pub const TABLES_FOLDER: &str = "Tables";
/// Schema file name prefix.
pub const SCHEMA_FILE_PREFIX: &str = "schema_v";
/// Table file name suffix (before the `.json` extension).
pub const TABLE_FILE_SUFFIX: &str = "_table";
/// Database state file name.
pub const DATABASE_FILE: &str = "database.json";

/// Returns the schemas directory under a database path.
pub fn schemas_dir(path: &Path) -> PathBuf {
    path.join(SCHEMAS_FOLDER)
}

/// Returns the tables directory under a database path.
pub fn tables_dir(path: &Path) -> PathBuf {
    path.join(TABLES_FOLDER)
}

/// Reads the `currentVersion` recorded in `database.json`, if any.
pub fn recorded_version(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path.join(DATABASE_FILE)).ok()?;
    let value: serde_json::Value = serde_json::from_str(&text).ok()?;
    value
        .get("currentVersion")
        .and_then(serde_json::Value::as_str)
        .map(String::from)
}
