//! Database directory management.
//!
//! This module handles the file system layout for VersoDB:
//!
//! ```text
//! <db_path>/
//! ├─ LOCK                         # Advisory lock for single-writer
//! ├─ database.json                # Database state (current schema version)
//! ├─ Schemas/
//! │  └─ schema_v<version>.json    # One file per schema version
//! └─ Tables/
//!    └─ <TypeTag>_table.json      # One file per record type
//! ```
//!
//! The LOCK file realizes the single active mutator discipline: only one
//! process may hold a database directory open for writing at a time. Table
//! and schema writes are whole-file overwrites with no atomic rename or
//! fsync guarantee; a crash mid-write can corrupt the file being written.

use crate::config::Config;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Name of the advisory lock file.
const LOCK_FILE: &str = "LOCK";

/// Manages the database directory structure and file locking.
///
/// Holds an exclusive advisory lock for its whole lifetime; only one
/// `DatabaseDir` instance can exist per directory at a time.
#[derive(Debug)]
pub struct DatabaseDir {
    /// Root directory path.
    path: PathBuf,
    /// Schema version files directory.
    schemas_dir: PathBuf,
    /// Table files directory.
    tables_dir: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl DatabaseDir {
    /// Opens or creates a database directory per the configured layout.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is off
    /// - Another process holds the lock (returns [`StorageError::Locked`])
    /// - I/O errors occur
    pub fn open(path: &Path, config: &Config) -> StorageResult<Self> {
        if !path.exists() {
            if config.create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(StorageError::not_found(path));
            }
        }

        if !path.is_dir() {
            return Err(StorageError::corrupt(path, "path is not a directory"));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked {
                path: path.to_path_buf(),
            });
        }

        let schemas_dir = path.join(&config.schemas_folder);
        let tables_dir = path.join(&config.tables_folder);
        fs::create_dir_all(&schemas_dir)?;
        fs::create_dir_all(&tables_dir)?;

        tracing::debug!(path = %path.display(), "opened database directory");

        Ok(Self {
            path: path.to_path_buf(),
            schemas_dir,
            tables_dir,
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the database directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the schema version files directory.
    #[must_use]
    pub fn schemas_dir(&self) -> &Path {
        &self.schemas_dir
    }

    /// Returns the path to the table files directory.
    #[must_use]
    pub fn tables_dir(&self) -> &Path {
        &self.tables_dir
    }

    /// Returns the path of the database state file.
    #[must_use]
    pub fn state_file_path(&self, config: &Config) -> PathBuf {
        self.path
            .join(format!("{}.json", config.database_file_name))
    }

    /// Returns the path of the table file for a record type tag.
    #[must_use]
    pub fn table_path(&self, type_tag: &str, config: &Config) -> PathBuf {
        self.tables_dir
            .join(format!("{}{}.json", type_tag, config.table_file_suffix))
    }
}
