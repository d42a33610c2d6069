//! Error types for VersoDB core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for facade-level operations that may hit either taxonomy.
pub type DbResult<T> = Result<T, DbError>;

/// Structural errors in schema management.
///
/// These indicate a programmer error or an inconsistent schema edit and are
/// always surfaced to the caller, never swallowed.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A record type does not satisfy the storable contract.
    #[error("type {type_tag} is not storable: {message}")]
    NotStorable {
        /// Stable tag of the offending type.
        type_tag: String,
        /// Description of the violated requirement.
        message: String,
    },

    /// A field with the same name already exists in the table schema.
    #[error("table {table} already contains a field named {field}")]
    DuplicateField {
        /// Tag of the table's record type.
        table: String,
        /// Name of the conflicting field.
        field: String,
    },

    /// No field with the given name exists in the table schema.
    #[error("table {table} doesn't contain a field named {field}")]
    FieldNotFound {
        /// Tag of the table's record type.
        table: String,
        /// Name of the missing field.
        field: String,
    },

    /// A table schema for the same record type already exists.
    #[error("schema already contains a table of type {table}")]
    DuplicateTable {
        /// Tag of the conflicting record type.
        table: String,
    },

    /// No table schema exists for the record type.
    #[error("no table of type {table} found in this schema")]
    TableNotFound {
        /// Tag of the missing record type.
        table: String,
    },

    /// A schema file for this version already exists.
    #[error("impossible to create a schema for version {version}, it already exists")]
    VersionAlreadyExists {
        /// The version string.
        version: String,
    },

    /// No schema file exists for this version.
    #[error("no schema found for version {version}")]
    VersionNotFound {
        /// The version string.
        version: String,
    },

    /// A stored type tag has no registered record type.
    #[error("no record type registered for tag {type_tag}")]
    UnknownType {
        /// The unresolved tag.
        type_tag: String,
    },
}

impl SchemaError {
    /// Creates a not-storable error.
    pub fn not_storable(type_tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotStorable {
            type_tag: type_tag.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate field error.
    pub fn duplicate_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Creates a field not found error.
    pub fn field_not_found(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Creates a duplicate table error.
    pub fn duplicate_table(table: impl Into<String>) -> Self {
        Self::DuplicateTable {
            table: table.into(),
        }
    }

    /// Creates a table not found error.
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Creates a version already exists error.
    pub fn version_already_exists(version: impl Into<String>) -> Self {
        Self::VersionAlreadyExists {
            version: version.into(),
        }
    }

    /// Creates a version not found error.
    pub fn version_not_found(version: impl Into<String>) -> Self {
        Self::VersionNotFound {
            version: version.into(),
        }
    }

    /// Creates an unknown type error.
    pub fn unknown_type(type_tag: impl Into<String>) -> Self {
        Self::UnknownType {
            type_tag: type_tag.into(),
        }
    }
}

/// File-level errors for schema version files and table files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file exists but does not parse as its expected format.
    #[error("corrupt file {path}: {message}")]
    Corrupt {
        /// Path of the unparseable file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// A required file or directory is absent.
    #[error("not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Another process holds the database lock.
    #[error("database locked: another process has exclusive access to {path}")]
    Locked {
        /// The locked database directory.
        path: PathBuf,
    },
}

impl StorageError {
    /// Creates a corrupt file error.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

/// Errors surfaced by the database facade.
#[derive(Debug, Error)]
pub enum DbError {
    /// Schema management error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// File storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The database was already loaded; use a fresh instance to reload.
    #[error("database already loaded")]
    AlreadyLoaded,

    /// The database must be loaded before this operation.
    #[error("database not loaded")]
    NotLoaded,
}
