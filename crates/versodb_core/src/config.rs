//! Database configuration.

/// Configuration for opening a database.
///
/// The application version string names the schema version that
/// [`crate::SchemaBuilder`] creates when no schema exists yet, mirroring the
/// host application's own version.
#[derive(Debug, Clone)]
pub struct Config {
    /// Version string of the host application.
    pub app_version: String,

    /// Whether to create the database directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to switch to the latest schema version on load, instead of
    /// pinning to the version recorded in the database state file.
    pub auto_update: bool,

    /// Name of the subdirectory holding schema version files.
    pub schemas_folder: String,

    /// Name of the subdirectory holding table files.
    pub tables_folder: String,

    /// File name prefix for schema version files.
    pub schema_file_prefix: String,

    /// File name suffix for table files.
    pub table_file_suffix: String,

    /// File name (without extension) of the database state file.
    pub database_file_name: String,

    /// Number of matching records yielded per batch by incremental scans.
    pub scan_batch_size: usize,
}

impl Config {
    /// Creates a configuration with default layout names for the given
    /// application version.
    #[must_use]
    pub fn new(app_version: impl Into<String>) -> Self {
        Self {
            app_version: app_version.into(),
            create_if_missing: true,
            auto_update: true,
            schemas_folder: "Schemas".to_string(),
            tables_folder: "Tables".to_string(),
            schema_file_prefix: "schema_v".to_string(),
            table_file_suffix: "_table".to_string(),
            database_file_name: "database".to_string(),
            scan_batch_size: 64,
        }
    }

    /// Sets whether to create the database directory if missing.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to auto-update to the latest schema version on load.
    #[must_use]
    pub fn auto_update(mut self, value: bool) -> Self {
        self.auto_update = value;
        self
    }

    /// Sets the schema file prefix.
    #[must_use]
    pub fn schema_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.schema_file_prefix = prefix.into();
        self
    }

    /// Sets the table file suffix.
    #[must_use]
    pub fn table_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.table_file_suffix = suffix.into();
        self
    }

    /// Sets the incremental scan batch size.
    ///
    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn scan_batch_size(mut self, size: usize) -> Self {
        self.scan_batch_size = size.max(1);
        self
    }
}
