//! Schema version lifecycle: the on-disk version catalog and the active
//! schema.

use crate::config::Config;
use crate::error::{DbResult, SchemaError, StorageError, StorageResult};
use crate::schema::Schema;
use std::fs;
use std::path::{Path, PathBuf};

/// Owns the set of schema version files on disk and the currently active
/// [`Schema`].
///
/// Construction runs the initialization state machine: if version files
/// exist, the latest one is loaded; otherwise a fresh, unsaved schema is
/// created for the configured application version. The unsaved schema is
/// still visible in the catalog, so a freshly created version can be listed
/// before its file is ever written.
///
/// "Latest" is the lexicographic maximum of the version strings. This is
/// not semantic-version aware: non-padded numeric versions sort unexpectedly
/// (`"1.10" < "1.9"` bytewise). Callers needing numeric ordering must pad
/// their version strings.
#[derive(Debug)]
pub struct SchemaBuilder {
    /// Directory holding schema version files.
    schemas_dir: PathBuf,
    /// File name prefix for version files.
    prefix: String,
    /// The host application's version string.
    app_version: String,
    /// Catalog of known versions, sorted.
    available_versions: Vec<String>,
    /// The schema version currently governing reads and writes.
    active: Schema,
}

impl SchemaBuilder {
    /// Opens the version catalog and initializes the active schema.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if the schemas directory is absent
    /// - [`StorageError::Corrupt`] if the latest version file does not parse
    /// - I/O errors while scanning or reading
    pub fn new(schemas_dir: &Path, config: &Config) -> DbResult<Self> {
        if !schemas_dir.is_dir() {
            return Err(StorageError::not_found(schemas_dir).into());
        }

        let prefix = config.schema_file_prefix.clone();
        let mut available_versions = scan_versions(schemas_dir, &prefix)?;
        available_versions.sort();

        let active = match available_versions.iter().max().cloned() {
            Some(last) => {
                tracing::debug!(version = %last, "loading latest schema version");
                read_version_file(&version_path(schemas_dir, &prefix, &last))?
            }
            None => {
                tracing::debug!(version = %config.app_version, "no schema on disk, creating fresh");
                Schema::new(&config.app_version)
            }
        };

        let mut builder = Self {
            schemas_dir: schemas_dir.to_path_buf(),
            prefix,
            app_version: config.app_version.clone(),
            available_versions,
            active,
        };
        builder.include_active_version();
        Ok(builder)
    }

    /// Returns the active schema.
    #[must_use]
    pub fn active_schema(&self) -> &Schema {
        &self.active
    }

    /// Returns the active schema for mutation.
    pub fn active_schema_mut(&mut self) -> &mut Schema {
        &mut self.active
    }

    /// Returns the sorted catalog of known versions.
    #[must_use]
    pub fn available_versions(&self) -> &[String] {
        &self.available_versions
    }

    /// Returns the latest known version (lexicographic maximum).
    #[must_use]
    pub fn last_version(&self) -> Option<&str> {
        self.available_versions.iter().max().map(String::as_str)
    }

    /// Returns true if the catalog contains this version.
    #[must_use]
    pub fn version_exists(&self, version: &str) -> bool {
        self.available_versions.iter().any(|v| v == version)
    }

    /// Returns the file path for a version.
    #[must_use]
    pub fn path_for_version(&self, version: &str) -> PathBuf {
        version_path(&self.schemas_dir, &self.prefix, version)
    }

    /// Rescans the schema directory and rebuilds the catalog.
    ///
    /// The active schema's version is always included, even if its file was
    /// never written.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the directory scan.
    pub fn reload_versions(&mut self) -> StorageResult<()> {
        let mut versions = scan_versions(&self.schemas_dir, &self.prefix)?;
        versions.sort();
        self.available_versions = versions;
        self.include_active_version();
        Ok(())
    }

    /// Loads the named version file and makes it the active schema.
    ///
    /// A no-op when that version is already active.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::VersionNotFound`] if no file exists for the version
    /// - [`StorageError::Corrupt`] if the file does not parse
    pub fn load_schema(&mut self, version: &str) -> DbResult<()> {
        if self.active.version == version {
            return Ok(());
        }

        let path = self.path_for_version(version);
        if !path.exists() {
            return Err(SchemaError::version_not_found(version).into());
        }

        self.active = read_version_file(&path)?;
        self.reload_versions()?;
        tracing::debug!(version, "loaded schema version");
        Ok(())
    }

    /// Creates a new schema for the current application version.
    ///
    /// With `from_version` (defaulted to the latest existing version when
    /// one exists), the source version is loaded and the new schema starts
    /// as a deep clone of its table list. With no prior version, the new
    /// schema starts empty. The new schema becomes active but is not saved.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::VersionAlreadyExists`] if a schema for the current
    ///   application version already exists
    /// - Load errors for the source version
    pub fn create_schema_for_current_version(
        &mut self,
        from_version: Option<&str>,
    ) -> DbResult<()> {
        let from = match from_version {
            Some(v) => Some(v.to_string()),
            None => self.last_version().map(String::from),
        };

        if self.version_exists(&self.app_version) {
            return Err(SchemaError::version_already_exists(&self.app_version).into());
        }

        match from {
            Some(source) => {
                self.load_schema(&source)?;
                self.active = Schema::derived_from(&self.app_version, &self.active);
            }
            None => {
                self.active = Schema::new(&self.app_version);
            }
        }

        self.reload_versions()?;
        tracing::debug!(version = %self.app_version, "created schema for current version");
        Ok(())
    }

    /// Saves the active schema, overwriting its version file in full.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the write.
    pub fn save_active_schema(&self) -> StorageResult<()> {
        self.save_schema(&self.active)
    }

    /// Saves a schema, overwriting its version file in full.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the write.
    pub fn save_schema(&self, schema: &Schema) -> StorageResult<()> {
        let path = self.path_for_version(&schema.version);
        let json = serde_json::to_string_pretty(schema)
            .map_err(|e| StorageError::corrupt(&path, e.to_string()))?;
        fs::write(&path, json)?;
        tracing::debug!(version = %schema.version, path = %path.display(), "saved schema");
        Ok(())
    }

    fn include_active_version(&mut self) {
        if !self.version_exists(&self.active.version) {
            self.available_versions.push(self.active.version.clone());
            self.available_versions.sort();
        }
    }
}

fn version_path(schemas_dir: &Path, prefix: &str, version: &str) -> PathBuf {
    schemas_dir.join(format!("{prefix}{version}.json"))
}

fn scan_versions(schemas_dir: &Path, prefix: &str) -> StorageResult<Vec<String>> {
    let mut versions = Vec::new();
    for entry in fs::read_dir(schemas_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(version) = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(".json"))
        {
            versions.push(version.to_string());
        }
    }
    Ok(versions)
}

fn read_version_file(path: &Path) -> DbResult<Schema> {
    let text = fs::read_to_string(path).map_err(StorageError::from)?;
    let schema: Schema = serde_json::from_str(&text)
        .map_err(|e| StorageError::corrupt(path, e.to_string()))?;
    Ok(schema)
}
