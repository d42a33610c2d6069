//! Create-version command implementation.

use super::schemas_dir;
use std::path::Path;
use versodb_core::{Config, SchemaBuilder};

/// Runs the create-version command.
///
/// Derives a new schema version file from the source version (the latest
/// by default) and writes it. Existing version files are never touched.
pub fn run(
    path: &Path,
    app_version: &str,
    from: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let schemas = schemas_dir(path);
    if !schemas.is_dir() {
        return Err(format!("No database found at {:?}", path).into());
    }

    let config = Config::new(app_version);
    let mut builder = SchemaBuilder::new(&schemas, &config)?;

    builder.create_schema_for_current_version(from)?;
    builder.save_active_schema()?;

    let file = builder.path_for_version(app_version);
    println!("Created schema version {app_version} at {:?}", file);
    match from {
        Some(source) => println!("Derived from version {source}"),
        None => match builder
            .available_versions()
            .iter()
            .filter(|v| v.as_str() != app_version)
            .max()
        {
            Some(source) => println!("Derived from version {source}"),
            None => println!("Created empty (no prior version)"),
        },
    }

    Ok(())
}
