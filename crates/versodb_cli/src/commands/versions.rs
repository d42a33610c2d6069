//! Versions command implementation.

use super::{recorded_version, schemas_dir, SCHEMA_FILE_PREFIX};
use serde::Serialize;
use std::path::Path;
use versodb_core::Schema;

/// One listed schema version.
#[derive(Debug, Serialize)]
pub struct VersionEntry {
    /// The version string.
    pub version: String,
    /// Number of table schemas in this version.
    pub table_count: usize,
    /// Record type tags, in schema order.
    pub tables: Vec<String>,
    /// Whether `database.json` records this as the current version.
    pub current: bool,
}

/// Runs the versions command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let schemas = schemas_dir(path);
    if !schemas.is_dir() {
        return Err(format!("No database found at {:?}", path).into());
    }

    let current = recorded_version(path);
    let mut entries = Vec::new();

    for entry in std::fs::read_dir(&schemas)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(version) = name
            .strip_prefix(SCHEMA_FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(".json"))
        else {
            continue;
        };

        let text = std::fs::read_to_string(entry.path())?;
        let schema: Schema = serde_json::from_str(&text)
            .map_err(|e| format!("{}: {}", entry.path().display(), e))?;

        entries.push(VersionEntry {
            version: version.to_string(),
            table_count: schema.table_schemas.len(),
            tables: schema
                .table_schemas
                .iter()
                .map(|t| t.item_type.clone())
                .collect(),
            current: current.as_deref() == Some(version),
        });
    }
    entries.sort_by(|a, b| a.version.cmp(&b.version));

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            println!("Schema versions at {:?}", path);
            println!();
            if entries.is_empty() {
                println!("  (no schema versions)");
            }
            for entry in &entries {
                let marker = if entry.current { " *" } else { "" };
                println!(
                    "  {}{} ({} tables: {})",
                    entry.version,
                    marker,
                    entry.table_count,
                    entry.tables.join(", ")
                );
            }
            if let Some(current) = &current {
                println!();
                println!("Recorded current version: {current}");
            }
        }
    }

    Ok(())
}
