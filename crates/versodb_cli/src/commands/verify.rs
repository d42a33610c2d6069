//! Verify command implementation.

use super::{recorded_version, schemas_dir, tables_dir, SCHEMA_FILE_PREFIX, TABLE_FILE_SUFFIX};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use versodb_core::{document_id, Schema, TableData};

/// Verification result for one group of checks.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of files checked.
    pub files_checked: usize,
    /// List of errors found.
    pub errors: Vec<String>,
    /// List of non-fatal observations.
    pub warnings: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            files_checked: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying database at {:?}", path);
    println!();

    let (schema_result, latest_schema) = verify_schemas(path)?;
    print_result("Schemas", &schema_result);

    let table_result = verify_tables(path, latest_schema.as_ref())?;
    print_result("Tables", &table_result);

    println!();
    if schema_result.is_ok() && table_result.is_ok() {
        println!("✓ Database verification passed");
        Ok(())
    } else {
        println!("✗ Database verification failed");
        Err("Verification failed".into())
    }
}

/// Parses every schema version file and cross-checks the recorded current
/// version. Returns the latest schema for table cross-checks.
fn verify_schemas(
    path: &Path,
) -> Result<(VerifyResult, Option<Schema>), Box<dyn std::error::Error>> {
    let mut result = VerifyResult::new();
    let schemas = schemas_dir(path);
    if !schemas.is_dir() {
        result.errors.push(format!("missing {:?}", schemas));
        return Ok((result, None));
    }

    let mut parsed: Vec<(String, Schema)> = Vec::new();
    for entry in std::fs::read_dir(&schemas)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(version) = name
            .strip_prefix(SCHEMA_FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(".json"))
        else {
            continue;
        };
        result.files_checked += 1;

        let text = std::fs::read_to_string(entry.path())?;
        match serde_json::from_str::<Schema>(&text) {
            Ok(schema) => {
                if schema.version != version {
                    result.errors.push(format!(
                        "{name}: file names version {version} but contains {}",
                        schema.version
                    ));
                }

                let mut seen = HashSet::new();
                for table in &schema.table_schemas {
                    if !seen.insert(table.item_type.as_str()) {
                        result.errors.push(format!(
                            "{name}: duplicate table schema for {}",
                            table.item_type
                        ));
                    }
                }

                parsed.push((version.to_string(), schema));
            }
            Err(e) => result.errors.push(format!("{name}: {e}")),
        }
    }

    match recorded_version(path) {
        Some(current) => {
            if !parsed.iter().any(|(v, _)| *v == current) {
                result.errors.push(format!(
                    "database.json records version {current} but no such schema file exists"
                ));
            }
        }
        None => result
            .warnings
            .push("database.json has no recorded current version".to_string()),
    }

    parsed.sort_by(|a, b| a.0.cmp(&b.0));
    let latest = parsed.pop().map(|(_, schema)| schema);
    Ok((result, latest))
}

/// Parses every table file and checks identifier invariants plus
/// cross-references against the latest schema.
fn verify_tables(
    path: &Path,
    latest_schema: Option<&Schema>,
) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::new();
    let tables = tables_dir(path);
    if !tables.is_dir() {
        result.errors.push(format!("missing {:?}", tables));
        return Ok(result);
    }

    let suffix = format!("{TABLE_FILE_SUFFIX}.json");
    let mut seen_tags = HashSet::new();

    for entry in std::fs::read_dir(&tables)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(tag) = name.strip_suffix(&suffix) else {
            continue;
        };
        result.files_checked += 1;
        seen_tags.insert(tag.to_string());

        let text = std::fs::read_to_string(entry.path())?;
        let data = match serde_json::from_str::<TableData>(&text) {
            Ok(data) => data,
            Err(e) => {
                result.errors.push(format!("{name}: {e}"));
                continue;
            }
        };

        let mut id_counts: HashMap<u64, usize> = HashMap::new();
        for document in &data.datas {
            let id = document_id(document);
            if id == 0 {
                result
                    .errors
                    .push(format!("{name}: document without a valid ID"));
                continue;
            }
            *id_counts.entry(id).or_insert(0) += 1;
        }
        for (id, count) in id_counts.iter().filter(|(_, c)| **c > 1) {
            result
                .errors
                .push(format!("{name}: identifier {id} appears {count} times"));
        }
        if let Some(max_id) = id_counts.keys().max() {
            if *max_id > data.current_id {
                result.errors.push(format!(
                    "{name}: currentID {} is below the largest stored identifier {max_id}",
                    data.current_id
                ));
            }
        }

        if let Some(schema) = latest_schema {
            if schema.get_table_schema(tag).is_none() {
                result.warnings.push(format!(
                    "{name}: no table schema in the latest version (stale table file?)"
                ));
            }
        }
    }

    if let Some(schema) = latest_schema {
        for table in &schema.table_schemas {
            if !seen_tags.contains(&table.item_type) {
                // Not an error: table files are created on first load
                result.warnings.push(format!(
                    "{}: declared in the latest schema but has no table file yet",
                    table.item_type
                ));
            }
        }
    }

    Ok(result)
}

fn print_result(label: &str, result: &VerifyResult) {
    println!(
        "{label}: {} files checked, {} errors, {} warnings",
        result.files_checked,
        result.errors.len(),
        result.warnings.len()
    );
    for error in &result.errors {
        println!("  error: {error}");
    }
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
}
