//! Inspect command implementation.

use super::{tables_dir, TABLE_FILE_SUFFIX};
use serde::Serialize;
use std::path::Path;
use versodb_core::{document_id, TableData};

/// Statistics for a single table file.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Record type tag (from the file name).
    pub tag: String,
    /// Number of stored documents.
    pub document_count: usize,
    /// The last identifier ever issued.
    pub current_id: u64,
    /// File size in bytes.
    pub file_size: u64,
    /// Document keys seen in the first document (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    only_table: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let tables = tables_dir(path);
    if !tables.is_dir() {
        return Err(format!("No database found at {:?}", path).into());
    }

    let suffix = format!("{TABLE_FILE_SUFFIX}.json");
    let mut stats = Vec::new();

    for entry in std::fs::read_dir(&tables)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(tag) = name.strip_suffix(&suffix) else {
            continue;
        };
        if only_table.is_some_and(|t| t != tag) {
            continue;
        }

        let text = std::fs::read_to_string(entry.path())?;
        let data: TableData = serde_json::from_str(&text)
            .map_err(|e| format!("{}: {}", entry.path().display(), e))?;

        let keys = only_table.is_some().then(|| {
            data.datas
                .first()
                .map(|d| d.keys().cloned().collect())
                .unwrap_or_default()
        });

        // Surface obviously impossible counters early
        let max_id = data.datas.iter().map(document_id).max().unwrap_or(0);
        if max_id > data.current_id {
            tracing::warn!(
                table = tag,
                current_id = data.current_id,
                max_id,
                "currentID is below the largest stored identifier"
            );
        }

        stats.push(TableStats {
            tag: tag.to_string(),
            document_count: data.datas.len(),
            current_id: data.current_id,
            file_size: entry.metadata()?.len(),
            keys,
        });
    }
    stats.sort_by(|a, b| a.tag.cmp(&b.tag));

    if let Some(table) = only_table {
        if stats.is_empty() {
            return Err(format!("No table file for {table:?}").into());
        }
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        _ => {
            println!("Tables at {:?}", path);
            println!();
            if stats.is_empty() {
                println!("  (no table files)");
            }
            for table in &stats {
                println!(
                    "  {}: {} documents, currentID {}, {} bytes",
                    table.tag, table.document_count, table.current_id, table.file_size
                );
                if let Some(keys) = &table.keys {
                    println!("    keys: {}", keys.join(", "));
                }
            }
        }
    }

    Ok(())
}
