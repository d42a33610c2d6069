//! Persisted documents: flat key→value mappings shaped by a table schema.

use crate::record::RecordId;
use serde::{Deserialize, Serialize};

/// One persisted record, a flat key→value mapping.
///
/// Scalar field values are JSON strings (or null when unset); the `ID` key
/// and `<field>_ID` foreign keys are JSON integers. A document keeps the
/// shape of whichever schema version was active when it was written; the
/// table does not reshape old documents on load.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The on-disk shape of one table file: `{currentID, datas}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableData {
    /// The last identifier ever issued.
    #[serde(rename = "currentID")]
    pub current_id: RecordId,
    /// All documents, in insertion order.
    pub datas: Vec<Document>,
}

/// Reads a document's identifier, or 0 if absent or malformed.
#[must_use]
pub fn document_id(document: &Document) -> RecordId {
    document
        .get(crate::record::ID_FIELD)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}

/// Reads a document key as a string slice, if present and a string.
#[must_use]
pub fn document_str<'a>(document: &'a Document, key: &str) -> Option<&'a str> {
    document.get(key).and_then(serde_json::Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        let serde_json::Value::Object(map) = json!({
            "ID": 3,
            "Name": "Shuckle",
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn document_id_reads_integer() {
        assert_eq!(document_id(&sample()), 3);
        assert_eq!(document_id(&Document::new()), 0);
    }

    #[test]
    fn document_str_reads_string() {
        let doc = sample();
        assert_eq!(document_str(&doc, "Name"), Some("Shuckle"));
        assert_eq!(document_str(&doc, "ID"), None);
    }

    #[test]
    fn table_data_wire_names() {
        let data = TableData {
            current_id: 7,
            datas: vec![sample()],
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["currentID"], 7);
        assert_eq!(value["datas"][0]["ID"], 3);
    }
}
