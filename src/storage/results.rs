//! Storage result types
//!
//! Defines the plain data structures handed out by storage operations. They
//! are always owned copies; nothing returned here aliases internal state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::filesystem::Directory;

/// Externally visible table entry: `(created_at, modified_at, flags)`.
///
/// Serializes as a 3-element array, and only deserializes from one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry(pub i64, pub i64, pub String);

impl TableEntry {
    pub fn created_at(&self) -> i64 {
        self.0
    }

    pub fn modified_at(&self) -> i64 {
        self.1
    }

    pub fn flags(&self) -> &str {
        &self.2
    }
}

/// Result of a folder export, also the accepted input of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFolder {
    pub path: String,
    pub folder: Directory,
    pub table: BTreeMap<String, TableEntry>,
}

impl ExportedFolder {
    /// Validates dynamic data against the export shape.
    ///
    /// `path` must be a string, `folder` an object whose values are strings
    /// or further objects, and every `table` value an array of exactly three
    /// elements.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, StorageError> {
        let serde_json::Value::Object(map) = value else {
            return Err(StorageError::MalformedInput(
                "export must be an object".into(),
            ));
        };

        let path = match map.get("path") {
            Some(serde_json::Value::String(path)) => path.clone(),
            _ => return Err(StorageError::MalformedInput("path must be a string".into())),
        };

        let folder = Directory::from_value(map.get("folder").unwrap_or(&serde_json::Value::Null))?;

        let Some(serde_json::Value::Object(raw_table)) = map.get("table") else {
            return Err(StorageError::MalformedInput(
                "table must be a non-array object".into(),
            ));
        };

        let mut table = BTreeMap::new();
        for (key, raw_entry) in raw_table {
            let entry: TableEntry = serde_json::from_value(raw_entry.clone()).map_err(|e| {
                StorageError::MalformedInput(format!("table entry {:?}: {}", key, e))
            })?;
            table.insert(key.clone(), entry);
        }

        Ok(Self {
            path,
            folder,
            table,
        })
    }

    /// Parses and validates a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_entry_is_a_triple() {
        let entry = TableEntry(1, 2, "hr".into());
        assert_eq!(serde_json::to_value(&entry).unwrap(), json!([1, 2, "hr"]));
        assert!(serde_json::from_value::<TableEntry>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<TableEntry>(json!([1, 2, "", 4])).is_err());
    }

    #[test]
    fn test_from_value_accepts_export_shape() {
        let value = json!({
            "path": "doc",
            "folder": {"test.txt": "hi", "sub": {}},
            "table": {"test.txt": [1, 2, ""], "sub": [1, 1, "h"]}
        });
        let export = ExportedFolder::from_value(&value).unwrap();
        assert_eq!(export.path, "doc");
        assert_eq!(export.folder.len(), 2);
        assert_eq!(export.table["sub"].flags(), "h");
    }

    #[test]
    fn test_from_value_rejects_malformed_shapes() {
        let cases = [
            json!([]),
            json!({"path": 3, "folder": {}, "table": {}}),
            json!({"path": "a", "folder": [], "table": {}}),
            json!({"path": "a", "folder": {"x": 42}, "table": {}}),
            json!({"path": "a", "folder": {"x": null}, "table": {}}),
            json!({"path": "a", "folder": {}, "table": []}),
            json!({"path": "a", "folder": {}, "table": {"x": [1, 2]}}),
            json!({"path": "a", "folder": {}}),
        ];
        for case in cases {
            assert!(
                matches!(ExportedFolder::from_value(&case), Err(StorageError::MalformedInput(_))),
                "accepted {case}"
            );
        }
    }

    #[test]
    fn test_json_roundtrip_keeps_shape() {
        let raw = r#"{"path":"doc","folder":{"zeta":"1","alpha":"2","mid":{"b":"","a":""}},"table":{"alpha":[5,6,"r"],"zeta":[1,2,""]}}"#;
        let export = ExportedFolder::from_json(raw).unwrap();
        let names: Vec<&str> = export.folder.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(export.to_json().unwrap(), raw);
    }
}
