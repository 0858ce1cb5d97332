/// JSON export and import of the saved query library

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EXPORT_VERSION;
use crate::errors::ImportError;
use crate::library::QueryLibrary;
use crate::query_data::{Folder, SavedQuery, generate_folder_id, generate_query_id, normalize_shortcut};

/// Export file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    /// ISO-8601 timestamp
    pub exported_at: String,
    pub folders: Vec<Folder>,
    pub queries: Vec<SavedQuery>,
}

impl ExportDocument {
    pub fn from_library(library: &QueryLibrary, exported_at: &str) -> Self {
        ExportDocument {
            version: EXPORT_VERSION,
            exported_at: exported_at.to_string(),
            folders: library.folders.clone(),
            queries: library.queries.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Download name for an export made at `exported_at` (ISO-8601)
pub fn export_filename(exported_at: &str) -> String {
    let date: String = exported_at.chars().take(10).collect();
    format!("saved-queries-{}.json", date)
}

/// Parse and normalize an import document
///
/// Nothing is returned unless the whole document validates, so callers can
/// persist folders and queries together.
pub fn parse_import(text: &str) -> Result<QueryLibrary, ImportError> {
    let data: Value = serde_json::from_str(text).map_err(|e| ImportError::InvalidJson(e.to_string()))?;

    let (raw_folders, raw_queries) = match (
        data.get("folders").and_then(Value::as_array),
        data.get("queries").and_then(Value::as_array),
    ) {
        (Some(folders), Some(queries)) => (folders, queries),
        _ => return Err(ImportError::InvalidFormat),
    };

    let mut folders: Vec<Folder> = raw_folders.iter().map(normalize_folder).collect();
    let folder_ids: HashSet<String> = folders.iter().map(|f| f.id.clone()).collect();

    for folder in folders.iter_mut() {
        if !folder.parent_id.is_empty() && !folder_ids.contains(&folder.parent_id) {
            folder.parent_id = String::new();
        }
    }

    let queries = raw_queries
        .iter()
        .map(normalize_query)
        .map(|mut query| {
            if !query.folder_id.is_empty() && !folder_ids.contains(&query.folder_id) {
                query.folder_id = String::new();
            }
            query
        })
        .collect();

    Ok(QueryLibrary::from_parts(queries, folders))
}

fn string_field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.as_object()?.get(key)?.as_str()
}

fn id_field(record: &Value) -> Option<String> {
    string_field(record, "id")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Coerce one imported query record, regenerating a missing id
pub fn normalize_query(record: &Value) -> SavedQuery {
    SavedQuery {
        id: id_field(record).unwrap_or_else(generate_query_id),
        name: string_field(record, "name").map_or_else(|| "Unnamed".to_string(), |s| s.trim().to_string()),
        shortcut: string_field(record, "shortcut").map(normalize_shortcut).unwrap_or_default(),
        query: string_field(record, "query").map(|s| s.trim().to_string()).unwrap_or_default(),
        folder_id: string_field(record, "folderId").map(|s| s.trim().to_string()).unwrap_or_default(),
    }
}

/// Coerce one imported folder record, regenerating a missing id
pub fn normalize_folder(record: &Value) -> Folder {
    Folder {
        id: id_field(record).unwrap_or_else(generate_folder_id),
        name: string_field(record, "name").map_or_else(|| "Unnamed folder".to_string(), |s| s.trim().to_string()),
        parent_id: string_field(record, "parentId").map(|s| s.trim().to_string()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_library() -> QueryLibrary {
        QueryLibrary::from_parts(
            vec![
                SavedQuery {
                    id: "q1".to_string(),
                    name: "Commander".to_string(),
                    shortcut: "cmd".to_string(),
                    query: "legal:commander".to_string(),
                    folder_id: "".to_string(),
                },
                SavedQuery {
                    id: "q2".to_string(),
                    name: "Elves".to_string(),
                    shortcut: "".to_string(),
                    query: "t:elf ?cmd".to_string(),
                    folder_id: "f2".to_string(),
                },
            ],
            vec![
                Folder { id: "f1".to_string(), name: "Decks".to_string(), parent_id: "".to_string() },
                Folder { id: "f2".to_string(), name: "Tribal".to_string(), parent_id: "f1".to_string() },
            ],
        )
    }

    #[test]
    fn test_export_document_shape() {
        let document = ExportDocument::from_library(&create_test_library(), "2026-10-16T09:30:00.000Z");

        let json: Value = serde_json::from_str(&document.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["exportedAt"], "2026-10-16T09:30:00.000Z");
        assert_eq!(json["folders"][1]["parentId"], "f1");
        assert_eq!(json["queries"][1]["folderId"], "f2");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename("2026-10-16T09:30:00.000Z"),
            "saved-queries-2026-10-16.json"
        );
    }

    #[test]
    fn test_round_trip_reproduces_library() {
        let library = create_test_library();
        let json = ExportDocument::from_library(&library, "2026-10-16T09:30:00.000Z")
            .to_json_pretty()
            .unwrap();

        let imported = parse_import(&json).unwrap();

        assert_eq!(imported, library);
    }

    #[test]
    fn test_import_invalid_json() {
        assert!(matches!(parse_import("{not json"), Err(ImportError::InvalidJson(_))));
    }

    #[test]
    fn test_import_wrong_shape() {
        assert_eq!(parse_import("[]"), Err(ImportError::InvalidFormat));
        assert_eq!(parse_import(r#"{"queries": []}"#), Err(ImportError::InvalidFormat));
        assert_eq!(
            parse_import(r#"{"queries": {}, "folders": []}"#),
            Err(ImportError::InvalidFormat)
        );
    }

    #[test]
    fn test_import_normalizes_records() {
        let text = json!({
            "folders": [{"id": "f1", "name": "  Decks "}, {"name": 7}],
            "queries": [
                {"id": "", "name": " Red ", "shortcut": " R E D ", "query": " c:r ", "folderId": "f1"},
                {"id": 12, "query": "t:elf", "folderId": "gone"},
                "not an object"
            ]
        })
        .to_string();

        let library = parse_import(&text).unwrap();

        assert_eq!(library.folders[0].name, "Decks");
        assert_eq!(library.folders[1].name, "Unnamed folder");
        assert!(library.folders[1].id.starts_with("f_"));

        let red = &library.queries[0];
        assert!(red.id.starts_with("q_"));
        assert_eq!(red.name, "Red");
        assert_eq!(red.shortcut, "red");
        assert_eq!(red.query, "c:r");
        assert_eq!(red.folder_id, "f1");

        let elf = &library.queries[1];
        assert!(elf.id.starts_with("q_"));
        assert_eq!(elf.name, "Unnamed");
        assert_eq!(elf.folder_id, "");

        assert_eq!(library.queries[2].query, "");
    }

    #[test]
    fn test_import_drops_dangling_folder_parent() {
        let text = r#"{"version": 1, "folders": [{"id": "f1", "name": "A", "parentId": "f9"}], "queries": []}"#;

        let library = parse_import(text).unwrap();

        assert_eq!(library.folders[0].parent_id, "");
    }
}
