/// Data structures for Query Stash
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved search query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedQuery {
    pub id: String,
    pub name: String,
    /// Lowercase alias without whitespace; empty when the query has none
    pub shortcut: String,
    pub query: String,
    /// Empty means unfiled
    pub folder_id: String,
}

impl SavedQuery {
    pub fn new(name: &str, shortcut: &str, query: &str, folder_id: &str) -> SavedQuery {
        SavedQuery {
            id: generate_query_id(),
            name: name.trim().to_string(),
            shortcut: normalize_shortcut(shortcut),
            query: query.trim().to_string(),
            folder_id: folder_id.trim().to_string(),
        }
    }

    /// The shortcut as typed in the search box, e.g. `?cmd`
    pub fn display_shortcut(&self) -> Option<String> {
        let shortcut = self.shortcut.trim();
        if shortcut.is_empty() {
            None
        } else {
            Some(format!("?{}", shortcut))
        }
    }

    pub fn is_unfiled(&self) -> bool {
        self.folder_id.trim().is_empty()
    }
}

/// A user-defined folder; folders form a forest through `parent_id`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// Empty means top-level
    pub parent_id: String,
}

impl Folder {
    pub fn new(name: &str, parent_id: &str) -> Folder {
        Folder {
            id: generate_folder_id(),
            name: name.trim().to_string(),
            parent_id: parent_id.trim().to_string(),
        }
    }
}

/// User input for creating or editing a saved query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDraft {
    pub name: String,
    pub shortcut: String,
    pub query: String,
    pub folder_id: String,
}

impl QueryDraft {
    pub fn from_query(query: &SavedQuery) -> QueryDraft {
        QueryDraft {
            name: query.name.clone(),
            shortcut: query.shortcut.clone(),
            query: query.query.clone(),
            folder_id: query.folder_id.clone(),
        }
    }
}

pub fn generate_query_id() -> String {
    format!("q_{}", Uuid::new_v4().simple())
}

pub fn generate_folder_id() -> String {
    format!("f_{}", Uuid::new_v4().simple())
}

/// Trim, lowercase and strip every whitespace run from a shortcut
pub fn normalize_shortcut(raw: &str) -> String {
    raw.to_lowercase().split_whitespace().collect()
}
