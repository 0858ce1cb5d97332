/// In-memory saved query library, mirroring the two synced storage entries

use crate::errors::LibraryError;
use crate::expansion::{ShortcutMap, build_shortcut_map};
use crate::query_data::{Folder, QueryDraft, SavedQuery, normalize_shortcut};
use std::collections::HashMap;

/// Root library structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryLibrary {
    pub queries: Vec<SavedQuery>,
    pub folders: Vec<Folder>,
}

impl QueryLibrary {
    pub fn new() -> Self {
        QueryLibrary {
            queries: Vec::new(),
            folders: Vec::new(),
        }
    }

    pub fn from_parts(queries: Vec<SavedQuery>, folders: Vec<Folder>) -> Self {
        QueryLibrary { queries, folders }
    }

    /// Validate and append a new query, returning its id
    pub fn add_query(&mut self, draft: &QueryDraft) -> Result<String, LibraryError> {
        let draft = self.clean_draft(draft)?;
        let query = SavedQuery::new(&draft.name, &draft.shortcut, &draft.query, &draft.folder_id);
        let id = query.id.clone();
        self.queries.push(query);
        Ok(id)
    }

    /// Replace the editable fields of an existing query in place
    pub fn update_query(&mut self, query_id: &str, draft: &QueryDraft) -> Result<(), LibraryError> {
        let draft = self.clean_draft(draft)?;
        let query = self
            .queries
            .iter_mut()
            .find(|q| q.id == query_id)
            .ok_or_else(|| LibraryError::QueryNotFound(query_id.to_string()))?;

        query.name = draft.name;
        query.shortcut = draft.shortcut;
        query.query = draft.query;
        query.folder_id = draft.folder_id;
        Ok(())
    }

    pub fn remove_query(&mut self, query_id: &str) -> bool {
        let original_len = self.queries.len();
        self.queries.retain(|q| q.id != query_id);
        self.queries.len() < original_len
    }

    pub fn get_query(&self, query_id: &str) -> Option<&SavedQuery> {
        self.queries.iter().find(|q| q.id == query_id)
    }

    /// Create a folder; an unknown parent makes it top-level
    pub fn add_folder(&mut self, name: &str, parent_id: &str) -> Result<String, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::MissingField("name"));
        }

        let parent_id = if self.has_folder(parent_id) { parent_id } else { "" };
        let folder = Folder::new(name, parent_id);
        let id = folder.id.clone();
        self.folders.push(folder);
        Ok(id)
    }

    pub fn rename_folder(&mut self, folder_id: &str, new_name: &str) -> Result<(), LibraryError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(LibraryError::MissingField("name"));
        }

        self.folders
            .iter_mut()
            .find(|f| f.id == folder_id)
            .map(|folder| {
                folder.name = new_name.to_string();
            })
            .ok_or_else(|| LibraryError::FolderNotFound(folder_id.to_string()))
    }

    /// Delete a folder, moving its subfolders and queries up one level
    ///
    /// Contents go to the removed folder's parent, or to the top level when
    /// that parent does not resolve.
    pub fn remove_folder(&mut self, folder_id: &str) -> Result<(), LibraryError> {
        let removed = self
            .get_folder(folder_id)
            .cloned()
            .ok_or_else(|| LibraryError::FolderNotFound(folder_id.to_string()))?;

        let new_parent = if removed.parent_id != removed.id && self.has_folder(&removed.parent_id) {
            removed.parent_id.clone()
        } else {
            String::new()
        };

        self.folders.retain(|f| f.id != folder_id);

        for folder in self.folders.iter_mut().filter(|f| f.parent_id == folder_id) {
            folder.parent_id = new_parent.clone();
        }
        for query in self.queries.iter_mut().filter(|q| q.folder_id == folder_id) {
            query.folder_id = new_parent.clone();
        }
        Ok(())
    }

    pub fn get_folder(&self, folder_id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == folder_id)
    }

    pub fn has_folder(&self, folder_id: &str) -> bool {
        !folder_id.is_empty() && self.get_folder(folder_id).is_some()
    }

    pub fn folder_name(&self, folder_id: &str) -> Option<&str> {
        self.get_folder(folder_id).map(|f| f.name.as_str())
    }

    pub fn queries_in_folder(&self, folder_id: &str) -> Vec<&SavedQuery> {
        self.queries
            .iter()
            .filter(|q| q.folder_id.trim() == folder_id)
            .collect()
    }

    pub fn shortcut_map(&self) -> ShortcutMap {
        build_shortcut_map(&self.queries)
    }

    /// Shortcuts claimed by more than one query, sorted
    pub fn shortcut_conflicts(&self) -> Vec<String> {
        let counts = self
            .queries
            .iter()
            .map(|q| q.shortcut.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .fold(HashMap::new(), |mut counts, shortcut| {
                *counts.entry(shortcut).or_insert(0usize) += 1;
                counts
            });

        let mut conflicts: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(shortcut, _)| shortcut)
            .collect();
        conflicts.sort();
        conflicts
    }

    fn clean_draft(&self, draft: &QueryDraft) -> Result<QueryDraft, LibraryError> {
        let name = draft.name.trim();
        let query = draft.query.trim();
        if name.is_empty() {
            return Err(LibraryError::MissingField("name"));
        }
        if query.is_empty() {
            return Err(LibraryError::MissingField("query"));
        }

        let folder_id = draft.folder_id.trim();
        Ok(QueryDraft {
            name: name.to_string(),
            shortcut: normalize_shortcut(&draft.shortcut),
            query: query.to_string(),
            folder_id: if self.has_folder(folder_id) {
                folder_id.to_string()
            } else {
                String::new()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_draft(name: &str, shortcut: &str, query: &str, folder_id: &str) -> QueryDraft {
        QueryDraft {
            name: name.to_string(),
            shortcut: shortcut.to_string(),
            query: query.to_string(),
            folder_id: folder_id.to_string(),
        }
    }

    #[test]
    fn test_library_new() {
        let library = QueryLibrary::new();
        assert_eq!(library.queries.len(), 0);
        assert_eq!(library.folders.len(), 0);
    }

    #[test]
    fn test_add_query() {
        let mut library = QueryLibrary::new();

        let id = library
            .add_query(&create_test_draft(" Commander ", "C M D", "legal:commander", ""))
            .unwrap();

        let query = library.get_query(&id).unwrap();
        assert_eq!(query.name, "Commander");
        assert_eq!(query.shortcut, "cmd");
        assert_eq!(query.folder_id, "");
    }

    #[test]
    fn test_add_query_requires_name_and_query() {
        let mut library = QueryLibrary::new();

        assert_eq!(
            library.add_query(&create_test_draft("  ", "", "c:r", "")),
            Err(LibraryError::MissingField("name"))
        );
        assert_eq!(
            library.add_query(&create_test_draft("Red", "", "   ", "")),
            Err(LibraryError::MissingField("query"))
        );
        assert!(library.queries.is_empty());
    }

    #[test]
    fn test_add_query_unknown_folder_is_unfiled() {
        let mut library = QueryLibrary::new();

        let id = library
            .add_query(&create_test_draft("Red", "", "c:r", "f_missing"))
            .unwrap();

        assert_eq!(library.get_query(&id).unwrap().folder_id, "");
    }

    #[test]
    fn test_update_query() {
        let mut library = QueryLibrary::new();
        let folder_id = library.add_folder("Colors", "").unwrap();
        let id = library.add_query(&create_test_draft("Red", "r", "c:r", "")).unwrap();

        library
            .update_query(&id, &create_test_draft("Green", "G", "c:g", &folder_id))
            .unwrap();

        let query = library.get_query(&id).unwrap();
        assert_eq!(query.name, "Green");
        assert_eq!(query.shortcut, "g");
        assert_eq!(query.query, "c:g");
        assert_eq!(query.folder_id, folder_id);
    }

    #[test]
    fn test_update_nonexistent_query() {
        let mut library = QueryLibrary::new();

        let result = library.update_query("q_missing", &create_test_draft("Red", "", "c:r", ""));

        assert_eq!(result, Err(LibraryError::QueryNotFound("q_missing".to_string())));
    }

    #[test]
    fn test_remove_query() {
        let mut library = QueryLibrary::new();
        let first = library.add_query(&create_test_draft("Red", "", "c:r", "")).unwrap();
        library.add_query(&create_test_draft("Green", "", "c:g", "")).unwrap();

        assert!(library.remove_query(&first));
        assert!(!library.remove_query(&first));
        assert_eq!(library.queries.len(), 1);
        assert_eq!(library.queries[0].name, "Green");
    }

    #[test]
    fn test_add_folder_with_unknown_parent() {
        let mut library = QueryLibrary::new();

        let id = library.add_folder("Decks", "f_missing").unwrap();

        assert_eq!(library.get_folder(&id).unwrap().parent_id, "");
        assert_eq!(library.add_folder(" ", ""), Err(LibraryError::MissingField("name")));
    }

    #[test]
    fn test_rename_folder() {
        let mut library = QueryLibrary::new();
        let id = library.add_folder("Old", "").unwrap();

        library.rename_folder(&id, " New ").unwrap();

        assert_eq!(library.folder_name(&id), Some("New"));
        assert_eq!(library.rename_folder(&id, ""), Err(LibraryError::MissingField("name")));
        assert_eq!(
            library.rename_folder("f_missing", "x"),
            Err(LibraryError::FolderNotFound("f_missing".to_string()))
        );
    }

    #[test]
    fn test_remove_folder_reparents_contents() {
        let mut library = QueryLibrary::new();
        let root = library.add_folder("Root", "").unwrap();
        let middle = library.add_folder("Middle", &root).unwrap();
        let leaf = library.add_folder("Leaf", &middle).unwrap();
        let query = library
            .add_query(&create_test_draft("Elves", "", "t:elf", &middle))
            .unwrap();

        library.remove_folder(&middle).unwrap();

        assert!(library.get_folder(&middle).is_none());
        assert_eq!(library.get_folder(&leaf).unwrap().parent_id, root);
        assert_eq!(library.get_query(&query).unwrap().folder_id, root);
    }

    #[test]
    fn test_remove_top_level_folder_unfiles_queries() {
        let mut library = QueryLibrary::new();
        let root = library.add_folder("Root", "").unwrap();
        let child = library.add_folder("Child", &root).unwrap();
        let query = library.add_query(&create_test_draft("Elves", "", "t:elf", &root)).unwrap();

        library.remove_folder(&root).unwrap();

        assert_eq!(library.get_folder(&child).unwrap().parent_id, "");
        assert!(library.get_query(&query).unwrap().is_unfiled());
        assert_eq!(
            library.remove_folder(&root),
            Err(LibraryError::FolderNotFound(root.clone()))
        );
    }

    #[test]
    fn test_remove_folder_with_dangling_parent() {
        let mut library = QueryLibrary::from_parts(
            Vec::new(),
            vec![
                Folder { id: "f1".to_string(), name: "Lost".to_string(), parent_id: "f_gone".to_string() },
                Folder { id: "f2".to_string(), name: "Child".to_string(), parent_id: "f1".to_string() },
            ],
        );

        library.remove_folder("f1").unwrap();

        assert_eq!(library.get_folder("f2").unwrap().parent_id, "");
    }

    #[test]
    fn test_queries_in_folder() {
        let mut library = QueryLibrary::new();
        let folder = library.add_folder("Colors", "").unwrap();
        library.add_query(&create_test_draft("Red", "", "c:r", &folder)).unwrap();
        library.add_query(&create_test_draft("Loose", "", "t:elf", "")).unwrap();

        assert_eq!(library.queries_in_folder(&folder).len(), 1);
        assert_eq!(library.queries_in_folder("").len(), 1);
    }

    #[test]
    fn test_shortcut_map_and_conflicts() {
        let mut library = QueryLibrary::new();
        library.add_query(&create_test_draft("Red", "r", "c:r", "")).unwrap();
        library.add_query(&create_test_draft("Red 2", "R", "c:r t:instant", "")).unwrap();
        library.add_query(&create_test_draft("Green", "g", "c:g", "")).unwrap();

        let map = library.shortcut_map();

        assert_eq!(map.get("r"), Some("c:r t:instant"));
        assert_eq!(library.shortcut_conflicts(), vec!["r".to_string()]);
    }
}
