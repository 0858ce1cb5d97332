/// Folder tree ordering and query grouping

use crate::query_data::{Folder, SavedQuery};
use std::collections::{HashMap, HashSet};

/// A folder placed in the tree, with its nesting depth (0 = top-level)
#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode<'a> {
    pub folder: &'a Folder,
    pub depth: usize,
}

/// Queries filed under one folder (`None` = unfiled)
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGroup<'a> {
    pub folder: Option<&'a Folder>,
    pub depth: usize,
    pub queries: Vec<&'a SavedQuery>,
}

impl QueryGroup<'_> {
    pub fn title(&self) -> &str {
        self.folder.map_or("No folder", |f| f.name.as_str())
    }
}

/// Index of the first folder carrying each id
fn index_by_id(folders: &[Folder]) -> HashMap<&str, usize> {
    folders
        .iter()
        .enumerate()
        .fold(HashMap::new(), |mut index, (i, folder)| {
            index.entry(folder.id.as_str()).or_insert(i);
            index
        })
}

/// Parent index for each folder, or `None` for top-level
///
/// A parent reference that does not resolve, or a chain that loops back on
/// itself, makes the folder top-level.
fn effective_parents(folders: &[Folder], index: &HashMap<&str, usize>) -> Vec<Option<usize>> {
    let resolve = |i: usize| -> Option<usize> {
        let parent_id = folders[i].parent_id.trim();
        if parent_id.is_empty() {
            return None;
        }
        index.get(parent_id).copied().filter(|&p| p != i)
    };

    (0..folders.len())
        .map(|i| {
            let parent = resolve(i)?;
            let mut visited = HashSet::from([i]);
            let mut current = parent;
            loop {
                if !visited.insert(current) {
                    return None;
                }
                match resolve(current) {
                    Some(next) => current = next,
                    None => return Some(parent),
                }
            }
        })
        .collect()
}

/// Depth-first ordering of the folder forest
///
/// Siblings keep their stored order. Every folder appears exactly once, even
/// with dangling or cyclic parent references.
pub fn folder_tree(folders: &[Folder]) -> Vec<FolderNode<'_>> {
    let index = index_by_id(folders);
    let parents = effective_parents(folders, &index);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); folders.len()];
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    let mut ordered = Vec::with_capacity(folders.len());
    let mut stack: Vec<(usize, usize)> = roots.into_iter().rev().map(|i| (i, 0)).collect();
    while let Some((i, depth)) = stack.pop() {
        ordered.push(FolderNode {
            folder: &folders[i],
            depth,
        });
        stack.extend(children[i].iter().rev().map(|&child| (child, depth + 1)));
    }
    ordered
}

/// Group queries by folder: unfiled first, then folders in tree order
///
/// Queries pointing at a folder that does not exist land in the unfiled group.
pub fn group_by_folder<'a>(queries: &'a [SavedQuery], folders: &'a [Folder]) -> Vec<QueryGroup<'a>> {
    let tree = folder_tree(folders);
    let known: HashSet<&str> = folders.iter().map(|f| f.id.as_str()).collect();

    let mut by_folder: HashMap<&str, Vec<&SavedQuery>> = HashMap::new();
    for query in queries {
        let folder_id = query.folder_id.trim();
        let key = if known.contains(folder_id) { folder_id } else { "" };
        by_folder.entry(key).or_default().push(query);
    }

    let mut groups = vec![QueryGroup {
        folder: None,
        depth: 0,
        queries: by_folder.remove("").unwrap_or_default(),
    }];

    for node in tree {
        groups.push(QueryGroup {
            folder: Some(node.folder),
            depth: node.depth,
            queries: by_folder.remove(node.folder.id.as_str()).unwrap_or_default(),
        });
    }
    groups
}

/// Human-readable path such as `Decks / Elves`
pub fn folder_path(folder_id: &str, folders: &[Folder]) -> Option<String> {
    let index = index_by_id(folders);
    let parents = effective_parents(folders, &index);

    let mut current = *index.get(folder_id.trim())?;
    let mut names = vec![folders[current].name.as_str()];
    while let Some(parent) = parents[current] {
        names.push(folders[parent].name.as_str());
        current = parent;
    }

    names.reverse();
    Some(names.join(" / "))
}
