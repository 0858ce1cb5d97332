use futures::executor::block_on;
use query_stash::activity_log::{ActivityLog, LogLevel};
use query_stash::expansion::{TriggerKey, build_shortcut_map, expand_leading_shortcut, search_url};
use query_stash::library::QueryLibrary;
use query_stash::query_data::QueryDraft;
use query_stash::storage::{MemoryStorage, load_library, load_queries, save_library};
use query_stash::transfer::{ExportDocument, parse_import};
use query_stash::ui::import_text;

fn create_test_draft(name: &str, shortcut: &str, query: &str, folder_id: &str) -> QueryDraft {
    QueryDraft {
        name: name.to_string(),
        shortcut: shortcut.to_string(),
        query: query.to_string(),
        folder_id: folder_id.to_string(),
    }
}

fn fixed_clock() -> String {
    "2026-10-16T09:30:00.000Z".to_string()
}

#[test]
fn test_saved_shortcut_expands_in_search_box() {
    let storage = MemoryStorage::new();
    let mut library = QueryLibrary::new();
    library
        .add_query(&create_test_draft("Commander", " CMD ", "legal:commander", ""))
        .unwrap();
    block_on(save_library(&storage, &library)).unwrap();

    let queries = block_on(load_queries(&storage)).unwrap();
    let shortcuts = build_shortcut_map(&queries);

    assert_eq!(
        expand_leading_shortcut("?cmd creature", &shortcuts, TriggerKey::Space),
        Some("legal:commander creature".to_string())
    );
    assert_eq!(
        expand_leading_shortcut("?CMD", &shortcuts, TriggerKey::Enter),
        Some("legal:commander".to_string())
    );
    assert_eq!(expand_leading_shortcut("?other", &shortcuts, TriggerKey::Space), None);
}

#[test]
fn test_nested_shortcuts_reach_the_search_url() {
    let mut library = QueryLibrary::new();
    library
        .add_query(&create_test_draft("Commander", "cmd", "legal:commander", ""))
        .unwrap();
    library
        .add_query(&create_test_draft("Elves", "elves", "t:elf ?cmd", ""))
        .unwrap();

    let expanded = expand_leading_shortcut("?elves", &library.shortcut_map(), TriggerKey::Enter).unwrap();

    assert_eq!(expanded, "t:elf legal:commander");
    assert_eq!(
        search_url(&expanded),
        "https://scryfall.com/search?q=t%3Aelf%20legal%3Acommander"
    );
}

#[test]
fn test_export_import_through_storage() {
    let source = MemoryStorage::new();
    let mut library = QueryLibrary::new();
    let decks = library.add_folder("Decks", "").unwrap();
    let tribal = library.add_folder("Tribal", &decks).unwrap();
    library
        .add_query(&create_test_draft("Elves", "elves", "t:elf", &tribal))
        .unwrap();
    library
        .add_query(&create_test_draft("Red", "", "c:r", ""))
        .unwrap();
    block_on(save_library(&source, &library)).unwrap();

    let stored = block_on(load_library(&source)).unwrap();
    let json = ExportDocument::from_library(&stored, "2026-10-16T09:30:00.000Z")
        .to_json_pretty()
        .unwrap();

    let target = MemoryStorage::new();
    let imported = parse_import(&json).unwrap();
    block_on(save_library(&target, &imported)).unwrap();

    assert_eq!(block_on(load_library(&target)).unwrap(), library);
}

#[test]
fn test_removing_folder_keeps_queries_reachable() {
    let storage = MemoryStorage::new();
    let mut library = QueryLibrary::new();
    let decks = library.add_folder("Decks", "").unwrap();
    let tribal = library.add_folder("Tribal", &decks).unwrap();
    let elves = library
        .add_query(&create_test_draft("Elves", "elves", "t:elf", &tribal))
        .unwrap();

    library.remove_folder(&tribal).unwrap();
    block_on(save_library(&storage, &library)).unwrap();

    let reloaded = block_on(load_library(&storage)).unwrap();
    assert_eq!(reloaded.get_query(&elves).unwrap().folder_id, decks);
    assert_eq!(reloaded.folders.len(), 1);
}

#[test]
fn test_failed_import_keeps_library_and_is_logged() {
    let storage = MemoryStorage::new();
    let mut library = QueryLibrary::new();
    library
        .add_query(&create_test_draft("Commander", "cmd", "legal:commander", ""))
        .unwrap();
    block_on(save_library(&storage, &library)).unwrap();
    let log = ActivityLog::with_clock(MemoryStorage::new(), fixed_clock);

    let bad_json = block_on(import_text("{not json", &storage, &log)).unwrap_err();
    let bad_shape = block_on(import_text("{\"queries\": []}", &storage, &log)).unwrap_err();

    assert_eq!(bad_json, "Invalid JSON.");
    assert_eq!(bad_shape, "Invalid file format.");
    assert_eq!(block_on(load_library(&storage)).unwrap(), library);

    let entries = block_on(log.entries()).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.level == LogLevel::Error && entry.msg == "Import failed"));
    assert_eq!(entries[1].context_text(), Some("Invalid file format.".to_string()));
}

#[test]
fn test_import_replaces_library_and_is_logged() {
    let storage = MemoryStorage::new();
    let mut existing = QueryLibrary::new();
    existing
        .add_query(&create_test_draft("Old", "old", "c:w", ""))
        .unwrap();
    block_on(save_library(&storage, &existing)).unwrap();
    let log = ActivityLog::with_clock(MemoryStorage::new(), fixed_clock);

    let text = r#"{
        "version": 1,
        "folders": [{"id": "f1", "name": "Decks"}],
        "queries": [{"id": "q1", "name": "Elves", "shortcut": "elves", "query": "t:elf", "folderId": "f1"}]
    }"#;
    let imported = block_on(import_text(text, &storage, &log)).unwrap();

    assert_eq!(block_on(load_library(&storage)).unwrap(), imported);
    assert_eq!(imported.queries.len(), 1);
    assert_eq!(imported.queries[0].folder_id, "f1");

    let entries = block_on(log.entries()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Info);
    assert_eq!(entries[0].msg, "Imported 1 queries and 1 folders");
}
