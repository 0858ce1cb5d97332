/// Compile-time configuration for Query Stash

/// Search page that saved queries are opened against
pub const SEARCH_BASE_URL: &str = "https://scryfall.com/search";

/// Synced storage key holding the saved query list
pub const QUERIES_KEY: &str = "queries";

/// Synced storage key holding the folder list
pub const FOLDERS_KEY: &str = "folders";

/// Local storage key used to hand an export payload to the preview page
pub const EXPORT_PREVIEW_KEY: &str = "exportPreview";

/// Local storage key for the diagnostic log ring buffer
pub const ACTIVITY_LOG_KEY: &str = "activityLog";

/// Oldest entries are dropped past this many
pub const MAX_LOG_ENTRIES: usize = 150;

/// Only the log viewer's storage read is bounded
pub const LOG_READ_TIMEOUT_MS: i32 = 5_000;

/// Version written into export documents
pub const EXPORT_VERSION: u32 = 1;

pub const MAX_NAME_LEN: usize = 80;
pub const MAX_SHORTCUT_LEN: usize = 40;
pub const MAX_FOLDER_NAME_LEN: usize = 60;

/// Debounce for the content script's DOM observer
pub const OBSERVER_DEBOUNCE_MS: i32 = 200;
