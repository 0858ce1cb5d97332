/// Diagnostic log kept in a rotating buffer in chrome.storage.local
///
/// Entries are also forwarded to the console through the `log` facade.

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::{ACTIVITY_LOG_KEY, MAX_LOG_ENTRIES};
use crate::errors::StorageError;
use crate::storage::StorageArea;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 timestamp
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
}

impl LogEntry {
    pub fn new(t: &str, level: LogLevel, msg: &str, ctx: Option<Value>) -> Self {
        LogEntry {
            t: t.to_string(),
            level,
            msg: msg.to_string(),
            ctx,
        }
    }

    /// Context as shown in the viewer: its `message` if it has one
    pub fn context_text(&self) -> Option<String> {
        match self.ctx.as_ref()? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            ctx => match ctx.get("message").and_then(Value::as_str) {
                Some(message) => Some(message.to_string()),
                None => Some(ctx.to_string()),
            },
        }
    }
}

/// Stored shape of the log: `{ "entries": [...] }`, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBook {
    #[serde(default)]
    pub entries: Vec<LogEntry>,
}

impl LogBook {
    /// Lenient read of a stored book; malformed entries are skipped
    pub fn from_value(value: Value) -> Self {
        let items = match value {
            Value::Object(mut book) => match book.remove("entries") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let entries = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed log entry: {}", e);
                    None
                }
            })
            .collect();
        LogBook { entries }
    }

    /// Append, dropping the oldest entries past `MAX_LOG_ENTRIES`
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
        if self.entries.len() > MAX_LOG_ENTRIES {
            let overflow = self.entries.len() - MAX_LOG_ENTRIES;
            self.entries.drain(..overflow);
        }
    }

    pub fn newest_first(&self) -> Vec<LogEntry> {
        self.entries.iter().rev().cloned().collect()
    }
}

/// Current time from the browser clock
pub fn browser_now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

pub struct ActivityLog<S: StorageArea> {
    storage: S,
    clock: fn() -> String,
}

impl<S: StorageArea> ActivityLog<S> {
    pub fn new(storage: S) -> Self {
        ActivityLog {
            storage,
            clock: browser_now_iso,
        }
    }

    pub fn with_clock(storage: S, clock: fn() -> String) -> Self {
        ActivityLog { storage, clock }
    }

    async fn read_book(&self) -> Result<LogBook, StorageError> {
        match self.storage.get_value(ACTIVITY_LOG_KEY).await? {
            Some(value) => Ok(LogBook::from_value(value)),
            None => Ok(LogBook::default()),
        }
    }

    async fn write_book(&self, book: &LogBook) -> Result<(), StorageError> {
        let value = serde_json::to_value(book).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set_value(ACTIVITY_LOG_KEY, &value).await
    }

    /// Persist an entry; failures only reach the console
    pub async fn append(&self, entry: LogEntry) {
        let result = async {
            let mut book = self.read_book().await?;
            book.push(entry);
            self.write_book(&book).await
        }
        .await;

        if let Err(e) = result {
            warn!("Could not write activity log: {}", e);
        }
    }

    pub async fn info(&self, msg: &str) {
        info!("{}", msg);
        self.append(LogEntry::new(&(self.clock)(), LogLevel::Info, msg, None))
            .await;
    }

    pub async fn warn(&self, msg: &str) {
        warn!("{}", msg);
        self.append(LogEntry::new(&(self.clock)(), LogLevel::Warn, msg, None))
            .await;
    }

    pub async fn error(&self, msg: &str, detail: Option<&str>) {
        match detail {
            Some(detail) => error!("{}: {}", msg, detail),
            None => error!("{}", msg),
        }
        let ctx = detail.map(|message| json!({ "message": message }));
        self.append(LogEntry::new(&(self.clock)(), LogLevel::Error, msg, ctx))
            .await;
    }

    /// All entries, oldest first
    pub async fn entries(&self) -> Result<Vec<LogEntry>, StorageError> {
        Ok(self.read_book().await?.entries)
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.write_book(&LogBook::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use futures::executor::block_on;

    fn fixed_clock() -> String {
        "2026-10-16T09:30:00.000Z".to_string()
    }

    fn create_test_entry(n: usize) -> LogEntry {
        LogEntry::new("2026-10-16T09:30:00.000Z", LogLevel::Info, &format!("entry {}", n), None)
    }

    #[test]
    fn test_log_book_caps_entries() {
        let mut book = LogBook::default();
        for n in 0..MAX_LOG_ENTRIES + 5 {
            book.push(create_test_entry(n));
        }

        assert_eq!(book.entries.len(), MAX_LOG_ENTRIES);
        assert_eq!(book.entries[0].msg, "entry 5");
        assert_eq!(book.newest_first()[0].msg, format!("entry {}", MAX_LOG_ENTRIES + 4));
    }

    #[test]
    fn test_entry_serialization() {
        let entry = LogEntry::new("t", LogLevel::Error, "Import failed", Some(json!({"message": "Invalid JSON."})));

        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["level"], "error");
        assert_eq!(json["ctx"]["message"], "Invalid JSON.");
        assert!(serde_json::to_value(create_test_entry(1)).unwrap().get("ctx").is_none());
    }

    #[test]
    fn test_context_text() {
        let with_message = LogEntry::new("t", LogLevel::Error, "m", Some(json!({"message": "boom"})));
        let with_object = LogEntry::new("t", LogLevel::Error, "m", Some(json!({"code": 3})));

        assert_eq!(with_message.context_text(), Some("boom".to_string()));
        assert_eq!(with_object.context_text(), Some("{\"code\":3}".to_string()));
        assert_eq!(create_test_entry(0).context_text(), None);
    }

    #[test]
    fn test_activity_log_append_and_clear() {
        let log = ActivityLog::with_clock(MemoryStorage::new(), fixed_clock);

        block_on(log.info("Content script loaded"));
        block_on(log.error("Import failed", Some("Invalid JSON.")));

        let entries = block_on(log.entries()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].t, "2026-10-16T09:30:00.000Z");
        assert_eq!(entries[1].context_text(), Some("Invalid JSON.".to_string()));

        block_on(log.clear()).unwrap();
        assert!(block_on(log.entries()).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_log_reads_as_empty() {
        let storage = MemoryStorage::new();
        block_on(storage.set_value(ACTIVITY_LOG_KEY, &json!("garbage"))).unwrap();
        let log = ActivityLog::with_clock(storage, fixed_clock);

        assert!(block_on(log.entries()).unwrap().is_empty());
        block_on(log.warn("recovered"));
        assert_eq!(block_on(log.entries()).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_entry_keeps_the_rest() {
        let storage = MemoryStorage::new();
        block_on(storage.set_value(
            ACTIVITY_LOG_KEY,
            &json!({"entries": [
                {"t": "a", "level": "info", "msg": "first"},
                42,
                {"t": "b", "level": "loud", "msg": "bad level"},
                {"t": "c", "level": "error", "msg": "second"}
            ]}),
        ))
        .unwrap();
        let log = ActivityLog::with_clock(storage, fixed_clock);

        block_on(log.info("third"));

        let messages: Vec<String> = block_on(log.entries())
            .unwrap()
            .into_iter()
            .map(|entry| entry.msg)
            .collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }
}
