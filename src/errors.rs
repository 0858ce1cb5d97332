/// Error types for Query Stash
use std::fmt;

// === StorageError ===

/// Errors raised while talking to the extension's key-value storage.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The extension storage API is not reachable from this context.
    Unavailable,
    /// A value could not be converted to or from JSON.
    Serialization(String),
    /// The JS bridge rejected the call.
    Bridge(String),
    /// The read did not complete within the configured bound.
    TimedOut,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "Storage not available"),
            StorageError::Serialization(msg) => write!(f, "Serialization failed: {}", msg),
            StorageError::Bridge(msg) => write!(f, "Storage call failed: {}", msg),
            StorageError::TimedOut => write!(f, "Storage timed out"),
        }
    }
}

impl std::error::Error for StorageError {}

// === LibraryError ===

/// Errors raised by edits to the saved query library.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryError {
    /// A required field was empty after trimming.
    MissingField(&'static str),
    /// No saved query has the given id.
    QueryNotFound(String),
    /// No folder has the given id.
    FolderNotFound(String),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::MissingField(field) => write!(f, "Missing required field: {}", field),
            LibraryError::QueryNotFound(id) => write!(f, "Query not found: {}", id),
            LibraryError::FolderNotFound(id) => write!(f, "Folder not found: {}", id),
        }
    }
}

impl std::error::Error for LibraryError {}

// === ImportError ===

/// Errors raised when an import document is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The text is not valid JSON.
    InvalidJson(String),
    /// The JSON is not an object with `queries` and `folders` arrays.
    InvalidFormat,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::InvalidJson(_) => write!(f, "Invalid JSON."),
            ImportError::InvalidFormat => write!(f, "Invalid file format."),
        }
    }
}

impl std::error::Error for ImportError {}
