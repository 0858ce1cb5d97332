/// Extension pages built with Yew

pub mod components;
pub mod export_preview;
pub mod log_viewer;
pub mod manager;
pub mod popup;

use log::warn;
use wasm_bindgen::prelude::*;

use crate::activity_log::{ActivityLog, browser_now_iso};
use crate::errors::StorageError;
use crate::library::QueryLibrary;
use crate::storage::{ChromeStorage, StorageArea, load_library, save_library, stash_export_preview};
use crate::transfer::{ExportDocument, parse_import};

pub const MANAGER_PAGE: &str = "manage.html";
pub const LOG_PAGE: &str = "log.html";
pub const EXPORT_PREVIEW_PAGE: &str = "export.html";

// Import JS bridge functions
#[wasm_bindgen(module = "/js/bridge.js")]
extern "C" {
    fn openExtensionPage(path: &str);

    fn downloadFile(data: &str, filename: &str);

    #[wasm_bindgen(catch)]
    async fn copyText(text: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn readSelectedFile(input: &web_sys::HtmlInputElement) -> Result<JsValue, JsValue>;
}

pub fn open_page(path: &str) {
    openExtensionPage(path);
}

pub fn download_text(data: &str, filename: &str) {
    downloadFile(data, filename);
}

pub async fn copy_to_clipboard(text: &str) -> Result<(), String> {
    copyText(text).await.map_err(js_message)
}

/// Text of the file chosen in `input`, or None if nothing is selected
pub async fn read_file_text(input: &web_sys::HtmlInputElement) -> Result<Option<String>, String> {
    let text = readSelectedFile(input).await.map_err(js_message)?;
    Ok(text.as_string())
}

/// Best-effort message from a rejected promise
pub fn js_message(err: JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", err))
}

pub fn sync_storage() -> ChromeStorage {
    ChromeStorage::sync()
}

pub fn diagnostics() -> ActivityLog<ChromeStorage> {
    ActivityLog::new(ChromeStorage::local())
}

pub async fn load_saved() -> Result<QueryLibrary, StorageError> {
    load_library(&sync_storage()).await
}

pub async fn persist(library: &QueryLibrary) -> Result<(), StorageError> {
    save_library(&sync_storage(), library).await
}

pub fn export_json(library: &QueryLibrary) -> Result<(String, String), String> {
    let exported_at = browser_now_iso();
    let json = ExportDocument::from_library(library, &exported_at)
        .to_json_pretty()
        .map_err(|e| format!("Failed to serialize export: {}", e))?;
    Ok((json, exported_at))
}

/// Hand the export to the preview page and open it
pub async fn preview_export(library: &QueryLibrary) -> Result<(), String> {
    let (json, _) = export_json(library)?;
    stash_export_preview(&ChromeStorage::local(), &json)
        .await
        .map_err(|e| format!("Failed to stage export: {}", e))?;
    open_page(EXPORT_PREVIEW_PAGE);
    Ok(())
}

/// Parse and persist an import, replacing the whole library
///
/// Nothing is written when the text does not parse. The outcome goes to `log`.
pub async fn import_text<S, L>(text: &str, storage: &S, log: &ActivityLog<L>) -> Result<QueryLibrary, String>
where
    S: StorageArea,
    L: StorageArea,
{
    let result = match parse_import(text) {
        Ok(library) => match save_library(storage, &library).await {
            Ok(()) => Ok(library),
            Err(e) => Err(format!("Failed to save import: {}", e)),
        },
        Err(e) => Err(e.to_string()),
    };

    match &result {
        Ok(library) => {
            log.info(&format!(
                "Imported {} queries and {} folders",
                library.queries.len(),
                library.folders.len()
            ))
            .await;
        }
        Err(message) => log.error("Import failed", Some(message.as_str())).await,
    }
    result
}

pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.alert_with_message(message) {
            warn!("Could not show alert: {:?}", e);
        }
    }
}

pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Show `next` immediately and save it in the background
pub fn commit_library(
    library: &yew::UseStateHandle<QueryLibrary>,
    status: &yew::UseStateHandle<components::Status>,
    next: QueryLibrary,
) {
    library.set(next.clone());
    let status = status.clone();
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = persist(&next).await {
            status.set(components::Status::Error(format!("Failed to save: {}", e)));
        }
    });
}
