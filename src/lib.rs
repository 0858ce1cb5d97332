/// Query Stash - saved search queries with `?shortcut` expansion
/// Built with Rust + WASM + Yew

pub mod activity_log;
pub mod config;
pub mod content;
pub mod errors;
pub mod expansion;
pub mod folders;
pub mod library;
pub mod query_data;
pub mod storage;
pub mod transfer;
pub mod ui;

use wasm_bindgen::prelude::*;

use crate::expansion::{TriggerKey, build_shortcut_map, expand_leading_shortcut};
use crate::query_data::SavedQuery;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the toolbar popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the full manager page
#[wasm_bindgen]
pub fn start_manager() {
    yew::Renderer::<ui::manager::Manager>::new().render();
}

#[wasm_bindgen]
pub fn start_log_viewer() {
    yew::Renderer::<ui::log_viewer::LogViewer>::new().render();
}

#[wasm_bindgen]
pub fn start_export_preview() {
    yew::Renderer::<ui::export_preview::ExportPreview>::new().render();
}

// Hook the search page: shortcut expansion and the homepage dropdown
#[wasm_bindgen]
pub fn start_content_script() -> Result<(), JsValue> {
    content::start()
}

/// Expand a leading `?shortcut` in a search box value
///
/// `queries_json` is the stored query list; `trigger` is a DOM key name
/// (" " or "Enter"). Returns undefined when nothing expands.
#[wasm_bindgen]
pub fn expand_search_text(value: &str, queries_json: &str, trigger: &str) -> Option<String> {
    let trigger = TriggerKey::from_key(trigger)?;
    let queries: Vec<SavedQuery> = serde_json::from_str(queries_json).ok()?;
    expand_leading_shortcut(value, &build_shortcut_map(&queries), trigger)
}
