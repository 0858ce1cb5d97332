/// Search box keystroke interception
///
/// On space or enter, a value starting with a known `?shortcut` is replaced
/// by its expansion; enter then submits the search. Keystrokes for unknown
/// shortcuts are replayed with their normal effect.

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlInputElement, KeyboardEvent, SelectionMode};

use crate::expansion::{
    ShortcutMap, TriggerKey, build_shortcut_map, expand_leading_shortcut, recognize_shortcut_prefix,
    search_url,
};
use crate::storage::{StorageArea, load_queries};

/// `data-*` marker set on inputs that already have a listener
const ATTACHED_MARKER: &str = "queryStashAttached";

/// Most specific first
const SEARCH_INPUT_SELECTORS: [&str; 4] = [
    "input[name=\"q\"]",
    "input[type=\"search\"]",
    "form[action*=\"search\"] input[type=\"text\"]",
    "input[placeholder*=\"earch\" i], input[placeholder*=\"ind\" i]",
];

pub fn find_search_input(document: &Document) -> Option<HtmlInputElement> {
    SEARCH_INPUT_SELECTORS
        .iter()
        .filter_map(|selector| document.query_selector(selector).ok().flatten())
        .find_map(|element| element.dyn_into::<HtmlInputElement>().ok())
}

pub fn is_attached(input: &HtmlInputElement) -> bool {
    input.dataset().get(ATTACHED_MARKER).is_some()
}

/// Listen for trigger keystrokes on `input`; returns false if already attached
pub fn attach_interceptor<S>(input: &HtmlInputElement, storage: S) -> Result<bool, JsValue>
where
    S: StorageArea + Clone + 'static,
{
    if is_attached(input) {
        return Ok(false);
    }
    input.dataset().set(ATTACHED_MARKER, "true")?;

    let target = input.clone();
    let on_keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        let Some(trigger) = TriggerKey::from_key(&event.key()) else {
            return;
        };

        let value = target.value();
        if recognize_shortcut_prefix(value.trim_start()).is_none() {
            return;
        }

        // The lookup is async, so hold the keystroke now and replay it on a miss
        event.prevent_default();

        let input = target.clone();
        let storage = storage.clone();
        spawn_local(async move {
            apply_expansion(&input, &storage, &value, trigger).await;
        });
    });

    input.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref())?;
    on_keydown.forget();
    Ok(true)
}

async fn apply_expansion<S: StorageArea>(input: &HtmlInputElement, storage: &S, value: &str, trigger: TriggerKey) {
    let shortcuts = match load_queries(storage).await {
        Ok(queries) => build_shortcut_map(&queries),
        Err(e) => {
            warn!("Could not load saved queries: {}", e);
            ShortcutMap::new()
        }
    };

    match expand_leading_shortcut(value, &shortcuts, trigger) {
        Some(expanded) => {
            input.set_value(&expanded);
            if trigger == TriggerKey::Enter {
                submit_search(input, &expanded);
            }
        }
        None => replay_keystroke(input, trigger),
    }
}

/// Reproduce the default effect of a keystroke that was held back
fn replay_keystroke(input: &HtmlInputElement, trigger: TriggerKey) {
    let result = match trigger {
        TriggerKey::Space => match (input.selection_start(), input.selection_end()) {
            (Ok(Some(start)), Ok(Some(end))) => {
                input.set_range_text_with_start_and_end_and_selection_mode(" ", start, end, SelectionMode::End)
            }
            _ => {
                input.set_value(&format!("{} ", input.value()));
                Ok(())
            }
        },
        // requestSubmit fires the submit event like a real enter would
        TriggerKey::Enter => match input.form() {
            Some(form) => form.request_submit(),
            None => Ok(()),
        },
    };

    if let Err(e) = result {
        warn!("Could not replay {:?} keystroke: {:?}", trigger, e);
    }
}

/// Submit an expanded search through the owning form, or navigate to the
/// search page if there is none
fn submit_search(input: &HtmlInputElement, query: &str) {
    let result = match input.form() {
        Some(form) => form.submit(),
        None => match web_sys::window() {
            Some(window) => window.location().set_href(&search_url(query)),
            None => Ok(()),
        },
    };

    if let Err(e) = result {
        warn!("Could not submit search: {:?}", e);
    }
}
