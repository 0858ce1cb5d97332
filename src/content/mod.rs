/// Content script for the search site
///
/// Attaches the `?shortcut` interceptor to the search box and, on the
/// homepage, the saved-queries dropdown. Pages that build their DOM late
/// are handled by a debounced mutation observer that retries until both
/// are in place.

pub mod dropdown;
pub mod interceptor;

use std::cell::Cell;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlElement, MutationObserver, MutationObserverInit};

use crate::activity_log::ActivityLog;
use crate::config::OBSERVER_DEBOUNCE_MS;
use crate::storage::ChromeStorage;

use dropdown::{inject_dropdown, is_homepage, is_injected};
use interceptor::{attach_interceptor, find_search_input, is_attached};

const HOMEPAGE_LINKS_SELECTOR: &str = ".homepage-links";

pub fn start() -> Result<(), JsValue> {
    spawn_local(async {
        ActivityLog::new(ChromeStorage::local())
            .info("Content script loaded")
            .await;
    });

    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("No document"))?;

    if setup(&document) {
        return Ok(());
    }
    observe_until_ready(document)
}

/// Attach whatever is present; true once nothing is left to do
fn setup(document: &Document) -> bool {
    let input_ready = match find_search_input(document) {
        Some(input) => {
            if let Err(e) = attach_interceptor(&input, ChromeStorage::sync()) {
                warn!("Could not attach to search input: {:?}", e);
            }
            is_attached(&input)
        }
        None => false,
    };

    if !is_homepage() {
        return input_ready;
    }

    let dropdown_ready = match homepage_links(document) {
        Some(container) => {
            if let Err(e) = inject_dropdown(document, &container, ChromeStorage::sync()) {
                warn!("Could not add saved queries dropdown: {:?}", e);
            }
            is_injected(&container)
        }
        None => false,
    };

    input_ready && dropdown_ready
}

fn homepage_links(document: &Document) -> Option<HtmlElement> {
    document
        .query_selector(HOMEPAGE_LINKS_SELECTOR)
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<HtmlElement>().ok())
}

fn observe_until_ready(document: Document) -> Result<(), JsValue> {
    let Some(body) = document.body() else {
        return Ok(());
    };

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let pending = Rc::new(Cell::new(None::<i32>));
    let observer_slot: Rc<Cell<Option<MutationObserver>>> = Rc::new(Cell::new(None));

    let retry = {
        let document = document.clone();
        let pending = pending.clone();
        let observer_slot = observer_slot.clone();
        Closure::<dyn FnMut()>::new(move || {
            pending.set(None);
            if setup(&document) {
                if let Some(observer) = observer_slot.take() {
                    observer.disconnect();
                }
            }
        })
    };

    let on_mutation = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
        move |_: js_sys::Array, _: MutationObserver| {
            if let Some(handle) = pending.take() {
                window.clear_timeout_with_handle(handle);
            }
            match window.set_timeout_with_callback_and_timeout_and_arguments_0(
                retry.as_ref().unchecked_ref(),
                OBSERVER_DEBOUNCE_MS,
            ) {
                Ok(handle) => pending.set(Some(handle)),
                Err(e) => warn!("Could not schedule setup retry: {:?}", e),
            }
        },
    );

    let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer.observe_with_options(&body, &options)?;
    observer_slot.set(Some(observer));

    on_mutation.forget();
    Ok(())
}
