/// "Saved queries" dropdown injected next to the homepage links

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement, MouseEvent, Node};

use crate::content::interceptor::find_search_input;
use crate::expansion::{ShortcutMap, expand_nested, search_url};
use crate::folders::group_by_folder;
use crate::library::QueryLibrary;
use crate::query_data::SavedQuery;
use crate::storage::{StorageArea, load_library};

#[wasm_bindgen(module = "/js/bridge.js")]
extern "C" {
    fn extensionUrl(path: &str) -> String;
}

const INJECTED_MARKER: &str = "queryStashInjected";
const STYLE_ID: &str = "query-stash-styles";
const COLLAPSED_CLASS: &str = "qs-group--collapsed";

const DROPDOWN_CSS: &str = r#"
.qs-wrap { display: inline-block; position: relative; margin: 0 0 0 6px; }
.qs-trigger { margin: 0 !important; color: #58a6ff !important; background: #161b22 !important; border: 1px solid #30363d !important; border-radius: 8px !important; padding: 6px 12px !important; font-size: 13px !important; font-weight: 500 !important; font-family: inherit !important; cursor: pointer !important; }
.qs-trigger:hover { color: #79b8ff !important; background: #21262d !important; border-color: #58a6ff !important; }
.qs-trigger-icon { width: 16px; height: 16px; vertical-align: middle; margin-right: 4px; }
.qs-panel { position: absolute; left: 0; top: 100%; margin-top: 4px; min-width: 220px; max-height: 320px; overflow-y: auto; background: #161b22; border: 1px solid #30363d; border-radius: 8px; box-shadow: 0 8px 24px rgba(0,0,0,0.4); z-index: 9999; padding: 6px 0; }
.qs-row { display: flex; align-items: center; gap: 8px; padding: 4px 12px; }
.qs-row:hover { background: #21262d; }
.qs-row-icon { flex-shrink: 0; width: 16px; text-align: center; color: #8b949e; font-size: 12px; }
.qs-row-icon::before { content: "\1F50D"; }
.qs-row a { flex: 1; min-width: 0; padding: 4px 0; color: #e6edf3; text-decoration: none; font-size: 13px; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
.qs-row a:hover { color: #58a6ff; }
.qs-paste { flex-shrink: 0; padding: 4px 8px; font-size: 11px; color: #58a6ff; background: transparent; border: 1px solid #30363d; border-radius: 6px; cursor: pointer; }
.qs-group-header { padding: 4px 12px 2px; font-size: 11px; color: #8b949e; font-weight: 600; cursor: pointer; user-select: none; }
.qs-group-header::before { content: "\25BC "; font-size: 10px; }
.qs-group--collapsed .qs-group-header::before { content: "\25B6 "; }
.qs-group--collapsed .qs-group-body { display: none; }
.qs-empty { padding: 12px; color: #8b949e; font-size: 13px; }
"#;

pub fn is_homepage() -> bool {
    web_sys::window()
        .and_then(|window| window.location().pathname().ok())
        .is_some_and(|path| path.is_empty() || path == "/")
}

pub fn is_injected(container: &HtmlElement) -> bool {
    container.dataset().get(INJECTED_MARKER).is_some()
}

fn inject_styles(document: &Document) -> Result<(), JsValue> {
    if document.get_element_by_id(STYLE_ID).is_some() {
        return Ok(());
    }

    let style = document.create_element("style")?;
    style.set_id(STYLE_ID);
    style.set_text_content(Some(DROPDOWN_CSS));
    if let Some(head) = document.head() {
        head.append_child(&style)?;
    }
    Ok(())
}

fn set_aria_expanded(element: &Element, expanded: bool) -> Result<(), JsValue> {
    element.set_attribute("aria-expanded", if expanded { "true" } else { "false" })
}

#[derive(Clone)]
struct Dropdown {
    document: Document,
    trigger: HtmlElement,
    panel: HtmlElement,
}

impl Dropdown {
    fn set_expanded(&self, expanded: bool) {
        self.panel.set_hidden(!expanded);
        if let Err(e) = set_aria_expanded(&self.trigger, expanded) {
            warn!("Could not update dropdown state: {:?}", e);
        }
    }

    fn close(&self) {
        self.set_expanded(false);
    }

    fn open<S: StorageArea + 'static>(&self, storage: S) {
        self.set_expanded(true);

        let dropdown = self.clone();
        spawn_local(async move {
            let library = match load_library(&storage).await {
                Ok(library) => library,
                Err(e) => {
                    warn!("Could not load saved queries: {}", e);
                    QueryLibrary::new()
                }
            };
            if let Err(e) = dropdown.render(&library) {
                warn!("Could not render saved queries: {:?}", e);
            }
        });
    }

    fn render(&self, library: &QueryLibrary) -> Result<(), JsValue> {
        self.panel.set_inner_html("");

        if library.queries.is_empty() {
            let empty = self.document.create_element("div")?;
            empty.set_class_name("qs-empty");
            empty.set_text_content(Some("No saved queries. Use the extension to add some."));
            self.panel.append_child(&empty)?;
            return Ok(());
        }

        let shortcuts = library.shortcut_map();
        for group in group_by_folder(&library.queries, &library.folders) {
            match group.folder {
                None => {
                    for query in &group.queries {
                        self.panel.append_child(&self.make_row(query, &shortcuts)?.into())?;
                    }
                }
                Some(folder) if !group.queries.is_empty() => {
                    let rows = group
                        .queries
                        .iter()
                        .map(|query| self.make_row(query, &shortcuts))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.panel.append_child(&self.make_group(&folder.name, rows)?.into())?;
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn make_row(&self, query: &SavedQuery, shortcuts: &ShortcutMap) -> Result<Element, JsValue> {
        let expanded = expand_nested(query.query.trim(), shortcuts);

        let row = self.document.create_element("div")?;
        row.set_class_name("qs-row");

        let icon = self.document.create_element("span")?;
        icon.set_class_name("qs-row-icon");
        icon.set_attribute("aria-hidden", "true")?;

        let link = self.document.create_element("a")?;
        link.set_attribute("href", &search_url(&expanded))?;
        link.set_attribute("title", &expanded)?;
        let name = if query.name.is_empty() { "Unnamed" } else { query.name.as_str() };
        link.set_text_content(Some(name));

        let paste = self.document.create_element("button")?;
        paste.set_class_name("qs-paste");
        paste.set_attribute("type", "button")?;
        paste.set_attribute("title", "Paste into search bar")?;
        paste.set_text_content(Some("Paste"));

        let dropdown = self.clone();
        let on_paste = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            event.prevent_default();
            event.stop_propagation();
            if let Some(input) = find_search_input(&dropdown.document) {
                input.set_value(&expanded);
                if let Err(e) = input.focus() {
                    warn!("Could not focus search box: {:?}", e);
                }
            }
            dropdown.close();
        });
        paste.add_event_listener_with_callback("click", on_paste.as_ref().unchecked_ref())?;
        on_paste.forget();

        row.append_child(&icon)?;
        row.append_child(&link)?;
        row.append_child(&paste)?;
        Ok(row)
    }

    /// A folder section, collapsed until its header is clicked
    fn make_group(&self, title: &str, rows: Vec<Element>) -> Result<Element, JsValue> {
        let section = self.document.create_element("div")?;
        section.set_class_name(&format!("qs-group {}", COLLAPSED_CLASS));

        let header = self.document.create_element("div")?;
        header.set_class_name("qs-group-header");
        header.set_attribute("role", "button")?;
        header.set_attribute("aria-expanded", "false")?;
        header.set_text_content(Some(title));

        let body = self.document.create_element("div")?;
        body.set_class_name("qs-group-body");
        for row in rows {
            body.append_child(&row)?;
        }

        let toggled = section.clone();
        let header_ref = header.clone();
        let on_toggle = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
            let result = toggled
                .class_list()
                .toggle(COLLAPSED_CLASS)
                .and_then(|collapsed| set_aria_expanded(&header_ref, !collapsed));
            if let Err(e) = result {
                warn!("Could not toggle folder group: {:?}", e);
            }
        });
        header.add_event_listener_with_callback("click", on_toggle.as_ref().unchecked_ref())?;
        on_toggle.forget();

        section.append_child(&header)?;
        section.append_child(&body)?;
        Ok(section)
    }
}

/// Add the dropdown to `container`; returns false if it is already there
pub fn inject_dropdown<S>(document: &Document, container: &HtmlElement, storage: S) -> Result<bool, JsValue>
where
    S: StorageArea + Clone + 'static,
{
    if is_injected(container) {
        return Ok(false);
    }
    container.dataset().set(INJECTED_MARKER, "true")?;
    inject_styles(document)?;

    let wrap = document.create_element("span")?;
    wrap.set_class_name("qs-wrap");

    let trigger: HtmlElement = document.create_element("button")?.dyn_into()?;
    trigger.set_class_name("qs-trigger");
    trigger.set_attribute("type", "button")?;
    trigger.set_attribute("aria-haspopup", "true")?;
    trigger.set_attribute("aria-expanded", "false")?;

    let icon = document.create_element("img")?;
    icon.set_class_name("qs-trigger-icon");
    icon.set_attribute("src", &extensionUrl("icons/icon16.png"))?;
    icon.set_attribute("alt", "")?;
    trigger.append_child(&icon)?;
    trigger.append_child(&document.create_text_node("Saved queries"))?;

    let panel: HtmlElement = document.create_element("div")?.dyn_into()?;
    panel.set_class_name("qs-panel");
    panel.set_hidden(true);

    wrap.append_child(&trigger)?;
    wrap.append_child(&panel)?;

    let dropdown = Dropdown {
        document: document.clone(),
        trigger: trigger.clone(),
        panel: panel.clone(),
    };

    let toggle = dropdown.clone();
    let on_trigger = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        event.prevent_default();
        event.stop_propagation();
        if toggle.panel.hidden() {
            toggle.open(storage.clone());
        } else {
            toggle.close();
        }
    });
    trigger.add_event_listener_with_callback_and_bool("click", on_trigger.as_ref().unchecked_ref(), true)?;
    on_trigger.forget();

    let outside = dropdown.clone();
    let wrap_node: Node = wrap.clone().into();
    let on_document_click = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        let inside = event
            .target()
            .and_then(|target| target.dyn_into::<Node>().ok())
            .is_some_and(|node| wrap_node.contains(Some(&node)));
        if !inside {
            outside.close();
        }
    });
    document.add_event_listener_with_callback("click", on_document_click.as_ref().unchecked_ref())?;
    on_document_click.forget();

    let on_panel_click = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        let clicked_link = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .is_some_and(|element| element.tag_name().eq_ignore_ascii_case("a"));
        if clicked_link {
            dropdown.close();
        }
    });
    panel.add_event_listener_with_callback("click", on_panel_click.as_ref().unchecked_ref())?;
    on_panel_click.forget();

    container.append_child(&wrap)?;
    Ok(true)
}
