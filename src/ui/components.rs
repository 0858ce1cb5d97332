/// Reusable UI components

use patternfly_yew::prelude::*;
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;

use crate::config::{MAX_FOLDER_NAME_LEN, MAX_NAME_LEN, MAX_SHORTCUT_LEN};
use crate::folders::folder_tree;
use crate::query_data::{Folder, QueryDraft};

#[derive(Clone, PartialEq)]
pub enum Status {
    Idle,
    Loading(String),
    Notice(String),
    Error(String),
}

impl Status {
    pub fn is_busy(&self) -> bool {
        matches!(self, Status::Loading(_))
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusBannerProps {
    pub status: Status,
}

#[function_component(StatusBanner)]
pub fn status_banner(props: &StatusBannerProps) -> Html {
    match &props.status {
        Status::Loading(msg) => html! {
            <div class="loading-text-center">
                <Spinner />
                <p class="loading-text">{msg}</p>
            </div>
        },
        Status::Notice(msg) => html! {
            <Alert r#type={AlertType::Success} title={msg.clone()} inline={true} />
        },
        Status::Error(err) => html! {
            <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                {err.clone()}
            </Alert>
        },
        Status::Idle => html! {},
    }
}

pub fn input_value(e: &InputEvent) -> Option<String> {
    e.target_dyn_into::<HtmlInputElement>().map(|input| input.value())
}

pub fn textarea_value(e: &InputEvent) -> Option<String> {
    e.target_dyn_into::<HtmlTextAreaElement>().map(|area| area.value())
}

pub fn select_value(e: &Event) -> Option<String> {
    e.target_dyn_into::<HtmlSelectElement>().map(|select| select.value())
}

/// Folder names indented by depth
pub fn indented_name(name: &str, depth: usize) -> String {
    format!("{}{}", "\u{a0}\u{a0}".repeat(depth), name)
}

#[derive(Properties, PartialEq)]
pub struct FolderSelectProps {
    pub folders: Vec<Folder>,
    pub selected: String,
    pub onchange: Callback<String>,
    #[prop_or_default]
    pub exclude: Option<String>,
    #[prop_or(AttrValue::Static("No folder"))]
    pub empty_label: AttrValue,
}

#[function_component(FolderSelect)]
pub fn folder_select(props: &FolderSelectProps) -> Html {
    let onchange = {
        let onchange = props.onchange.clone();
        Callback::from(move |e: Event| {
            if let Some(value) = select_value(&e) {
                onchange.emit(value);
            }
        })
    };

    html! {
        <select class="form-select" aria-label="Folder" {onchange}>
            <option value="" selected={props.selected.is_empty()}>{props.empty_label.clone()}</option>
            {for folder_tree(&props.folders)
                .into_iter()
                .filter(|node| props.exclude.as_deref() != Some(node.folder.id.as_str()))
                .map(|node| html! {
                    <option
                        key={node.folder.id.clone()}
                        value={node.folder.id.clone()}
                        selected={node.folder.id == props.selected}
                    >
                        {indented_name(&node.folder.name, node.depth)}
                    </option>
                })}
        </select>
    }
}

#[derive(Properties, PartialEq)]
pub struct QueryFormProps {
    pub folders: Vec<Folder>,
    #[prop_or_default]
    pub initial: QueryDraft,
    pub on_submit: Callback<QueryDraft>,
    pub on_cancel: Callback<()>,
    #[prop_or(AttrValue::Static("Save"))]
    pub submit_label: AttrValue,
}

/// Name, shortcut, folder and query fields; submit is ignored until name
/// and query are filled in
#[function_component(QueryForm)]
pub fn query_form(props: &QueryFormProps) -> Html {
    let draft = use_state(|| props.initial.clone());

    let on_name = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                draft.set(QueryDraft { name: value, ..(*draft).clone() });
            }
        })
    };

    let on_shortcut = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                draft.set(QueryDraft { shortcut: value, ..(*draft).clone() });
            }
        })
    };

    let on_query = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = textarea_value(&e) {
                draft.set(QueryDraft { query: value, ..(*draft).clone() });
            }
        })
    };

    let on_folder = {
        let draft = draft.clone();
        Callback::from(move |folder_id: String| {
            draft.set(QueryDraft { folder_id, ..(*draft).clone() });
        })
    };

    let can_submit = !draft.name.trim().is_empty() && !draft.query.trim().is_empty();

    let onsubmit = {
        let draft = draft.clone();
        let on_submit = props.on_submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if !draft.name.trim().is_empty() && !draft.query.trim().is_empty() {
                on_submit.emit((*draft).clone());
            }
        })
    };

    let onkeydown = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Escape" {
                on_cancel.emit(());
            }
        })
    };

    html! {
        <form class="query-form" {onsubmit} {onkeydown}>
            <input
                type="text"
                class="form-input"
                placeholder="Name"
                aria-label="Query name"
                maxlength={MAX_NAME_LEN.to_string()}
                value={draft.name.clone()}
                oninput={on_name}
            />
            <input
                type="text"
                class="form-input"
                placeholder="Shortcut (e.g. commander for ?commander)"
                aria-label="Shortcut"
                maxlength={MAX_SHORTCUT_LEN.to_string()}
                value={draft.shortcut.clone()}
                oninput={on_shortcut}
            />
            <FolderSelect
                folders={props.folders.clone()}
                selected={draft.folder_id.clone()}
                onchange={on_folder}
            />
            <textarea
                class="form-input form-input--query"
                rows="3"
                placeholder="Search query"
                aria-label="Query"
                value={draft.query.clone()}
                oninput={on_query}
            />
            <div class="form-actions">
                <button type="submit" class="pf-v5-c-button pf-m-primary" disabled={!can_submit}>
                    {props.submit_label.clone()}
                </button>
                <Button onclick={props.on_cancel.reform(|_| ())} variant={ButtonVariant::Link}>
                    {"Cancel"}
                </Button>
            </div>
        </form>
    }
}

#[derive(Properties, PartialEq)]
pub struct FolderFormProps {
    pub folders: Vec<Folder>,
    pub on_submit: Callback<(String, String)>,
    pub on_cancel: Callback<()>,
    /// Offer a parent folder picker
    #[prop_or(false)]
    pub with_parent: bool,
}

#[function_component(FolderForm)]
pub fn folder_form(props: &FolderFormProps) -> Html {
    let name = use_state(String::new);
    let parent_id = use_state(String::new);

    let on_name = {
        let name = name.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                name.set(value);
            }
        })
    };

    let on_parent = {
        let parent_id = parent_id.clone();
        Callback::from(move |value: String| parent_id.set(value))
    };

    let onsubmit = {
        let name = name.clone();
        let parent_id = parent_id.clone();
        let on_submit = props.on_submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if !name.trim().is_empty() {
                on_submit.emit(((*name).clone(), (*parent_id).clone()));
            }
        })
    };

    html! {
        <form class="folder-form" {onsubmit}>
            <input
                type="text"
                class="form-input"
                placeholder="Folder name"
                aria-label="Folder name"
                maxlength={MAX_FOLDER_NAME_LEN.to_string()}
                value={(*name).clone()}
                oninput={on_name}
            />
            if props.with_parent {
                <FolderSelect
                    folders={props.folders.clone()}
                    selected={(*parent_id).clone()}
                    onchange={on_parent}
                    empty_label={"Top level"}
                />
            }
            <div class="form-actions">
                <button type="submit" class="pf-v5-c-button pf-m-primary" disabled={name.trim().is_empty()}>
                    {"Create folder"}
                </button>
                <Button onclick={props.on_cancel.reform(|_| ())} variant={ButtonVariant::Link}>
                    {"Cancel"}
                </Button>
            </div>
        </form>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indented_name() {
        assert_eq!(indented_name("Decks", 0), "Decks");
        assert_eq!(indented_name("Elves", 2), "\u{a0}\u{a0}\u{a0}\u{a0}Elves");
    }

    #[test]
    fn test_status_busy() {
        assert!(Status::Loading("Loading...".to_string()).is_busy());
        assert!(!Status::Error("nope".to_string()).is_busy());
        assert!(!Status::Idle.is_busy());
    }
}
