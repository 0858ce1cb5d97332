/// Toolbar popup: grouped saved query list with quick add/edit

use std::collections::HashSet;

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::config::MAX_FOLDER_NAME_LEN;
use crate::expansion::{ShortcutMap, expand_nested, search_url};
use crate::folders::group_by_folder;
use crate::library::QueryLibrary;
use crate::query_data::{Folder, QueryDraft, SavedQuery};
use crate::ui::components::{FolderForm, QueryForm, Status, StatusBanner, input_value, textarea_value};
use crate::ui::{
    LOG_PAGE, MANAGER_PAGE, alert, commit_library, diagnostics, import_text, load_saved, open_page, preview_export,
    sync_storage,
};

#[derive(Clone, Copy, PartialEq)]
enum OpenForm {
    None,
    Query,
    Folder,
    Import,
}

/// Folder id used for the unfiled section in the collapsed set
const UNFILED_SECTION: &str = "";

#[function_component(App)]
pub fn app() -> Html {
    let library = use_state(QueryLibrary::new);
    let status = use_state(|| Status::Loading("Loading saved queries...".to_string()));
    let open_form = use_state(|| OpenForm::None);
    let editing = use_state(|| None::<String>);
    let renaming = use_state(|| None::<String>);
    let collapsed = use_state(HashSet::<String>::new);
    let import_buffer = use_state(String::new);

    // Load library on mount
    {
        let library = library.clone();
        let status = status.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                match load_saved().await {
                    Ok(data) => {
                        library.set(data);
                        status.set(Status::Idle);
                    }
                    Err(e) => {
                        status.set(Status::Error(format!("Failed to load: {}", e)));
                    }
                }
            });
            || ()
        });
    }

    let toggle_form = {
        let open_form = open_form.clone();
        move |form: OpenForm| {
            let open_form = open_form.clone();
            Callback::from(move |_: MouseEvent| {
                open_form.set(if *open_form == form { OpenForm::None } else { form });
            })
        }
    };

    let close_form = {
        let open_form = open_form.clone();
        Callback::from(move |_: ()| open_form.set(OpenForm::None))
    };

    let on_add_query = {
        let library = library.clone();
        let status = status.clone();
        let open_form = open_form.clone();

        Callback::from(move |draft: QueryDraft| {
            let mut next = (*library).clone();
            match next.add_query(&draft) {
                Ok(_) => {
                    commit_library(&library, &status, next);
                    open_form.set(OpenForm::None);
                }
                Err(e) => status.set(Status::Error(e.to_string())),
            }
        })
    };

    let on_add_folder = {
        let library = library.clone();
        let status = status.clone();
        let open_form = open_form.clone();

        Callback::from(move |(name, _parent): (String, String)| {
            let mut next = (*library).clone();
            match next.add_folder(&name, "") {
                Ok(_) => {
                    commit_library(&library, &status, next);
                    open_form.set(OpenForm::None);
                }
                Err(e) => status.set(Status::Error(e.to_string())),
            }
        })
    };

    let on_start_edit = {
        let editing = editing.clone();
        Callback::from(move |query_id: String| editing.set(Some(query_id)))
    };

    let on_cancel_edit = {
        let editing = editing.clone();
        Callback::from(move |_: ()| editing.set(None))
    };

    let on_save_edit = {
        let library = library.clone();
        let status = status.clone();
        let editing = editing.clone();

        Callback::from(move |(query_id, draft): (String, QueryDraft)| {
            let mut next = (*library).clone();
            match next.update_query(&query_id, &draft) {
                Ok(()) => {
                    commit_library(&library, &status, next);
                    editing.set(None);
                }
                Err(e) => status.set(Status::Error(e.to_string())),
            }
        })
    };

    let on_delete_query = {
        let library = library.clone();
        let status = status.clone();

        Callback::from(move |query_id: String| {
            let mut next = (*library).clone();
            if next.remove_query(&query_id) {
                commit_library(&library, &status, next);
            }
        })
    };

    let on_toggle_section = {
        let collapsed = collapsed.clone();
        Callback::from(move |section: String| {
            let mut next = (*collapsed).clone();
            if !next.remove(&section) {
                next.insert(section);
            }
            collapsed.set(next);
        })
    };

    let on_start_rename = {
        let renaming = renaming.clone();
        Callback::from(move |folder_id: String| renaming.set(Some(folder_id)))
    };

    let on_finish_rename = {
        let library = library.clone();
        let status = status.clone();
        let renaming = renaming.clone();

        Callback::from(move |(folder_id, name): (String, Option<String>)| {
            renaming.set(None);
            let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
                return;
            };
            let mut next = (*library).clone();
            match next.rename_folder(&folder_id, &name) {
                Ok(()) => commit_library(&library, &status, next),
                Err(e) => status.set(Status::Error(e.to_string())),
            }
        })
    };

    let on_delete_folder = {
        let library = library.clone();
        let status = status.clone();

        Callback::from(move |folder_id: String| {
            let mut next = (*library).clone();
            match next.remove_folder(&folder_id) {
                Ok(()) => commit_library(&library, &status, next),
                Err(e) => status.set(Status::Error(e.to_string())),
            }
        })
    };

    let on_export = {
        let library = library.clone();
        let status = status.clone();

        Callback::from(move |_: MouseEvent| {
            let library = (*library).clone();
            let status = status.clone();
            spawn_local(async move {
                if let Err(e) = preview_export(&library).await {
                    status.set(Status::Error(e));
                }
            });
        })
    };

    let on_import_input = {
        let import_buffer = import_buffer.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = textarea_value(&e) {
                import_buffer.set(value);
            }
        })
    };

    let on_import = {
        let library = library.clone();
        let status = status.clone();
        let open_form = open_form.clone();
        let import_buffer = import_buffer.clone();

        Callback::from(move |_: MouseEvent| {
            let text = (*import_buffer).clone();
            let library = library.clone();
            let status = status.clone();
            let open_form = open_form.clone();
            let import_buffer = import_buffer.clone();

            status.set(Status::Loading("Importing...".to_string()));
            spawn_local(async move {
                match import_text(&text, &sync_storage(), &diagnostics()).await {
                    Ok(imported) => {
                        status.set(Status::Notice(format!("Imported {} queries", imported.queries.len())));
                        library.set(imported);
                        import_buffer.set(String::new());
                        open_form.set(OpenForm::None);
                    }
                    Err(e) => {
                        alert(&format!("Import failed: {}", e));
                        status.set(Status::Error(format!("Import failed: {}", e)));
                    }
                }
            });
        })
    };

    let is_busy = status.is_busy();
    let shortcuts = library.shortcut_map();

    html! {
        <div class="padding-20">
            <div class="popup-header">
                <h1 class="popup-title">{"Saved queries"}</h1>
                <div class="popup-actions">
                    <Button onclick={toggle_form(OpenForm::Query)} disabled={is_busy} variant={ButtonVariant::Primary}>
                        {"+ Query"}
                    </Button>
                    <Button onclick={toggle_form(OpenForm::Folder)} disabled={is_busy} variant={ButtonVariant::Secondary}>
                        {"+ Folder"}
                    </Button>
                </div>
            </div>

            <StatusBanner status={(*status).clone()} />

            {match *open_form {
                OpenForm::Query => html! {
                    <QueryForm
                        folders={library.folders.clone()}
                        on_submit={on_add_query}
                        on_cancel={close_form.clone()}
                        submit_label={"Add"}
                    />
                },
                OpenForm::Folder => html! {
                    <FolderForm
                        folders={library.folders.clone()}
                        on_submit={on_add_folder}
                        on_cancel={close_form.clone()}
                    />
                },
                OpenForm::Import => html! {
                    <div class="import-box">
                        <textarea
                            class="form-input form-input--query"
                            rows="6"
                            placeholder="Paste exported JSON"
                            aria-label="Import JSON"
                            value={(*import_buffer).clone()}
                            oninput={on_import_input}
                        />
                        <div class="form-actions">
                            <Button onclick={on_import} disabled={is_busy || import_buffer.trim().is_empty()} variant={ButtonVariant::Primary}>
                                {"Import"}
                            </Button>
                            <Button onclick={close_form.reform(|_| ())} variant={ButtonVariant::Link}>
                                {"Cancel"}
                            </Button>
                        </div>
                    </div>
                },
                OpenForm::None => html! {},
            }}

            if library.queries.is_empty() && library.folders.is_empty() {
                <div class="empty-state">
                    <p>{"No saved queries yet."}</p>
                    <p class="empty-state-hint">{"Add one, then type ?shortcut in the search box."}</p>
                </div>
            } else {
                <ul class="query-list">
                    {for group_by_folder(&library.queries, &library.folders).into_iter().filter_map(|group| {
                        let section_id = group.folder.map_or(UNFILED_SECTION.to_string(), |f| f.id.clone());
                        if group.folder.is_none() && group.queries.is_empty() {
                            return None;
                        }
                        let rows: Html = group.queries.iter().map(|query| html! {
                            <QueryRow
                                key={query.id.clone()}
                                query={(*query).clone()}
                                href={query_href(query, &shortcuts)}
                                folders={library.folders.clone()}
                                is_editing={(*editing).as_deref() == Some(query.id.as_str())}
                                on_edit={on_start_edit.clone()}
                                on_delete={on_delete_query.clone()}
                                on_save={on_save_edit.clone()}
                                on_cancel={on_cancel_edit.clone()}
                            />
                        }).collect();

                        Some(html! {
                            <FolderSection
                                key={format!("section-{}", section_id)}
                                folder={group.folder.cloned()}
                                depth={group.depth}
                                count={group.queries.len()}
                                collapsed={collapsed.contains(&section_id)}
                                renaming={group.folder.is_some() && (*renaming).as_deref() == Some(section_id.as_str())}
                                on_toggle={on_toggle_section.clone()}
                                on_start_rename={on_start_rename.clone()}
                                on_finish_rename={on_finish_rename.clone()}
                                on_delete={on_delete_folder.clone()}
                            >
                                {rows}
                            </FolderSection>
                        })
                    })}
                </ul>
            }

            <div class="popup-footer">
                <Button onclick={Callback::from(|_: MouseEvent| open_page(MANAGER_PAGE))} variant={ButtonVariant::Link}>
                    {"Manage"}
                </Button>
                <Button onclick={on_export} disabled={is_busy} variant={ButtonVariant::Link}>
                    {"Export"}
                </Button>
                <Button onclick={toggle_form(OpenForm::Import)} disabled={is_busy} variant={ButtonVariant::Link}>
                    {"Import"}
                </Button>
                <Button onclick={Callback::from(|_: MouseEvent| open_page(LOG_PAGE))} variant={ButtonVariant::Link}>
                    {"Log"}
                </Button>
            </div>
        </div>
    }
}

/// Search link for a saved query, with nested shortcuts resolved
fn query_href(query: &SavedQuery, shortcuts: &ShortcutMap) -> String {
    search_url(&expand_nested(query.query.trim(), shortcuts))
}

#[derive(Properties, PartialEq)]
struct FolderSectionProps {
    /// None for the unfiled section
    folder: Option<Folder>,
    depth: usize,
    count: usize,
    collapsed: bool,
    renaming: bool,
    on_toggle: Callback<String>,
    on_start_rename: Callback<String>,
    on_finish_rename: Callback<(String, Option<String>)>,
    on_delete: Callback<String>,
    children: Html,
}

#[function_component(FolderSection)]
fn folder_section(props: &FolderSectionProps) -> Html {
    let section_id = props
        .folder
        .as_ref()
        .map_or(UNFILED_SECTION.to_string(), |f| f.id.clone());

    let on_toggle = {
        let section_id = section_id.clone();
        props.on_toggle.reform(move |_: MouseEvent| section_id.clone())
    };

    let class = classes!(
        "folder-section",
        props.collapsed.then_some("folder-section--collapsed")
    );
    let indent = format!("padding-left: {}px;", props.depth * 12);

    html! {
        <li {class} style={indent}>
            <div class="folder-header" role="button" aria-expanded={(!props.collapsed).to_string()}>
                {match &props.folder {
                    Some(folder) if props.renaming => html! {
                        <RenameInput
                            initial={folder.name.clone()}
                            on_done={props.on_finish_rename.reform({
                                let folder_id = folder.id.clone();
                                move |name: Option<String>| (folder_id.clone(), name)
                            })}
                        />
                    },
                    Some(folder) => html! {
                        <>
                            <span class="folder-name" onclick={on_toggle}>{&folder.name}</span>
                            <span class="folder-count">{format!("({})", props.count)}</span>
                            <div class="folder-actions">
                                <Button
                                    onclick={props.on_start_rename.reform({
                                        let folder_id = folder.id.clone();
                                        move |_| folder_id.clone()
                                    })}
                                    variant={ButtonVariant::Plain}
                                >
                                    {"✎"}
                                </Button>
                                <Button
                                    onclick={props.on_delete.reform({
                                        let folder_id = folder.id.clone();
                                        move |_| folder_id.clone()
                                    })}
                                    variant={ButtonVariant::Plain}
                                >
                                    {"✕"}
                                </Button>
                            </div>
                        </>
                    },
                    None => html! {
                        <span class="folder-name" onclick={on_toggle}>{"No folder"}</span>
                    },
                }}
            </div>
            if !props.collapsed {
                <ul class="folder-queries">
                    {props.children.clone()}
                </ul>
            }
        </li>
    }
}

#[derive(Properties, PartialEq)]
struct RenameInputProps {
    initial: String,
    /// None when the rename was cancelled
    on_done: Callback<Option<String>>,
}

#[function_component(RenameInput)]
fn rename_input(props: &RenameInputProps) -> Html {
    let value = use_state(|| props.initial.clone());

    let oninput = {
        let value = value.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(text) = input_value(&e) {
                value.set(text);
            }
        })
    };

    let onkeydown = {
        let value = value.clone();
        let on_done = props.on_done.clone();
        Callback::from(move |e: KeyboardEvent| match e.key().as_str() {
            "Enter" => on_done.emit(Some((*value).clone())),
            "Escape" => on_done.emit(None),
            _ => {}
        })
    };

    let onblur = {
        let value = value.clone();
        props.on_done.reform(move |_: FocusEvent| Some((*value).clone()))
    };

    html! {
        <input
            type="text"
            class="folder-rename-input"
            aria-label="Folder name"
            maxlength={MAX_FOLDER_NAME_LEN.to_string()}
            value={(*value).clone()}
            {oninput}
            {onkeydown}
            {onblur}
        />
    }
}

#[derive(Properties, PartialEq)]
struct QueryRowProps {
    query: SavedQuery,
    href: String,
    folders: Vec<Folder>,
    is_editing: bool,
    on_edit: Callback<String>,
    on_delete: Callback<String>,
    on_save: Callback<(String, QueryDraft)>,
    on_cancel: Callback<()>,
}

#[function_component(QueryRow)]
fn query_row(props: &QueryRowProps) -> Html {
    let query = &props.query;

    if props.is_editing {
        let query_id = query.id.clone();
        return html! {
            <li class="query-item editing">
                <QueryForm
                    folders={props.folders.clone()}
                    initial={QueryDraft::from_query(query)}
                    on_submit={props.on_save.reform(move |draft| (query_id.clone(), draft))}
                    on_cancel={props.on_cancel.clone()}
                />
            </li>
        };
    }

    html! {
        <li class="query-item">
            <a class="query-link" href={props.href.clone()} target="_blank" rel="noopener">
                <span class="query-label">
                    {&query.name}
                    if let Some(shortcut) = query.display_shortcut() {
                        <span class="query-shortcut">{format!(" {}", shortcut)}</span>
                    }
                </span>
                <span class="query-text">{&query.query}</span>
            </a>
            <div class="query-actions">
                <Button
                    onclick={props.on_edit.reform({
                        let query_id = query.id.clone();
                        move |_| query_id.clone()
                    })}
                    variant={ButtonVariant::Plain}
                >
                    {"✎"}
                </Button>
                <Button
                    onclick={props.on_delete.reform({
                        let query_id = query.id.clone();
                        move |_| query_id.clone()
                    })}
                    variant={ButtonVariant::Plain}
                >
                    {"✕"}
                </Button>
            </div>
        </li>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::build_shortcut_map;

    #[test]
    fn test_query_href_resolves_nested_shortcuts() {
        let queries = vec![
            SavedQuery::new("Commander", "cmd", "legal:commander", ""),
            SavedQuery::new("Elves", "", "t:elf ?cmd", ""),
        ];
        let shortcuts = build_shortcut_map(&queries);

        assert_eq!(
            query_href(&queries[1], &shortcuts),
            "https://scryfall.com/search?q=t%3Aelf%20legal%3Acommander"
        );
    }
}
