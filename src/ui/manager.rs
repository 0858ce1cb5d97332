/// Full-page manager for folders and saved queries

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::folders::{folder_path, folder_tree};
use crate::library::QueryLibrary;
use crate::query_data::{Folder, QueryDraft, SavedQuery};
use crate::transfer::export_filename;
use crate::ui::components::{FolderForm, QueryForm, Status, StatusBanner, indented_name, textarea_value};
use crate::ui::{
    alert, commit_library, confirm, diagnostics, download_text, export_json, import_text, load_saved, read_file_text,
    sync_storage,
};
use crate::expansion::{expand_nested, search_url};

const QUERY_PREVIEW_CHARS: usize = 50;

#[derive(Clone, Copy, PartialEq)]
enum OpenForm {
    None,
    Query,
    Folder,
    Paste,
}

#[function_component(Manager)]
pub fn manager() -> Html {
    let library = use_state(QueryLibrary::new);
    let status = use_state(|| Status::Loading("Loading saved queries...".to_string()));
    let open_form = use_state(|| OpenForm::None);
    let editing = use_state(|| None::<String>);
    let paste_buffer = use_state(String::new);
    let file_input = use_node_ref();

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

    let show_form = {
        let open_form = open_form.clone();
        move |form: OpenForm| {
            let open_form = open_form.clone();
            Callback::from(move |_: MouseEvent| open_form.set(form))
        }
    };

    let close_form = {
        let open_form = open_form.clone();
        Callback::from(move |_: ()| open_form.set(OpenForm::None))
    };

    let on_add_folder = {
        let library = library.clone();
        let status = status.clone();
        let open_form = open_form.clone();

        Callback::from(move |(name, parent_id): (String, String)| {
            let mut next = (*library).clone();
            match next.add_folder(&name, &parent_id) {
                Ok(_) => {
                    commit_library(&library, &status, next);
                    open_form.set(OpenForm::None);
                }
                Err(e) => status.set(Status::Error(e.to_string())),
            }
        })
    };

    let on_rename_folder = {
        let library = library.clone();
        let status = status.clone();

        Callback::from(move |folder: Folder| {
            let Some(name) = prompt("Folder name:", &folder.name) else {
                return;
            };
            if name.trim().is_empty() {
                return;
            }
            let mut next = (*library).clone();
            match next.rename_folder(&folder.id, &name) {
                Ok(()) => commit_library(&library, &status, next),
                Err(e) => status.set(Status::Error(e.to_string())),
            }
        })
    };

    let on_delete_folder = {
        let library = library.clone();
        let status = status.clone();

        Callback::from(move |folder_id: String| {
            if !confirm("Delete this folder? Its subfolders and queries move up one level.") {
                return;
            }
            let mut next = (*library).clone();
            match next.remove_folder(&folder_id) {
                Ok(()) => commit_library(&library, &status, next),
                Err(e) => status.set(Status::Error(e.to_string())),
            }
        })
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

    let on_edit_query = {
        let editing = editing.clone();
        Callback::from(move |query_id: String| editing.set(Some(query_id)))
    };

    let on_cancel_edit = {
        let editing = editing.clone();
        Callback::from(move |_: ()| editing.set(None))
    };

    let on_save_query = {
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
            if !confirm("Delete this query?") {
                return;
            }
            let mut next = (*library).clone();
            if next.remove_query(&query_id) {
                commit_library(&library, &status, next);
            }
        })
    };

    let on_export = {
        let library = library.clone();
        let status = status.clone();

        Callback::from(move |_: MouseEvent| match export_json(&library) {
            Ok((json, exported_at)) => download_text(&json, &export_filename(&exported_at)),
            Err(e) => status.set(Status::Error(e)),
        })
    };

    let run_import = {
        let library = library.clone();
        let status = status.clone();
        let open_form = open_form.clone();
        let paste_buffer = paste_buffer.clone();

        move |text: String| {
            let library = library.clone();
            let status = status.clone();
            let open_form = open_form.clone();
            let paste_buffer = paste_buffer.clone();

            status.set(Status::Loading("Importing...".to_string()));
            spawn_local(async move {
                match import_text(&text, &sync_storage(), &diagnostics()).await {
                    Ok(imported) => {
                        status.set(Status::Notice(format!(
                            "Imported {} queries and {} folders",
                            imported.queries.len(),
                            imported.folders.len()
                        )));
                        library.set(imported);
                        paste_buffer.set(String::new());
                        open_form.set(OpenForm::None);
                    }
                    Err(e) => {
                        alert(&format!("Import failed: {}", e));
                        status.set(Status::Error(format!("Import failed: {}", e)));
                    }
                }
            });
        }
    };

    let on_choose_file = {
        let file_input = file_input.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(input) = file_input.cast::<HtmlInputElement>() {
                input.set_value("");
                input.click();
            }
        })
    };

    let on_file_selected = {
        let status = status.clone();
        let run_import = run_import.clone();

        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let status = status.clone();
            let run_import = run_import.clone();
            spawn_local(async move {
                match read_file_text(&input).await {
                    Ok(Some(text)) => run_import(text),
                    Ok(None) => {}
                    Err(e) => status.set(Status::Error(format!("Could not read file: {}", e))),
                }
            });
        })
    };

    let on_paste_input = {
        let paste_buffer = paste_buffer.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = textarea_value(&e) {
                paste_buffer.set(value);
            }
        })
    };

    let on_paste_import = {
        let paste_buffer = paste_buffer.clone();
        Callback::from(move |_: MouseEvent| run_import((*paste_buffer).clone()))
    };

    let is_busy = status.is_busy();
    let shortcuts = library.shortcut_map();
    let conflicts = library.shortcut_conflicts();

    html! {
        <div class="container">
            <div class="header">
                <h1 class="main-title">{"Saved queries"}</h1>
                <div class="header-actions">
                    <Button onclick={on_export} disabled={is_busy} variant={ButtonVariant::Secondary}>
                        {"Export"}
                    </Button>
                    <Button onclick={on_choose_file} disabled={is_busy} variant={ButtonVariant::Secondary}>
                        {"Import file"}
                    </Button>
                    <Button onclick={show_form(OpenForm::Paste)} disabled={is_busy} variant={ButtonVariant::Secondary}>
                        {"Paste import"}
                    </Button>
                    <input
                        ref={file_input}
                        type="file"
                        accept="application/json,.json"
                        class="hidden"
                        onchange={on_file_selected}
                    />
                </div>
            </div>

            <StatusBanner status={(*status).clone()} />

            if !conflicts.is_empty() {
                <Alert r#type={AlertType::Warning} title={"Shortcut used more than once"} inline={true}>
                    {conflicts.iter().map(|s| format!("?{}", s)).collect::<Vec<_>>().join(", ")}
                </Alert>
            }

            if *open_form == OpenForm::Paste {
                <div class="import-box">
                    <textarea
                        class="form-input form-input--query"
                        rows="8"
                        placeholder="Paste exported JSON"
                        aria-label="Import JSON"
                        value={(*paste_buffer).clone()}
                        oninput={on_paste_input}
                    />
                    <div class="form-actions">
                        <Button onclick={on_paste_import} disabled={is_busy || paste_buffer.trim().is_empty()} variant={ButtonVariant::Primary}>
                            {"Import"}
                        </Button>
                        <Button onclick={close_form.reform(|_| ())} variant={ButtonVariant::Link}>
                            {"Cancel"}
                        </Button>
                    </div>
                </div>
            }

            <div class="manager-layout">
                <section class="folders-panel">
                    <div class="panel-header">
                        <h2 class="panel-title">{"Folders"}</h2>
                        <Button onclick={show_form(OpenForm::Folder)} disabled={is_busy} variant={ButtonVariant::Secondary}>
                            {"+ Folder"}
                        </Button>
                    </div>

                    if *open_form == OpenForm::Folder {
                        <FolderForm
                            folders={library.folders.clone()}
                            on_submit={on_add_folder}
                            on_cancel={close_form.clone()}
                            with_parent={true}
                        />
                    }

                    <ul class="folder-list">
                        if library.folders.is_empty() {
                            <li class="folder-item folder-item--empty">{"No folders"}</li>
                        }
                        {for folder_tree(&library.folders).into_iter().map(|node| {
                            let folder = node.folder.clone();
                            let count = library.queries_in_folder(&folder.id).len();
                            html! {
                                <li key={folder.id.clone()} class="folder-item">
                                    <span class="folder-item-name">{indented_name(&folder.name, node.depth)}</span>
                                    <span class="folder-item-count">{count}</span>
                                    <Button
                                        onclick={on_rename_folder.reform({
                                            let folder = folder.clone();
                                            move |_| folder.clone()
                                        })}
                                        variant={ButtonVariant::Plain}
                                    >
                                        {"✎"}
                                    </Button>
                                    <Button
                                        onclick={on_delete_folder.reform({
                                            let folder_id = folder.id.clone();
                                            move |_| folder_id.clone()
                                        })}
                                        variant={ButtonVariant::Plain}
                                    >
                                        {"✕"}
                                    </Button>
                                </li>
                            }
                        })}
                    </ul>
                </section>

                <section class="queries-panel">
                    <div class="panel-header">
                        <h2 class="panel-title">{"Queries"}</h2>
                        <Button onclick={show_form(OpenForm::Query)} disabled={is_busy} variant={ButtonVariant::Primary}>
                            {"+ Query"}
                        </Button>
                    </div>

                    if *open_form == OpenForm::Query {
                        <QueryForm
                            folders={library.folders.clone()}
                            on_submit={on_add_query}
                            on_cancel={close_form.clone()}
                            submit_label={"Add"}
                        />
                    }

                    if library.queries.is_empty() {
                        <div class="empty-state">
                            <p>{"No saved queries yet."}</p>
                        </div>
                    } else {
                        <table class="query-table">
                            <thead>
                                <tr>
                                    <th>{"Name"}</th>
                                    <th>{"Shortcut"}</th>
                                    <th>{"Folder"}</th>
                                    <th>{"Query"}</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                {for library.queries.iter().map(|query| {
                                    let href = search_url(&expand_nested(query.query.trim(), &shortcuts));
                                    html! {
                                        <QueryTableRow
                                            key={query.id.clone()}
                                            query={query.clone()}
                                            folder_label={folder_label(query, &library.folders)}
                                            href={href}
                                            folders={library.folders.clone()}
                                            is_editing={(*editing).as_deref() == Some(query.id.as_str())}
                                            on_edit={on_edit_query.clone()}
                                            on_delete={on_delete_query.clone()}
                                            on_save={on_save_query.clone()}
                                            on_cancel={on_cancel_edit.clone()}
                                        />
                                    }
                                })}
                            </tbody>
                        </table>
                    }
                </section>
            </div>

            <div class="footer">
                {format!("{} queries • {} folders", library.queries.len(), library.folders.len())}
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct QueryTableRowProps {
    query: SavedQuery,
    folder_label: String,
    href: String,
    folders: Vec<Folder>,
    is_editing: bool,
    on_edit: Callback<String>,
    on_delete: Callback<String>,
    on_save: Callback<(String, QueryDraft)>,
    on_cancel: Callback<()>,
}

#[function_component(QueryTableRow)]
fn query_table_row(props: &QueryTableRowProps) -> Html {
    let query = &props.query;

    if props.is_editing {
        let query_id = query.id.clone();
        return html! {
            <tr class="query-row query-row--editing">
                <td colspan="5">
                    <QueryForm
                        folders={props.folders.clone()}
                        initial={QueryDraft::from_query(query)}
                        on_submit={props.on_save.reform(move |draft| (query_id.clone(), draft))}
                        on_cancel={props.on_cancel.clone()}
                    />
                </td>
            </tr>
        };
    }

    html! {
        <tr class="query-row">
            <td class="td-name">{&query.name}</td>
            <td class="td-shortcut">{query.display_shortcut().unwrap_or_else(|| "—".to_string())}</td>
            <td class="td-folder">{&props.folder_label}</td>
            <td class="td-query" title={query.query.clone()}>{preview_text(&query.query, QUERY_PREVIEW_CHARS)}</td>
            <td class="td-actions">
                <a href={props.href.clone()} target="_blank" rel="noopener" class="pf-v5-c-button pf-m-link">{"Open"}</a>
                <Button
                    onclick={props.on_edit.reform({
                        let query_id = query.id.clone();
                        move |_| query_id.clone()
                    })}
                    variant={ButtonVariant::Link}
                >
                    {"Edit"}
                </Button>
                <Button
                    onclick={props.on_delete.reform({
                        let query_id = query.id.clone();
                        move |_| query_id.clone()
                    })}
                    variant={ButtonVariant::Danger}
                >
                    {"Delete"}
                </Button>
            </td>
        </tr>
    }
}

fn folder_label(query: &SavedQuery, folders: &[Folder]) -> String {
    if query.is_unfiled() {
        return "—".to_string();
    }
    folder_path(&query.folder_id, folders).unwrap_or_else(|| "—".to_string())
}

/// First `max_chars` characters, with an ellipsis if anything was cut
fn preview_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

fn prompt(message: &str, default: &str) -> Option<String> {
    web_sys::window()?
        .prompt_with_message_and_default(message, default)
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_folders() -> Vec<Folder> {
        vec![
            Folder { id: "f1".to_string(), name: "Decks".to_string(), parent_id: String::new() },
            Folder { id: "f2".to_string(), name: "Elves".to_string(), parent_id: "f1".to_string() },
        ]
    }

    #[test]
    fn test_preview_text() {
        assert_eq!(preview_text("t:elf", 50), "t:elf");
        assert_eq!(preview_text("abcdef", 3), "abc…");
        assert_eq!(preview_text("ééééé", 2), "éé…");
    }

    #[test]
    fn test_folder_label() {
        let folders = create_test_folders();
        let nested = SavedQuery::new("Lords", "", "t:elf t:lord", "f2");
        let unfiled = SavedQuery::new("Red", "", "c:r", "");
        let dangling = SavedQuery::new("Gone", "", "c:g", "f9");

        assert_eq!(folder_label(&nested, &folders), "Decks / Elves");
        assert_eq!(folder_label(&unfiled, &folders), "—");
        assert_eq!(folder_label(&dangling, &folders), "—");
    }
}
