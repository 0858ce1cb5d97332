/// Diagnostic log page

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::activity_log::{ActivityLog, LogBook, LogEntry};
use crate::config::LOG_READ_TIMEOUT_MS;
use crate::storage::ChromeStorage;

#[derive(Clone, PartialEq)]
enum ViewState {
    Loading,
    Loaded(Vec<LogEntry>),
    Error(String),
}

fn log_store() -> ActivityLog<ChromeStorage> {
    ActivityLog::new(ChromeStorage::local().with_read_timeout(LOG_READ_TIMEOUT_MS))
}

fn load_into(state: UseStateHandle<ViewState>) {
    state.set(ViewState::Loading);
    spawn_local(async move {
        match log_store().entries().await {
            Ok(entries) => {
                let book = LogBook { entries };
                state.set(ViewState::Loaded(book.newest_first()));
            }
            Err(e) => state.set(ViewState::Error(format!("Failed to load log: {}", e))),
        }
    });
}

#[function_component(LogViewer)]
pub fn log_viewer() -> Html {
    let state = use_state(|| ViewState::Loading);

    {
        let state = state.clone();
        use_effect_with((), move |_| {
            load_into(state);
            || ()
        });
    }

    let on_refresh = {
        let state = state.clone();
        Callback::from(move |_: MouseEvent| load_into(state.clone()))
    };

    let on_clear = {
        let state = state.clone();
        Callback::from(move |_: MouseEvent| {
            let state = state.clone();
            spawn_local(async move {
                match log_store().clear().await {
                    Ok(()) => state.set(ViewState::Loaded(Vec::new())),
                    Err(e) => state.set(ViewState::Error(format!("Failed to clear: {}", e))),
                }
            });
        })
    };

    html! {
        <div class="container">
            <div class="header">
                <h1 class="main-title">{"Activity log"}</h1>
                <div class="header-actions">
                    <Button onclick={on_refresh} variant={ButtonVariant::Secondary}>
                        {"Refresh"}
                    </Button>
                    <Button onclick={on_clear} variant={ButtonVariant::Danger}>
                        {"Clear"}
                    </Button>
                </div>
            </div>

            <div class="log-list">
                {match &*state {
                    ViewState::Loading => html! {
                        <div class="loading-text-center">
                            <Spinner />
                        </div>
                    },
                    ViewState::Error(err) => html! {
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    },
                    ViewState::Loaded(entries) if entries.is_empty() => html! {
                        <p class="log-empty">{"No log entries. Use the extension; entries will appear here."}</p>
                    },
                    ViewState::Loaded(entries) => html! {
                        {for entries.iter().map(|entry| html! {
                            <div class="log-entry">
                                <span class="log-time">{&entry.t}</span>
                                <span class={classes!("log-level", entry.level.as_str())}>{entry.level.as_str()}</span>
                                <span class="log-msg">
                                    {&entry.msg}
                                    if let Some(ctx) = entry.context_text() {
                                        <div class="log-ctx">{ctx}</div>
                                    }
                                </span>
                            </div>
                        })}
                    },
                }}
            </div>
        </div>
    }
}
