/// Export preview page: shows the JSON handed over by the popup

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::storage::{ChromeStorage, take_export_preview};
use crate::ui::copy_to_clipboard;

#[derive(Clone, PartialEq)]
enum CopyState {
    Ready,
    Copied,
    Failed,
}

impl CopyState {
    fn label(&self) -> &'static str {
        match self {
            CopyState::Ready => "Copy",
            CopyState::Copied => "Copied!",
            CopyState::Failed => "Copy failed",
        }
    }
}

#[function_component(ExportPreview)]
pub fn export_preview() -> Html {
    let json = use_state(|| None::<String>);
    let copy_state = use_state(|| CopyState::Ready);

    // The payload is read once and cleared
    {
        let json = json.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let text = match take_export_preview(&ChromeStorage::local()).await {
                    Ok(Some(text)) => text,
                    Ok(None) => "(no export data)".to_string(),
                    Err(e) => format!("({})", e),
                };
                json.set(Some(text));
            });
            || ()
        });
    }

    let on_copy = {
        let json = json.clone();
        let copy_state = copy_state.clone();

        Callback::from(move |_: MouseEvent| {
            let text = (*json).clone().unwrap_or_default();
            let copy_state = copy_state.clone();
            spawn_local(async move {
                match copy_to_clipboard(&text).await {
                    Ok(()) => copy_state.set(CopyState::Copied),
                    Err(_) => copy_state.set(CopyState::Failed),
                }
            });
        })
    };

    html! {
        <div class="container">
            <div class="header">
                <h1 class="main-title">{"Export"}</h1>
                <Button onclick={on_copy} disabled={json.is_none()} variant={ButtonVariant::Primary}>
                    {copy_state.label()}
                </Button>
            </div>
            {match &*json {
                Some(text) => html! { <pre class="export-json">{text}</pre> },
                None => html! { <Spinner /> },
            }}
        </div>
    }
}
