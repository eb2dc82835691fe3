use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions};
use gloo::file::futures::read_as_bytes;
use gloo_timers::future::TimeoutFuture;
use log::{debug, error, info};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{window, ClipboardEvent, FileList, HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::backend::BackendClient;
use crate::components::notice::Notice;
use crate::config::AppConfig;
use crate::error::{Result, SubmitError};
use crate::models::{
    FormState, MapNumber, NoticeKind, Placement, ScreenshotImage, PLAYERS_PER_TEAM,
};
use crate::utils::{alert, parse_kills};

#[derive(Properties, PartialEq)]
pub struct SubmissionFormProps {
    pub team_id: AttrValue,
    pub map: MapNumber,
    pub config: Rc<AppConfig>,
    pub push_notice: Callback<Notice>,
    #[prop_or_default]
    pub on_busy: Callback<bool>,
}

/// Paste handling has to be able to cancel the browser's default insert.
fn paste_listener_options() -> EventListenerOptions {
    EventListenerOptions::enable_prevent_default()
}

fn first_image(files: Option<FileList>) -> Option<web_sys::File> {
    let files = files?;
    (0..files.length())
        .filter_map(|i| files.get(i))
        .find(|f| f.type_().starts_with("image/"))
}

async fn read_screenshot(file: web_sys::File) -> Result<ScreenshotImage> {
    let file = gloo::file::File::from(file);
    let bytes = read_as_bytes(&file)
        .await
        .map_err(|e| SubmitError::FileRead(e.to_string()))?;
    Ok(ScreenshotImage::new(file.name(), file.raw_mime_type(), bytes))
}

/// Reads the file in the background and stores it as the current screenshot.
fn load_screenshot(
    file: web_sys::File,
    image: UseStateHandle<Option<ScreenshotImage>>,
    push_notice: Callback<Notice>,
) {
    spawn_local(async move {
        match read_screenshot(file).await {
            Ok(shot) => {
                info!("Loaded screenshot {} ({} KB)", shot.name, shot.size_kb());
                image.set(Some(shot));
            }
            Err(e) => {
                error!("Failed to load screenshot: {}", e);
                push_notice.emit((e.to_string(), NoticeKind::Error));
            }
        }
    });
}

#[function_component(SubmissionForm)]
pub fn submission_form(props: &SubmissionFormProps) -> Html {
    let placement = use_state(String::new);
    let kills = use_state(<[String; PLAYERS_PER_TEAM]>::default);
    let kill_errors = use_state(<[String; PLAYERS_PER_TEAM]>::default);
    let image = use_state(|| None::<ScreenshotImage>);
    let submitting = use_state(|| false);
    let in_flight = use_mut_ref(|| false);
    let placement_ref = use_node_ref();

    let preview = use_memo((*image).clone(), |img| {
        img.as_ref().map(ScreenshotImage::preview_url)
    });

    // Paste-to-upload works anywhere on the page while the form is mounted.
    {
        let image = image.clone();
        let push_notice = props.push_notice.clone();
        use_effect_with((), move |_| {
            let listener = window().and_then(|w| w.document()).map(|doc| {
                EventListener::new_with_options(&doc, "paste", paste_listener_options(), move |event| {
                    let Some(data) = event
                        .dyn_ref::<ClipboardEvent>()
                        .and_then(ClipboardEvent::clipboard_data)
                    else {
                        return;
                    };
                    match first_image(data.files()) {
                        Some(file) => {
                            event.prevent_default();
                            debug!("Pasted image {} ({})", file.name(), file.type_());
                            load_screenshot(file, image.clone(), push_notice.clone());
                        }
                        None => {
                            let has_text = data
                                .get_data("text/plain")
                                .map(|t| !t.is_empty())
                                .unwrap_or(false);
                            if !has_text {
                                push_notice.emit((
                                    "Clipboard does not contain an image".into(),
                                    NoticeKind::Info,
                                ));
                            }
                        }
                    }
                })
            });
            move || drop(listener)
        });
    }

    let on_file = {
        let image = image.clone();
        let push_notice = props.push_notice.clone();
        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            match first_image(input.files()) {
                Some(file) => load_screenshot(file, image.clone(), push_notice.clone()),
                None => push_notice.emit(("Please choose an image file".into(), NoticeKind::Error)),
            }
            input.set_value("");
        })
    };

    let clear_image = {
        let image = image.clone();
        Callback::from(move |_: MouseEvent| image.set(None))
    };

    let on_kill_change = {
        let kills = kills.clone();
        let kill_errors = kill_errors.clone();
        move |slot: usize| {
            let kills = kills.clone();
            let kill_errors = kill_errors.clone();
            Callback::from(move |e: InputEvent| {
                if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                    let val = input.value();
                    let mut errors = (*kill_errors).clone();
                    errors[slot] = match parse_kills(&val) {
                        Err(msg) if !val.trim().is_empty() => msg,
                        _ => String::new(),
                    };
                    kill_errors.set(errors);

                    let mut cur = (*kills).clone();
                    cur[slot] = val;
                    kills.set(cur);
                }
            })
        }
    };

    // `selected` on <option> is ignored once the user has picked one.
    {
        let placement_ref = placement_ref.clone();
        use_effect_with((*placement).clone(), move |value| {
            if let Some(select) = placement_ref.cast::<HtmlSelectElement>() {
                if select.value() != *value {
                    select.set_value(value);
                }
            }
            || ()
        });
    }

    let on_placement = {
        let placement = placement.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                placement.set(select.value());
            }
        })
    };

    let onsubmit = {
        let placement = placement.clone();
        let kills = kills.clone();
        let kill_errors = kill_errors.clone();
        let image = image.clone();
        let submitting = submitting.clone();
        let in_flight = in_flight.clone();
        let team_id = props.team_id.clone();
        let map = props.map;
        let config = props.config.clone();
        let push_notice = props.push_notice.clone();
        let on_busy = props.on_busy.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if *in_flight.borrow() {
                debug!("Submission already in flight, ignoring");
                return;
            }

            let form = FormState {
                placement: (*placement).clone(),
                kills: (*kills).clone(),
                image: (*image).clone(),
            };
            let validated = match form.validate(&team_id, map) {
                Ok(v) => v,
                Err(err) => {
                    push_notice.emit((err.to_string(), NoticeKind::Error));
                    return;
                }
            };
            let client = match BackendClient::new(config.backend.clone()) {
                Ok(c) => c,
                Err(err) => {
                    error!("Backend client unavailable: {}", err);
                    alert(&err.to_string());
                    return;
                }
            };

            *in_flight.borrow_mut() = true;
            submitting.set(true);
            on_busy.emit(true);

            let placement = placement.clone();
            let kills = kills.clone();
            let kill_errors = kill_errors.clone();
            let image = image.clone();
            let submitting = submitting.clone();
            let in_flight = in_flight.clone();
            let options = config.compress.clone();
            let push_notice = push_notice.clone();
            let on_busy = on_busy.clone();

            spawn_local(async move {
                // Let the disabled button paint before compression blocks the thread.
                TimeoutFuture::new(0).await;
                info!("Submitting scoreboard for team {} on {}", validated.team_id, map.label());
                match client.submit(validated, &options).await {
                    Ok(url) => {
                        info!("Scoreboard stored at {}", url);
                        push_notice.emit((
                            format!("{} submitted successfully!", map.label()),
                            NoticeKind::Success,
                        ));
                        let empty = FormState::default();
                        placement.set(empty.placement);
                        kills.set(empty.kills);
                        kill_errors.set(Default::default());
                        image.set(empty.image);
                    }
                    Err(err) if err.is_user_error() => {
                        push_notice.emit((err.to_string(), NoticeKind::Error));
                    }
                    Err(err) => {
                        error!("Submission failed: {}", err);
                        alert(&format!("Submission failed: {}", err));
                    }
                }
                *in_flight.borrow_mut() = false;
                submitting.set(false);
                on_busy.emit(false);
            });
        })
    };

    let busy = *submitting;

    html! {
        <form class="submission-form" {onsubmit}>
            <h2 class="form-title">{ format!("{} scoreboard", props.map.label()) }</h2>
            <p class="form-team">{ "Team: " }<strong>{ &props.team_id }</strong></p>

            <div class="screenshot-section">
                if let Some(url) = &*preview {
                    <div class="screenshot-preview">
                        <img src={url.clone()} alt="Scoreboard screenshot preview" />
                        <button type="button" class="btn btn-small" onclick={clear_image} disabled={busy}>
                            {"Remove"}
                        </button>
                    </div>
                } else {
                    <div class="screenshot-dropzone">
                        <p>{"Paste a screenshot (Ctrl+V) or choose a file"}</p>
                    </div>
                }
                <input
                    type="file"
                    accept="image/*"
                    class="input"
                    onchange={on_file}
                    disabled={busy}
                />
            </div>

            <div class="row kills-row">
                { for (0..PLAYERS_PER_TEAM).map(|slot| {
                    let error = kill_errors[slot].clone();
                    html! {
                        <div class="input-wrapper" key={slot}>
                            <label for={format!("kills-{}", slot + 1)}>{ format!("Player {} kills", slot + 1) }</label>
                            <input
                                id={format!("kills-{}", slot + 1)}
                                type="text"
                                inputmode="numeric"
                                placeholder="0"
                                value={kills[slot].clone()}
                                oninput={on_kill_change(slot)}
                                disabled={busy}
                                class={classes!("input", (!error.is_empty()).then_some("error"))}
                            />
                            if !error.is_empty() {
                                <p class="status error">{ error }</p>
                            }
                        </div>
                    }
                })}
            </div>

            <div class="row">
                <label for="placement">{"Placement"}</label>
                <select
                    id="placement"
                    class="input"
                    ref={placement_ref.clone()}
                    onchange={on_placement}
                    disabled={busy}
                >
                    <option value="" selected={placement.is_empty()} disabled=true>{"Select placement"}</option>
                    { for Placement::all().map(|p| {
                        let value = p.get().to_string();
                        let selected = *placement == value;
                        html! { <option value={value} selected={selected}>{ p.label() }</option> }
                    })}
                </select>
            </div>

            <div class="button-group">
                <button
                    type="submit"
                    disabled={busy}
                    class={classes!("btn", "btn-prominent", busy.then_some("loading"))}
                >
                    { if busy { "Submitting…" } else { "Submit Scoreboard" } }
                </button>
            </div>
        </form>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gloo::events::EventListenerPhase;

    #[test]
    fn paste_listener_is_not_passive() {
        let options = paste_listener_options();
        assert!(!options.passive);
        assert!(matches!(options.phase, EventListenerPhase::Bubble));
    }
}
