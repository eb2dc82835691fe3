use gloo::events::EventListener;
use log::{info, warn};
use web_sys::window;
use yew::prelude::*;

use crate::components::{use_notice, MapNav, NoticeBanner, SubmissionForm};
use crate::config::AppConfig;
use crate::models::MapNumber;
use crate::utils::{location_hash, set_location_hash};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn map_from_location() -> MapNumber {
    let hash = location_hash();
    MapNumber::from_hash(&hash).unwrap_or_else(|| {
        if !hash.is_empty() {
            warn!("Ignoring unknown map fragment {}", hash);
        }
        MapNumber::default()
    })
}

#[derive(Debug, PartialEq)]
enum HashChange {
    Switch(MapNumber),
    Restore(String),
    Ignore,
}

/// A submission in flight pins the current map; the URL is put back instead.
fn hash_change(current: MapNumber, target: MapNumber, busy: bool) -> HashChange {
    if target == current {
        HashChange::Ignore
    } else if busy {
        HashChange::Restore(current.to_hash())
    } else {
        HashChange::Switch(target)
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let config = use_memo((), |_| AppConfig::load());
    let selected_map = use_state(map_from_location);
    let busy = use_state(|| false);
    let (notice, push_notice, clear_notice) = use_notice();

    // Back/forward navigation between maps. Re-registered whenever the map or
    // busy flag changes so the handler never sees stale values.
    {
        let selected_map = selected_map.clone();
        use_effect_with((*selected_map, *busy), move |&(current, busy)| {
            let listener = window().map(|w| {
                EventListener::new(&w, "hashchange", move |_| {
                    match hash_change(current, map_from_location(), busy) {
                        HashChange::Switch(map) => {
                            info!("Selected {} from location", map.label());
                            selected_map.set(map);
                        }
                        HashChange::Restore(hash) => {
                            warn!("Map change blocked while a submission is in flight");
                            set_location_hash(&hash);
                        }
                        HashChange::Ignore => {}
                    }
                })
            });
            move || drop(listener)
        });
    }

    let on_select = {
        let selected_map = selected_map.clone();
        let busy = busy.clone();
        Callback::from(move |map: MapNumber| {
            if *busy || map == *selected_map {
                return;
            }
            info!("Selected {}", map.label());
            set_location_hash(&map.to_hash());
            selected_map.set(map);
        })
    };

    let on_busy = {
        let busy = busy.clone();
        Callback::from(move |b: bool| busy.set(b))
    };

    html! {
        <div class="app-container">
            <header class="app-header">
                <div class="app-title">{ format!("Scoreboard Submission v{}", VERSION) }</div>
                <MapNav selected={*selected_map} {on_select} disabled={*busy} />
            </header>

            <NoticeBanner notice={notice} on_close={clear_notice} />

            <main class="main-content">
                { match config.team_id.clone() {
                    Some(team_id) => html! {
                        <SubmissionForm
                            key={(*selected_map).get()}
                            team_id={team_id}
                            map={*selected_map}
                            config={config.clone()}
                            push_notice={push_notice.clone()}
                            {on_busy}
                        />
                    },
                    None => html! {
                        <div class="missing-team">
                            <h2>{"No team selected"}</h2>
                            <p>{"Open the link your tournament organiser sent you. It ends with "}<code>{"?team=YOUR_TEAM"}</code>{"."}</p>
                        </div>
                    },
                }}
            </main>
        </div>
    }
}
