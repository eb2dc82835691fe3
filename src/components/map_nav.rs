use yew::prelude::*;

use crate::models::MapNumber;

#[derive(Properties, PartialEq)]
pub struct MapNavProps {
    pub selected: MapNumber,
    pub on_select: Callback<MapNumber>,
    #[prop_or_default]
    pub disabled: bool,
}

#[function_component(MapNav)]
pub fn map_nav(props: &MapNavProps) -> Html {
    html! {
        <nav class="map-nav" aria-label="Map selection">
            { for MapNumber::all().map(|map| {
                let is_active = map == props.selected;
                let onclick = props.on_select.reform(move |_: MouseEvent| map);
                html! {
                    <button
                        type="button"
                        key={map.get()}
                        class={classes!("map-nav-item", is_active.then_some("active"))}
                        aria-current={is_active.then_some("page")}
                        disabled={props.disabled}
                        {onclick}
                    >
                        { map.label() }
                    </button>
                }
            })}
        </nav>
    }
}
