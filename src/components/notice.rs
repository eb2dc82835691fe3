use gloo_timers::callback::Timeout;
use log::debug;
use yew::prelude::*;

use crate::models::NoticeKind;

const NOTICE_TIMEOUT_MS: u32 = 6_000;

pub type Notice = (String, NoticeKind);

#[derive(Properties, PartialEq)]
pub struct NoticeBannerProps {
    pub notice: Option<Notice>,
    pub on_close: Callback<()>,
}

#[function_component(NoticeBanner)]
pub fn notice_banner(props: &NoticeBannerProps) -> Html {
    let Some((message, kind)) = &props.notice else {
        return html! {};
    };
    let close = props.on_close.reform(|_: MouseEvent| ());

    html! {
        <div class={classes!("notice", kind.class())} role="status" aria-live="polite">
            <span class="notice-message">{ message }</span>
            <button type="button" class="notice-close" onclick={close} aria-label="Dismiss">{ "×" }</button>
        </div>
    }
}

/// Holds the current notice and clears it after a few seconds.
#[hook]
pub fn use_notice() -> (Option<Notice>, Callback<Notice>, Callback<()>) {
    let notice = use_state(|| None::<Notice>);

    {
        let notice = notice.clone();
        use_effect_with((*notice).clone(), move |current| {
            let timeout = current.as_ref().map(|_| {
                let notice = notice.clone();
                Timeout::new(NOTICE_TIMEOUT_MS, move || notice.set(None))
            });
            move || drop(timeout)
        });
    }

    let push = {
        let notice = notice.clone();
        Callback::from(move |(msg, kind): Notice| {
            debug!("Notice ({:?}): {}", kind, msg);
            notice.set(Some((msg, kind)));
        })
    };

    let clear = {
        let notice = notice.clone();
        Callback::from(move |_| notice.set(None))
    };

    ((*notice).clone(), push, clear)
}
