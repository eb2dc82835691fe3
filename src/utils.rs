use js_sys::Reflect;
use url::form_urlencoded;
use log::{error, warn};
use wasm_bindgen::JsValue;
use web_sys::window;

use crate::models::{MapNumber, Placement, MAX_PLACEMENT};

pub const MAX_KILLS: u32 = 99;

pub fn parse_kills(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("is required".into());
    }
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err("must be a whole number".into());
    }
    match raw.parse::<u32>() {
        Ok(n) if n <= MAX_KILLS => Ok(n),
        _ => Err(format!("must be at most {}", MAX_KILLS)),
    }
}

pub fn parse_placement(raw: &str) -> Result<Placement, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("is required".into());
    }
    raw.parse::<u8>()
        .ok()
        .and_then(Placement::new)
        .ok_or_else(|| format!("must be between 1 and {}", MAX_PLACEMENT))
}

/// Replaces anything that is not safe in a storage key.
pub fn sanitize_key(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "team".to_string()
    } else {
        cleaned
    }
}

pub fn object_path(team_id: &str, map: MapNumber, millis: u64, nonce: u32) -> String {
    format!(
        "{}/map{:02}_{}_{:08x}.jpg",
        sanitize_key(team_id),
        map.get(),
        millis,
        nonce
    )
}

pub fn random_nonce() -> u32 {
    let mut buf = [0u8; 4];
    if let Err(e) = getrandom::getrandom(&mut buf) {
        warn!("getrandom failed, falling back to clock: {}", e);
        return (js_sys::Date::now() as u64 & 0xffff_ffff) as u32;
    }
    u32::from_le_bytes(buf)
}

pub fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

/// Looks up `key` in a `?a=b&c=d` query string, percent- and `+`-decoded.
pub fn query_param(search: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(search.trim_start_matches('?').as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.trim().is_empty())
}

pub fn location_search() -> String {
    window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

pub fn location_hash() -> String {
    window()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
}

pub fn set_location_hash(hash: &str) {
    let Some(window) = window() else {
        return;
    };
    if let Err(e) = window.location().set_hash(hash) {
        error!("Failed to update location hash: {}", error_message(e));
    }
}

/// Blocking alert used for submission failures.
pub fn alert(message: &str) {
    match window() {
        Some(w) => {
            if w.alert_with_message(message).is_err() {
                error!("window.alert failed: {}", message);
            }
        }
        None => error!("No window to alert: {}", message),
    }
}

pub fn error_message(res: JsValue) -> String {
    for key in ["message", "error"] {
        if let Ok(val) = Reflect::get(&res, &key.into()) {
            if let Some(s) = val.as_string() {
                return s;
            }
        }
    }

    if let Some(s) = res.as_string() {
        return s;
    }

    if let Ok(str_val) = js_sys::JSON::stringify(&res) {
        if let Some(s) = str_val.as_string() {
            return s;
        }
    }

    "Unknown error (failed to extract message)".to_string()
}
