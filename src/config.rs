use js_sys::Reflect;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use web_sys::window;

use crate::compress::CompressOptions;
use crate::error::{Result, SubmitError};
use crate::utils::{error_message, location_search, query_param};

pub const RUNTIME_CONFIG_KEY: &str = "__SCOREBOARD_CONFIG__";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub bucket: String,
    pub table: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: option_env!("SUPABASE_URL").unwrap_or_default().to_string(),
            anon_key: option_env!("SUPABASE_ANON_KEY").unwrap_or_default().to_string(),
            bucket: option_env!("SCOREBOARD_BUCKET").unwrap_or("scoreboards").to_string(),
            table: option_env!("SCOREBOARD_TABLE").unwrap_or("submissions").to_string(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("url", &self.url),
            ("anon_key", &self.anon_key),
            ("bucket", &self.bucket),
            ("table", &self.table),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if !missing.is_empty() {
            return Err(SubmitError::Config(format!("missing {}", missing.join(", "))));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(SubmitError::Config(format!("invalid backend url: {}", self.url)));
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Shape of `window.__SCOREBOARD_CONFIG__`; every field is optional.
#[derive(Deserialize, Default, Debug, PartialEq)]
#[serde(default)]
pub struct RuntimeOverrides {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub bucket: Option<String>,
    pub table: Option<String>,
    pub team_id: Option<String>,
    pub compress: Option<CompressOptions>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub team_id: Option<String>,
    pub compress: CompressOptions,
}

impl AppConfig {
    pub fn load() -> Self {
        let overrides = read_runtime_overrides();
        let team_from_query = query_param(&location_search(), "team");
        let config = Self::merge(AppConfig::default(), overrides, team_from_query);
        info!(
            "Loaded config: backend={}, bucket={}, table={}, team={:?}",
            config.backend.url, config.backend.bucket, config.backend.table, config.team_id
        );
        config
    }

    /// Query string team id beats the runtime object, which beats build-time defaults.
    pub fn merge(base: AppConfig, overrides: RuntimeOverrides, team_from_query: Option<String>) -> Self {
        let pick = |over: Option<String>, fallback: String| {
            over.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
        };
        AppConfig {
            backend: BackendConfig {
                url: pick(overrides.url, base.backend.url),
                anon_key: pick(overrides.anon_key, base.backend.anon_key),
                bucket: pick(overrides.bucket, base.backend.bucket),
                table: pick(overrides.table, base.backend.table),
            },
            team_id: team_from_query
                .or(overrides.team_id)
                .or(base.team_id)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            compress: overrides.compress.unwrap_or(base.compress),
        }
    }
}

fn read_runtime_overrides() -> RuntimeOverrides {
    let Some(window) = window() else {
        return RuntimeOverrides::default();
    };
    let raw = match Reflect::get(&window, &RUNTIME_CONFIG_KEY.into()) {
        Ok(v) if !v.is_undefined() && !v.is_null() => v,
        Ok(_) => {
            debug!("No {} object, using build-time config", RUNTIME_CONFIG_KEY);
            return RuntimeOverrides::default();
        }
        Err(e) => {
            warn!("Failed to read {}: {}", RUNTIME_CONFIG_KEY, error_message(e));
            return RuntimeOverrides::default();
        }
    };
    serde_wasm_bindgen::from_value(raw).unwrap_or_else(|e| {
        warn!("Ignoring malformed {}: {}", RUNTIME_CONFIG_KEY, e);
        RuntimeOverrides::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig {
            backend: BackendConfig {
                url: "https://build.example.co".into(),
                anon_key: "build-key".into(),
                bucket: "scoreboards".into(),
                table: "submissions".into(),
            },
            team_id: None,
            compress: CompressOptions::default(),
        }
    }

    #[test]
    fn runtime_overrides_replace_build_values() {
        let overrides = RuntimeOverrides {
            url: Some("https://runtime.example.co/".into()),
            anon_key: Some("".into()),
            team_id: Some("alpha".into()),
            ..RuntimeOverrides::default()
        };
        let cfg = AppConfig::merge(base(), overrides, None);
        assert_eq!(cfg.backend.url, "https://runtime.example.co/");
        assert_eq!(cfg.backend.base_url(), "https://runtime.example.co");
        assert_eq!(cfg.backend.anon_key, "build-key");
        assert_eq!(cfg.team_id.as_deref(), Some("alpha"));
    }

    #[test]
    fn query_team_wins() {
        let overrides = RuntimeOverrides {
            team_id: Some("alpha".into()),
            ..RuntimeOverrides::default()
        };
        let cfg = AppConfig::merge(base(), overrides, Some(" bravo ".into()));
        assert_eq!(cfg.team_id.as_deref(), Some("bravo"));
    }

    #[test]
    fn blank_team_is_none() {
        let cfg = AppConfig::merge(base(), RuntimeOverrides::default(), Some("  ".into()));
        assert_eq!(cfg.team_id, None);
    }

    #[test]
    fn overrides_deserialize_with_partial_compress_options() {
        let overrides: RuntimeOverrides = serde_json::from_value(serde_json::json!({
            "bucket": "shots",
            "compress": { "max_dimension": 1280 }
        }))
        .unwrap();
        let cfg = AppConfig::merge(base(), overrides, None);
        assert_eq!(cfg.backend.bucket, "shots");
        assert_eq!(cfg.compress.max_dimension, 1280);
        assert_eq!(cfg.compress.max_size_bytes, 1024 * 1024);
    }

    #[test]
    fn validate_lists_missing_fields() {
        let cfg = BackendConfig {
            url: String::new(),
            anon_key: " ".into(),
            bucket: "b".into(),
            table: "t".into(),
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: missing url, anon_key");

        let bad_scheme = BackendConfig { url: "ftp://x".into(), ..base().backend };
        assert!(bad_scheme.validate().is_err());
        assert!(base().backend.validate().is_ok());
    }
}
