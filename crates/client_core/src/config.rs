use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "items_client.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_url: String,
    pub request_timeout_secs: Option<u64>,
    pub keep_draft_on_failure: bool,
    pub discard_stale_refreshes: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout_secs: None,
            keep_draft_on_failure: false,
            discard_stale_refreshes: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    keep_draft_on_failure: Option<bool>,
    discard_stale_refreshes: Option<bool>,
}

/// Defaults, then `items_client.toml` (or `$ITEMS_CLIENT_CONFIG`), then env.
pub fn load_settings() -> ClientSettings {
    let path = std::env::var("ITEMS_CLIENT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    load_settings_from(&path, |name| std::env::var(name).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_url {
                    settings.api_url = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = Some(v);
                }
                if let Some(v) = file_cfg.keep_draft_on_failure {
                    settings.keep_draft_on_failure = v;
                }
                if let Some(v) = file_cfg.discard_stale_refreshes {
                    settings.discard_stale_refreshes = v;
                }
            }
            Err(err) => warn!("ignoring malformed config '{}': {err}", path.display()),
        }
    }

    if let Some(v) = env("ITEMS_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = env("APP__KEEP_DRAFT_ON_FAILURE").and_then(|v| parse_flag(&v)) {
        settings.keep_draft_on_failure = v;
    }
    if let Some(v) = env("APP__DISCARD_STALE_REFRESHES").and_then(|v| parse_flag(&v)) {
        settings.discard_stale_refreshes = v;
    }

    settings.api_url = normalize_api_url(&settings.api_url);
    settings
}

pub fn normalize_api_url(raw_api_url: &str) -> String {
    let raw_api_url = raw_api_url.trim();

    if raw_api_url.is_empty() {
        return DEFAULT_API_URL.to_string();
    }

    let with_scheme = if raw_api_url.contains("://") {
        raw_api_url.to_string()
    } else {
        format!("http://{raw_api_url}")
    };

    with_scheme.trim_end_matches('/').to_string()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
