use std::{collections::HashMap, fs};

use tracing::warn;

pub const SETTINGS_FILE: &str = "echosight.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub api_key: String,
    /// Signing secret. Never leaves the server.
    pub api_secret: Option<String>,
    pub default_user_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            api_key: String::new(),
            api_secret: None,
            default_user_id: "demo-user".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from_sources(file.as_deref(), |key| std::env::var(key).ok())
}

/// File values first, then bare env vars, then `APP__`-prefixed env vars.
pub(crate) fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr") {
                    settings.server_bind = v.clone();
                }
                if let Some(v) = file_cfg.get("api_key") {
                    settings.api_key = v.clone();
                }
                if let Some(v) = file_cfg.get("default_user_id") {
                    settings.default_user_id = v.clone();
                }
            }
            Err(error) => warn!(%error, file = SETTINGS_FILE, "ignoring malformed settings file"),
        }
    }

    if let Some(v) = env_value(&env, "SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env_value(&env, "API_KEY") {
        settings.api_key = v;
    }
    if let Some(v) = env_value(&env, "API_SECRET") {
        settings.api_secret = Some(v);
    }
    if let Some(v) = env_value(&env, "DEFAULT_USER_ID") {
        settings.default_user_id = v;
    }

    settings
}

fn env_value(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    let present = |name: &str| env(name).filter(|v| !v.trim().is_empty());
    present(&format!("APP__{key}")).or_else(|| present(key))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
