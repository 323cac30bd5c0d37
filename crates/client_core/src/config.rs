use anyhow::{anyhow, Result};
use shared::{
    domain::{CallId, Identity},
    protocol::{CUES_WS_ROUTE, TOKEN_ROUTE},
};

/// Client-side configuration. There is no signing secret here: it
/// only ever lives on the credential server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_key: String,
    pub user_id: String,
    pub user_name: String,
    pub call_id: String,
    pub server_url: String,
    pub token_endpoint: Option<String>,
    pub cue_feed_url: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            user_id: "demo-user".into(),
            user_name: "Demo User".into(),
            call_id: "echosight-demo".into(),
            server_url: "http://127.0.0.1:3000".into(),
            token_endpoint: None,
            cue_feed_url: None,
        }
    }
}

impl ClientSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `APP__`-prefixed names win over bare names. Values are trimmed, and a
    /// blank value counts as unset.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let present = |name: &str| {
            env(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let value = |key: &str| present(&format!("APP__{key}")).or_else(|| present(key));

        if let Some(v) = value("API_KEY") {
            settings.api_key = v;
        }
        if let Some(v) = value("DEFAULT_USER_ID") {
            settings.user_id = v;
        }
        if let Some(v) = value("DEFAULT_USER_NAME") {
            settings.user_name = v;
        }
        if let Some(v) = value("DEFAULT_CALL_ID") {
            settings.call_id = v;
        }
        if let Some(v) = value("SERVER_URL") {
            settings.server_url = v.trim_end_matches('/').to_string();
        }
        settings.token_endpoint = value("TOKEN_ENDPOINT");
        settings.cue_feed_url = value("CUE_FEED_URL");

        settings
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id.clone(), self.user_name.clone())
    }

    pub fn call_id(&self) -> CallId {
        CallId::new(self.call_id.clone())
    }

    pub fn token_endpoint(&self) -> String {
        self.token_endpoint
            .clone()
            .unwrap_or_else(|| format!("{}{TOKEN_ROUTE}", self.server_url))
    }

    pub fn cue_feed_url(&self) -> Result<String> {
        if let Some(url) = &self.cue_feed_url {
            return Ok(url.clone());
        }
        let ws_url = if self.server_url.starts_with("https://") {
            self.server_url.replacen("https://", "wss://", 1)
        } else if self.server_url.starts_with("http://") {
            self.server_url.replacen("http://", "ws://", 1)
        } else {
            return Err(anyhow!("server_url must start with http:// or https://"));
        };
        Ok(format!("{ws_url}{CUES_WS_ROUTE}"))
    }
}
