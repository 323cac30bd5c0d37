use serde::{Deserialize, Serialize};

pub const TOKEN_ROUTE: &str = "/api/token";
pub const CUES_ROUTE: &str = "/cues";
pub const CUES_WS_ROUTE: &str = "/cues/ws";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}
