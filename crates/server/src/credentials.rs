use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use shared::domain::{Credential, UserId};
use thiserror::Error;

use crate::config::Settings;

pub const CREDENTIAL_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct IssuerConfig {
    pub api_key: String,
    pub api_secret: Option<String>,
    pub default_user_id: String,
}

impl From<&Settings> for IssuerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            default_user_id: settings.default_user_id.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("credential signing secret is not configured")]
    Config,
    #[error("failed to sign credential: {0}")]
    Auth(#[from] jsonwebtoken::errors::Error),
}

impl IssueError {
    /// Message safe to hand back to an unauthenticated caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            IssueError::Config => "API_SECRET is not set",
            IssueError::Auth(_) => "failed to issue credential",
        }
    }
}

#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    sub: String,
    user_id: String,
    iat: i64,
    exp: i64,
}

/// Signs short-lived user tokens for the video service. Holds no state
/// beyond its configuration, so clones can issue concurrently.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    config: IssuerConfig,
}

impl CredentialIssuer {
    pub fn new(config: IssuerConfig) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_secret.is_some()
    }

    pub fn issue(&self, subject: Option<&str>) -> Result<Credential, IssueError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Credential, IssueError> {
        let secret = self.config.api_secret.as_deref().ok_or(IssueError::Config)?;
        let subject = subject
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.config.default_user_id);

        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at + Duration::seconds(CREDENTIAL_TTL_SECONDS);
        let claims = Claims {
            iss: self.config.api_key.clone(),
            sub: format!("user/{subject}"),
            user_id: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;

        Ok(Credential {
            token,
            subject: UserId::new(subject),
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
#[path = "tests/credentials_tests.rs"]
mod tests;
