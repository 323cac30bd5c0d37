use async_trait::async_trait;
use call_integration::CredentialProvider;
use reqwest::Client;
use shared::{
    domain::UserId,
    error::{ApiError, FetchError},
    protocol::TokenResponse,
};
use tracing::{debug, warn};
use url::Url;

/// Fetches a fresh token from the credential endpoint on every call. Expiry
/// tracking belongs to whoever holds the provider, so nothing is cached here.
pub struct HttpCredentialProvider {
    http: Client,
    endpoint: Url,
    user_id: UserId,
}

impl HttpCredentialProvider {
    pub fn new(endpoint: &str, user_id: UserId) -> Result<Self, url::ParseError> {
        Ok(Self {
            http: Client::new(),
            endpoint: Url::parse(endpoint)?,
            user_id,
        })
    }

    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("user_id", self.user_id.as_str());
        url
    }
}

#[async_trait]
impl CredentialProvider for HttpCredentialProvider {
    async fn provide(&self) -> Result<String, FetchError> {
        let response = self
            .http
            .get(self.request_url())
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .unwrap_or(status.as_str())
                .to_string();
            let detail = response
                .json::<ApiError>()
                .await
                .map(|body| body.error)
                .unwrap_or_default();
            warn!(%status, %detail, user_id = %self.user_id, "credential endpoint refused token request");
            return Err(FetchError::Status { status_text });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| FetchError::MalformedResponse(err.to_string()))?;

        if body.user_id != self.user_id.as_str() {
            return Err(FetchError::MalformedResponse(format!(
                "token issued for '{}' instead of '{}'",
                body.user_id, self.user_id
            )));
        }

        debug!(user_id = %self.user_id, "fetched credential");
        Ok(body.token)
    }
}

#[cfg(test)]
#[path = "tests/credentials_tests.rs"]
mod tests;
