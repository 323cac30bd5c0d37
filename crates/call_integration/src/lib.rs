//! Boundary between the session controller and whatever real-time video
//! service carries the call.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{CallId, Identity},
    error::FetchError,
};
use tokio::sync::broadcast;

pub const DEFAULT_CALL_TYPE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOptions {
    pub call_type: String,
    pub call_id: CallId,
    /// Create the call when it does not exist yet.
    pub create: bool,
}

impl CallOptions {
    pub fn join_or_create(call_id: CallId) -> Self {
        Self {
            call_type: DEFAULT_CALL_TYPE.to_string(),
            call_id,
            create: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParticipant {
    pub participant_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    ParticipantJoined(RemoteParticipant),
    ParticipantLeft { participant_id: String },
}

/// Pull-style token source. The video client calls it on first connect and
/// again whenever it decides the held token is expired or about to be.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn provide(&self) -> Result<String, FetchError>;
}

#[async_trait]
impl<F, Fut> CredentialProvider for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, FetchError>> + Send + 'static,
{
    async fn provide(&self) -> Result<String, FetchError> {
        (self)().await
    }
}

#[async_trait]
pub trait CallSession: Send + Sync {
    fn call_id(&self) -> &CallId;
    async fn leave(&self) -> anyhow::Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<CallEvent>;
}

#[async_trait]
pub trait VideoClient: Send + Sync {
    async fn connect_user(
        &self,
        identity: &Identity,
        credentials: Arc<dyn CredentialProvider>,
    ) -> anyhow::Result<()>;
    async fn join_call(&self, options: CallOptions) -> anyhow::Result<Arc<dyn CallSession>>;
    /// Must be a no-op on a client that never finished connecting.
    async fn disconnect_user(&self) -> anyhow::Result<()>;
}

pub trait VideoClientFactory: Send + Sync {
    fn create_client(&self, api_key: &str) -> Arc<dyn VideoClient>;
}
