//! Ties one controller and one cue feed to a single call session.
//!
//! [`SessionScope::close`] is the normal exit. Dropping an unclosed scope
//! still tears the call down and clears the feed, on the current runtime.

use std::sync::Arc;

use anyhow::{Context, Result};
use call_integration::VideoClientFactory;
use shared::{
    cue::CueEvent,
    domain::{CallId, Identity},
};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    config::ClientSettings,
    controller::SessionController,
    credentials::HttpCredentialProvider,
    error::SessionError,
    feed::CueFeedStore,
    ingest::{spawn_channel_ingestion, spawn_websocket_ingestion, IngestStats},
    view::{render_view, SessionView},
};

pub struct SessionScope {
    controller: Arc<SessionController>,
    feed: CueFeedStore,
    identity: Identity,
    call_id: CallId,
    cue_feed_url: Option<String>,
    ingestion: Option<JoinHandle<IngestStats>>,
    closed: bool,
}

impl SessionScope {
    pub fn new(controller: Arc<SessionController>, identity: Identity, call_id: CallId) -> Self {
        Self {
            controller,
            feed: CueFeedStore::new(),
            identity,
            call_id,
            cue_feed_url: None,
            ingestion: None,
            closed: false,
        }
    }

    pub fn from_settings(
        settings: &ClientSettings,
        factory: Arc<dyn VideoClientFactory>,
    ) -> Result<Self> {
        let identity = settings.identity();
        let endpoint = settings.token_endpoint();
        let provider = HttpCredentialProvider::new(&endpoint, identity.id.clone())
            .with_context(|| format!("invalid token endpoint: {endpoint}"))?;
        if settings.api_key.is_empty() {
            warn!("API_KEY is not set; the video service will likely reject the connection");
        }
        let controller =
            SessionController::new(settings.api_key.clone(), factory, Arc::new(provider));
        let mut scope = Self::new(controller, identity, settings.call_id());
        match settings.cue_feed_url() {
            Ok(url) => scope.cue_feed_url = Some(url),
            Err(err) => warn!(%err, "cue feed disabled for this session"),
        }
        Ok(scope)
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    pub fn feed(&self) -> &CueFeedStore {
        &self.feed
    }

    pub async fn start(&self) -> Result<(), SessionError> {
        self.controller
            .initialize(self.identity.clone(), self.call_id.clone())
            .await
    }

    /// Replaces any running ingestion with one fed by `rx`.
    pub fn attach_cue_channel(&mut self, rx: mpsc::Receiver<CueEvent>) {
        self.stop_ingestion();
        self.ingestion = Some(spawn_channel_ingestion(self.feed.clone(), rx));
    }

    /// Replaces any running ingestion with a websocket subscription to `url`.
    pub async fn connect_cue_feed(&mut self, url: &str) -> Result<()> {
        self.stop_ingestion();
        self.ingestion = Some(spawn_websocket_ingestion(self.feed.clone(), url).await?);
        Ok(())
    }

    /// Subscribes to the relay named by `CUE_FEED_URL`, or the one derived
    /// from `SERVER_URL`.
    pub async fn connect_configured_cue_feed(&mut self) -> Result<()> {
        let url = self
            .cue_feed_url
            .clone()
            .context("no cue feed configured for this session")?;
        self.connect_cue_feed(&url).await
    }

    pub async fn view(&self) -> SessionView {
        let status = self.controller.status();
        let participants = *self.controller.participant_count().borrow();
        let feed = self.feed.snapshot().await;
        render_view(&status, participants, &feed)
    }

    pub async fn close(mut self) {
        self.closed = true;
        self.stop_ingestion();
        self.controller.teardown().await;
        self.feed.clear().await;
        info!(call_id = %self.call_id, "session scope closed");
    }

    fn stop_ingestion(&mut self) {
        if let Some(handle) = self.ingestion.take() {
            handle.abort();
        }
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.stop_ingestion();
        let controller = Arc::clone(&self.controller);
        let feed = self.feed.clone();
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    controller.teardown().await;
                    feed.clear().await;
                });
            }
            Err(_) => warn!(
                call_id = %self.call_id,
                "session scope dropped outside a runtime; call was not torn down"
            ),
        }
    }
}

#[cfg(test)]
#[path = "tests/scope_tests.rs"]
mod tests;
