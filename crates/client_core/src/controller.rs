//! Connect / join / leave lifecycle for one video call.
//!
//! ```text
//! Idle -> Connecting -> Joining -> Connected -> Leaving -> Idle
//!            |             |
//!            +-----> Error <+
//! ```
//!
//! The lifecycle runs on its own task, so a caller that stops awaiting
//! [`SessionController::initialize`] does not strand a half-open call. A
//! teardown that arrives while connect or join is pending is recorded and
//! carried out by that task as soon as the pending step resolves.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use call_integration::{
    CallEvent, CallOptions, CallSession, CredentialProvider, VideoClient, VideoClientFactory,
};
use shared::{
    domain::{CallId, ConnectionStatus, Identity},
    error::FetchError,
};
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::{JoinError, JoinHandle},
};
use tracing::{debug, error, info, warn};

use crate::error::{ConnectionError, SessionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Connecting,
    Joining,
    Connected,
    Leaving,
    Error(String),
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Joining => "joining",
            SessionStatus::Connected => "connected",
            SessionStatus::Leaving => "leaving",
            SessionStatus::Error(_) => "error",
        }
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        match self {
            SessionStatus::Idle | SessionStatus::Leaving => ConnectionStatus::Disconnected,
            SessionStatus::Connecting | SessionStatus::Joining => ConnectionStatus::Connecting,
            SessionStatus::Connected => ConnectionStatus::Connected,
            SessionStatus::Error(_) => ConnectionStatus::Error,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    fn is_settled(&self) -> bool {
        matches!(self, SessionStatus::Idle | SessionStatus::Error(_))
    }
}

/// Wraps the caller's provider for one lifecycle: fetches are serialized and
/// refused once teardown has been requested.
struct GuardedCredentials {
    source: Arc<dyn CredentialProvider>,
    fetch_lock: Mutex<()>,
    cancelled: Arc<AtomicBool>,
    fetches: AtomicU64,
}

#[async_trait]
impl CredentialProvider for GuardedCredentials {
    async fn provide(&self) -> Result<String, FetchError> {
        let _serialized = self.fetch_lock.lock().await;
        if self.cancelled.load(Ordering::Acquire) {
            return Err(FetchError::Cancelled);
        }

        let attempt = self.fetches.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(attempt, "session: fetching credential");
        self.source.provide().await.map_err(|err| {
            warn!(%err, attempt, "session: credential fetch failed");
            err
        })
    }
}

struct ActiveCall {
    session: Arc<dyn CallSession>,
    event_task: JoinHandle<()>,
}

#[derive(Default)]
struct ControllerState {
    client: Option<Arc<dyn VideoClient>>,
    call: Option<ActiveCall>,
    in_flight: bool,
    teardown_requested: bool,
    cancelled: Option<Arc<AtomicBool>>,
}

pub struct SessionController {
    api_key: String,
    factory: Arc<dyn VideoClientFactory>,
    credentials: Arc<dyn CredentialProvider>,
    inner: Mutex<ControllerState>,
    status: watch::Sender<SessionStatus>,
    participants: Arc<watch::Sender<usize>>,
}

impl SessionController {
    pub fn new(
        api_key: impl Into<String>,
        factory: Arc<dyn VideoClientFactory>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(SessionStatus::Idle);
        let (participants, _) = watch::channel(0);
        Arc::new(Self {
            api_key: api_key.into(),
            factory,
            credentials,
            inner: Mutex::new(ControllerState::default()),
            status,
            participants: Arc::new(participants),
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Participants in the call, the local user included. Zero when not connected.
    pub fn participant_count(&self) -> watch::Receiver<usize> {
        self.participants.subscribe()
    }

    pub async fn active_call(&self) -> Option<Arc<dyn CallSession>> {
        let state = self.inner.lock().await;
        state.call.as_ref().map(|active| Arc::clone(&active.session))
    }

    pub async fn initialize(
        self: &Arc<Self>,
        identity: Identity,
        call_id: CallId,
    ) -> Result<(), SessionError> {
        let (stale_call, stale_client, cancelled) = {
            let mut state = self.inner.lock().await;
            let current = self.status();
            if !current.is_settled() || state.in_flight {
                return Err(SessionError::AlreadyActive(current.label()));
            }
            let cancelled = Arc::new(AtomicBool::new(false));
            state.in_flight = true;
            state.teardown_requested = false;
            state.cancelled = Some(Arc::clone(&cancelled));
            self.status.send_replace(SessionStatus::Connecting);
            (state.call.take(), state.client.take(), cancelled)
        };

        let controller = Arc::clone(self);
        let lifecycle = tokio::spawn(async move {
            if stale_call.is_some() || stale_client.is_some() {
                info!("session: releasing handles left by a failed attempt");
                release(stale_call, stale_client).await;
            }
            let run = tokio::spawn(Arc::clone(&controller).run_lifecycle(
                identity, call_id, cancelled,
            ));
            match run.await {
                Ok(result) => result,
                Err(err) => controller.recover_lifecycle(err).await,
            }
        });
        lifecycle
            .await
            .map_err(|err| SessionError::Task(err.to_string()))?
    }

    /// The lifecycle task panicked or was cancelled mid-step. Release what it
    /// left behind and settle the status so waiting teardowns return.
    async fn recover_lifecycle(&self, err: JoinError) -> Result<(), SessionError> {
        error!(%err, "session: lifecycle task failed");
        let (call, client) = {
            let mut state = self.inner.lock().await;
            (state.call.take(), state.client.take())
        };
        release(call, client).await;

        let mut state = self.inner.lock().await;
        let torn_down = std::mem::take(&mut state.teardown_requested);
        state.in_flight = false;
        state.cancelled = None;
        self.participants.send_replace(0);
        let failure = SessionError::Task(err.to_string());
        if torn_down {
            self.status.send_replace(SessionStatus::Idle);
        } else {
            self.status
                .send_replace(SessionStatus::Error(failure.to_string()));
        }
        Err(failure)
    }

    async fn run_lifecycle(
        self: Arc<Self>,
        identity: Identity,
        call_id: CallId,
        cancelled: Arc<AtomicBool>,
    ) -> Result<(), SessionError> {
        let client = {
            let mut state = self.inner.lock().await;
            if state.teardown_requested {
                drop(state);
                return self.abandon_lifecycle(None).await;
            }
            let client = self.factory.create_client(&self.api_key);
            state.client = Some(Arc::clone(&client));
            client
        };
        info!(user_id = %identity.id, call_id = %call_id, "session: connecting");

        let credentials: Arc<dyn CredentialProvider> = Arc::new(GuardedCredentials {
            source: Arc::clone(&self.credentials),
            fetch_lock: Mutex::new(()),
            cancelled,
            fetches: AtomicU64::new(0),
        });
        if let Err(err) = client.connect_user(&identity, credentials).await {
            let failure = ConnectionError::Connect(format!("{err:#}"));
            return self.fail_lifecycle(failure).await;
        }

        {
            let state = self.inner.lock().await;
            if state.teardown_requested {
                drop(state);
                return self.abandon_lifecycle(None).await;
            }
            self.status.send_replace(SessionStatus::Joining);
        }
        info!(call_id = %call_id, "session: connected, joining call");

        let session = match client
            .join_call(CallOptions::join_or_create(call_id.clone()))
            .await
        {
            Ok(session) => session,
            Err(err) => {
                let failure = ConnectionError::Join {
                    call_id: call_id.to_string(),
                    message: format!("{err:#}"),
                };
                return self.fail_lifecycle(failure).await;
            }
        };

        let mut state = self.inner.lock().await;
        if state.teardown_requested {
            drop(state);
            return self.abandon_lifecycle(Some(session)).await;
        }
        self.participants.send_replace(1);
        let event_task = self.spawn_participant_task(&session);
        state.call = Some(ActiveCall {
            session,
            event_task,
        });
        state.in_flight = false;
        self.status.send_replace(SessionStatus::Connected);
        drop(state);

        info!(call_id = %call_id, "session: joined call");
        Ok(())
    }

    async fn fail_lifecycle(&self, failure: ConnectionError) -> Result<(), SessionError> {
        {
            let mut state = self.inner.lock().await;
            if !state.teardown_requested {
                error!(%failure, "session: failed");
                state.in_flight = false;
                self.status
                    .send_replace(SessionStatus::Error(failure.to_string()));
                return Err(failure.into());
            }
        }
        warn!(%failure, "session: failed while teardown was pending");
        self.abandon_lifecycle(None).await
    }

    /// Teardown arrived while a step was pending; release whatever exists.
    async fn abandon_lifecycle(
        &self,
        session: Option<Arc<dyn CallSession>>,
    ) -> Result<(), SessionError> {
        let client = self.inner.lock().await.client.take();
        if let Some(session) = session {
            if let Err(err) = session.leave().await {
                warn!(error = %err, "session: leave failed during teardown");
            }
        }
        release(None, client).await;

        let mut state = self.inner.lock().await;
        state.in_flight = false;
        state.teardown_requested = false;
        self.participants.send_replace(0);
        self.status.send_replace(SessionStatus::Idle);
        info!("session: torn down before it finished connecting");
        Err(SessionError::TornDown)
    }

    /// Leave, then disconnect. Safe to call in any state and any number of
    /// times; only the first call after a lifecycle has anything to release.
    pub async fn teardown(&self) {
        let (call, client) = {
            let mut state = self.inner.lock().await;
            if state.in_flight {
                state.teardown_requested = true;
                if let Some(cancelled) = &state.cancelled {
                    cancelled.store(true, Ordering::Release);
                }
                let mut status = self.status.subscribe();
                drop(state);
                debug!("session: teardown waiting for in-flight step");
                let _ = status.wait_for(SessionStatus::is_settled).await;
                return;
            }

            if let Some(cancelled) = state.cancelled.take() {
                cancelled.store(true, Ordering::Release);
            }
            let call = state.call.take();
            let client = state.client.take();
            if call.is_none() && client.is_none() {
                if self.status().error_message().is_some() {
                    self.status.send_replace(SessionStatus::Idle);
                }
                return;
            }
            self.status.send_replace(SessionStatus::Leaving);
            (call, client)
        };

        info!("session: leaving");
        release(call, client).await;

        let _state = self.inner.lock().await;
        self.participants.send_replace(0);
        self.status.send_replace(SessionStatus::Idle);
        info!("session: disconnected");
    }

    fn spawn_participant_task(&self, session: &Arc<dyn CallSession>) -> JoinHandle<()> {
        let mut events = session.subscribe_events();
        let participants = Arc::clone(&self.participants);
        tokio::spawn(async move {
            let mut remote = HashSet::new();
            loop {
                match events.recv().await {
                    Ok(CallEvent::ParticipantJoined(participant)) => {
                        debug!(participant_id = %participant.participant_id, "session: participant joined");
                        remote.insert(participant.participant_id);
                    }
                    Ok(CallEvent::ParticipantLeft { participant_id }) => {
                        debug!(%participant_id, "session: participant left");
                        remote.remove(&participant_id);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session: participant events lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                participants.send_replace(1 + remote.len());
            }
        })
    }
}

async fn release(call: Option<ActiveCall>, client: Option<Arc<dyn VideoClient>>) {
    if let Some(active) = call {
        active.event_task.abort();
        if let Err(err) = active.session.leave().await {
            warn!(error = %err, call_id = %active.session.call_id(), "session: leave failed");
        }
    }
    if let Some(client) = client {
        if let Err(err) = client.disconnect_user().await {
            warn!(error = %err, "session: disconnect failed");
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
