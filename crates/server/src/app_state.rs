use shared::cue::CueEvent;
use tokio::sync::broadcast;

use crate::credentials::CredentialIssuer;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) issuer: CredentialIssuer,
    pub(crate) cues: broadcast::Sender<CueEvent>,
}
