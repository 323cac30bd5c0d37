//! What a front end should show for a session, derived from controller state
//! and the cue feed. No rendering happens here.

use shared::cue::{CueEvent, CuePriority};

use crate::{controller::SessionStatus, feed::CueFeed};

pub const CONNECTING_HEADLINE: &str = "Connecting EchoSight...";
pub const FAILED_HEADLINE: &str = "Connection failed";
pub const LISTENING_CAPTION: &str = "EchoSight active — listening...";
pub const EMPTY_FEED_HINT: &str = "Cues will appear here as EchoSight detects social signals...";
pub const CONFIG_HINT: &str = "Check that API_KEY is set for the client, that API_SECRET is set \
     on the token server, and that TOKEN_ENDPOINT points at a reachable server.";
pub const VOICE_COMMANDS: [&str; 4] = [
    "What's happening?",
    "Who's talking?",
    "How many people?",
    "Go quiet",
];

/// Visual emphasis for a cue card. One bucket per priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueStyle {
    Alert,
    Highlight,
    Plain,
}

impl From<CuePriority> for CueStyle {
    fn from(priority: CuePriority) -> Self {
        match priority {
            CuePriority::Urgent => CueStyle::Alert,
            CuePriority::High => CueStyle::Highlight,
            CuePriority::Normal => CueStyle::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueCard {
    pub text: String,
    pub timestamp: String,
    pub style: CueStyle,
}

impl From<&CueEvent> for CueCard {
    fn from(event: &CueEvent) -> Self {
        Self {
            text: event.text.clone(),
            timestamp: event.timestamp.clone(),
            style: event.priority.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveView {
    pub participants: String,
    pub caption: String,
    /// Most recent first. Empty means show [`EMPTY_FEED_HINT`].
    pub cards: Vec<CueCard>,
    pub voice_commands: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    Connecting,
    Failed { message: String, hint: &'static str },
    Live(LiveView),
}

impl SessionView {
    /// Full-screen headline for the non-live states.
    pub fn headline(&self) -> Option<&'static str> {
        match self {
            SessionView::Connecting => Some(CONNECTING_HEADLINE),
            SessionView::Failed { .. } => Some(FAILED_HEADLINE),
            SessionView::Live(_) => None,
        }
    }
}

pub fn participants_label(count: usize) -> String {
    if count == 1 {
        "1 participant".to_string()
    } else {
        format!("{count} participants")
    }
}

pub fn render_view(status: &SessionStatus, participants: usize, feed: &CueFeed) -> SessionView {
    match status {
        SessionStatus::Error(message) => SessionView::Failed {
            message: message.clone(),
            hint: CONFIG_HINT,
        },
        SessionStatus::Connected => SessionView::Live(LiveView {
            participants: participants_label(participants),
            caption: feed
                .latest()
                .map(|cue| cue.text.clone())
                .unwrap_or_else(|| LISTENING_CAPTION.to_string()),
            cards: feed.history().map(CueCard::from).collect(),
            voice_commands: &VOICE_COMMANDS,
        }),
        _ => SessionView::Connecting,
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
