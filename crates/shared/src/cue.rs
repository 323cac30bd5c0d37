//! Social cue events as delivered to the client feed.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuePriority {
    Urgent,
    High,
    Normal,
}

impl CuePriority {
    pub fn as_str(self) -> &'static str {
        match self {
            CuePriority::Urgent => "urgent",
            CuePriority::High => "high",
            CuePriority::Normal => "normal",
        }
    }
}

impl fmt::Display for CuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cue priority '{0}'; expected urgent, high or normal")]
pub struct UnknownPriority(pub String);

impl FromStr for CuePriority {
    type Err = UnknownPriority;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "urgent" => Ok(CuePriority::Urgent),
            "high" => Ok(CuePriority::High),
            "normal" => Ok(CuePriority::Normal),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

/// One social cue. Immutable once built; feeds keep them in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueEvent {
    pub text: String,
    #[serde(rename = "time", alias = "timestamp")]
    pub timestamp: String,
    pub priority: CuePriority,
}

impl CueEvent {
    pub fn new(
        text: impl Into<String>,
        timestamp: impl Into<String>,
        priority: CuePriority,
    ) -> Self {
        Self {
            text: text.into(),
            timestamp: timestamp.into(),
            priority,
        }
    }
}

/// Cue as it arrives from a producer, before the priority has been checked.
#[derive(Debug, Clone, Deserialize)]
pub struct CuePayload {
    pub text: String,
    #[serde(rename = "time", alias = "timestamp")]
    pub timestamp: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CueRejected {
    #[error("malformed cue payload: {0}")]
    Malformed(String),
    #[error(transparent)]
    UnknownPriority(#[from] UnknownPriority),
}

impl TryFrom<CuePayload> for CueEvent {
    type Error = CueRejected;

    fn try_from(payload: CuePayload) -> Result<Self, Self::Error> {
        let priority = payload.priority.parse::<CuePriority>()?;
        Ok(CueEvent {
            text: payload.text,
            timestamp: payload.timestamp,
            priority,
        })
    }
}

/// Parses and validates one JSON cue. Unknown priorities are rejected here so
/// that nothing downstream has to guess a display bucket.
pub fn parse_cue_payload(raw: &str) -> Result<CueEvent, CueRejected> {
    let payload: CuePayload =
        serde_json::from_str(raw).map_err(|err| CueRejected::Malformed(err.to_string()))?;
    CueEvent::try_from(payload)
}
