//! Feeding cues into a [`CueFeedStore`] from outside the process.
//!
//! Payloads are validated here, at the boundary: anything that does not parse
//! into a [`CueEvent`] with a known priority is counted and dropped, never
//! appended with a guessed priority.

use anyhow::{Context, Result};
use futures::StreamExt;
use shared::cue::{parse_cue_payload, CueEvent};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::feed::CueFeedStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub accepted: usize,
    pub rejected: usize,
}

/// Parses one raw payload and appends it on success.
pub async fn ingest_raw(store: &CueFeedStore, raw: &str, stats: &mut IngestStats) {
    match parse_cue_payload(raw) {
        Ok(event) => {
            store.append(event).await;
            stats.accepted += 1;
        }
        Err(err) => {
            warn!(%err, "cue feed: payload rejected");
            stats.rejected += 1;
        }
    }
}

/// Appends every cue received on `rx` until all senders are dropped.
pub fn spawn_channel_ingestion(
    store: CueFeedStore,
    mut rx: mpsc::Receiver<CueEvent>,
) -> JoinHandle<IngestStats> {
    tokio::spawn(async move {
        let mut stats = IngestStats::default();
        while let Some(event) = rx.recv().await {
            store.append(event).await;
            stats.accepted += 1;
        }
        debug!(accepted = stats.accepted, "cue feed: channel closed");
        stats
    })
}

/// Connects to a cue relay websocket and appends each text frame that parses.
/// Returns once the connection is open; the handle resolves when the relay
/// closes the stream.
pub async fn spawn_websocket_ingestion(
    store: CueFeedStore,
    url: &str,
) -> Result<JoinHandle<IngestStats>> {
    let (ws_stream, _) = connect_async(url)
        .await
        .with_context(|| format!("failed to connect cue feed: {url}"))?;
    info!(%url, "cue feed: connected");
    let (_, mut ws_reader) = ws_stream.split();

    Ok(tokio::spawn(async move {
        let mut stats = IngestStats::default();
        while let Some(msg) = ws_reader.next().await {
            match msg {
                Ok(Message::Text(text)) => ingest_raw(&store, &text, &mut stats).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!(%err, "cue feed: websocket error");
                    break;
                }
            }
        }
        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            "cue feed: disconnected"
        );
        stats
    }))
}

#[cfg(test)]
#[path = "tests/ingest_tests.rs"]
mod tests;
