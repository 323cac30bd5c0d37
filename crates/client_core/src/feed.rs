//! Per-session social cue feed.
//!
//! Cues are kept in arrival order and never edited or removed individually;
//! the only way entries disappear is [`CueFeedStore::clear`] when the owning
//! session ends. Priority is carried along for display and has no effect on
//! ordering.

use std::sync::Arc;

use shared::cue::CueEvent;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueFeed {
    events: Vec<CueEvent>,
}

impl CueFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: CueEvent) {
        self.events.push(event);
    }

    /// The most recently arrived cue, `None` while nothing has arrived yet.
    pub fn latest(&self) -> Option<&CueEvent> {
        self.events.last()
    }

    /// Most recent first; the exact reverse of arrival order.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &CueEvent> {
        self.events.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn clear(&mut self) {
        self.events.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueFeedUpdate {
    Appended(CueEvent),
    Cleared,
}

/// Shared handle over a [`CueFeed`]. Writers take the lock for the whole
/// append, so readers never observe a half-written entry.
#[derive(Clone)]
pub struct CueFeedStore {
    feed: Arc<RwLock<CueFeed>>,
    updates: broadcast::Sender<CueFeedUpdate>,
}

impl Default for CueFeedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CueFeedStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(256);
        Self {
            feed: Arc::new(RwLock::new(CueFeed::new())),
            updates,
        }
    }

    pub async fn append(&self, event: CueEvent) {
        let len = {
            let mut feed = self.feed.write().await;
            feed.append(event.clone());
            feed.len()
        };
        debug!(len, priority = %event.priority, "cue appended");
        let _ = self.updates.send(CueFeedUpdate::Appended(event));
    }

    pub async fn latest(&self) -> Option<CueEvent> {
        self.feed.read().await.latest().cloned()
    }

    pub async fn history(&self) -> Vec<CueEvent> {
        self.feed.read().await.history().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.feed.read().await.len()
    }

    pub async fn snapshot(&self) -> CueFeed {
        self.feed.read().await.clone()
    }

    pub(crate) async fn clear(&self) {
        self.feed.write().await.clear();
        let _ = self.updates.send(CueFeedUpdate::Cleared);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CueFeedUpdate> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/feed_tests.rs"]
mod tests;
