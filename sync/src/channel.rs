use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use types::GameSession;
use uuid::Uuid;

/// Row-change notification for one session. `session` carries the fresh
/// snapshot when the publisher had one on hand; subscribers refetch
/// otherwise. Delivery is at-least-once and unordered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub session_id: Uuid,
    pub kind: ChangeKind,
    pub session: Option<GameSession>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Session,
    Deck,
}

/// Recoverable push-channel trouble. The synchronizer reports these and
/// falls back to polling; none of them end a subscription.
#[derive(Error, Debug, Clone)]
pub enum ChannelError {
    #[error("Subscription failed: {0}")]
    Subscribe(String),

    #[error("Receiver lagged behind by {0} events")]
    Lagged(u64),

    #[error("Channel closed")]
    Closed,
}

/// Push side of the synchronizer: one logical topic per session id.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn subscribe(
        &self,
        session_id: Uuid,
    ) -> Result<broadcast::Receiver<ChangeEvent>, ChannelError>;
}

const TOPIC_CAPACITY: usize = 64;

/// Broadcast-backed channel for clients living in the same process as the
/// publisher, and for tests.
#[derive(Default)]
pub struct InProcessChannel {
    topics: Mutex<HashMap<Uuid, broadcast::Sender<ChangeEvent>>>,
}

impl InProcessChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn topic(&self, session_id: Uuid) -> broadcast::Sender<ChangeEvent> {
        let mut topics = self.topics.lock().expect("channel lock poisoned");
        topics
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }

    /// Delivers to current subscribers; returns how many there were.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.topic(event.session_id).send(event).unwrap_or(0)
    }

    /// Drops a session's topic, closing every open subscription on it.
    /// Tests use this to knock the push channel over; a later `subscribe`
    /// recreates the topic.
    pub fn disconnect(&self, session_id: Uuid) {
        self.topics
            .lock()
            .expect("channel lock poisoned")
            .remove(&session_id);
    }
}

#[async_trait]
impl PushChannel for InProcessChannel {
    async fn subscribe(
        &self,
        session_id: Uuid,
    ) -> Result<broadcast::Receiver<ChangeEvent>, ChannelError> {
        Ok(self.topic(session_id).subscribe())
    }
}
