use std::sync::Arc;

use engine::{EventSink, GameEvent};
use tracing::debug;

use crate::channel::{ChangeEvent, ChangeKind, InProcessChannel};

/// Turns coordinator events into push notifications, so both participants'
/// synchronizers observe every session write.
///
/// Payloads are left empty on purpose: subscribers refetch, which keeps
/// the channel an invalidation signal rather than a second source of truth.
pub struct EventPublisher {
    channel: Arc<InProcessChannel>,
}

impl EventPublisher {
    pub fn new(channel: Arc<InProcessChannel>) -> Self {
        Self { channel }
    }
}

impl EventSink for EventPublisher {
    fn on_event(&self, event: &GameEvent) {
        let kind = match event {
            GameEvent::DeckBuilt { .. } => ChangeKind::Deck,
            _ => ChangeKind::Session,
        };
        let delivered = self.channel.publish(ChangeEvent {
            session_id: event.session_id(),
            kind,
            session: None,
        });
        debug!(session_id = %event.session_id(), delivered, "Published change event");
    }
}
