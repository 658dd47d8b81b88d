use std::sync::Mutex;

use uuid::Uuid;

/// Engine-level happenings, published to an injectable sink so the engine
/// runs silently in production and verbosely under test.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    DeckBuilt {
        session_id: Uuid,
        deck_size: u32,
    },
    CardDrawn {
        session_id: Uuid,
        card_id: Uuid,
        by: Uuid,
    },
    CardRevealed {
        session_id: Uuid,
        card_id: Uuid,
        by: Uuid,
    },
    TurnCompleted {
        session_id: Uuid,
        card_id: Uuid,
        by: Uuid,
        /// The turn holder's answer to the prompt; forwarded, never stored.
        response: Option<String>,
    },
    CardSkipped {
        session_id: Uuid,
        card_id: Uuid,
        by: Uuid,
    },
    SessionPaused {
        session_id: Uuid,
        by: Uuid,
    },
    SessionResumed {
        session_id: Uuid,
        by: Uuid,
    },
    SessionEnded {
        session_id: Uuid,
        by: Uuid,
    },
}

impl GameEvent {
    pub fn session_id(&self) -> Uuid {
        match *self {
            GameEvent::DeckBuilt { session_id, .. }
            | GameEvent::CardDrawn { session_id, .. }
            | GameEvent::CardRevealed { session_id, .. }
            | GameEvent::TurnCompleted { session_id, .. }
            | GameEvent::CardSkipped { session_id, .. }
            | GameEvent::SessionPaused { session_id, .. }
            | GameEvent::SessionResumed { session_id, .. }
            | GameEvent::SessionEnded { session_id, .. } => session_id,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &GameEvent);
}

/// Sink for when nobody is listening.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn on_event(&self, _event: &GameEvent) {}
}

/// Buffers everything it sees; handy in tests.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<GameEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }
}

impl EventSink for CollectingSink {
    fn on_event(&self, event: &GameEvent) {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push(event.clone());
    }
}
