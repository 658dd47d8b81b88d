use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One dealt slot of a session's deck. Created in bulk when the deck is
/// built; `is_played` and `skipped` are mutually exclusive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub session_id: Uuid,
    pub card_id: Uuid,
    pub position: u32,
    pub is_played: bool,
    pub skipped: bool,
    pub played_at: Option<DateTime<Utc>>,
}

impl DeckEntry {
    pub fn new(session_id: Uuid, card_id: Uuid, position: u32) -> Self {
        Self {
            session_id,
            card_id,
            position,
            is_played: false,
            skipped: false,
            played_at: None,
        }
    }

    /// Still available to draw.
    pub fn is_undealt(&self) -> bool {
        !self.is_played && !self.skipped
    }
}
