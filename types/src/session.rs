use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall lifecycle of a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        }
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown session status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for SessionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "paused" => Ok(SessionStatus::Paused),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Where the turn holder is within their turn.
///
/// Pausing freezes the phase in place, so resuming returns the session to
/// whatever phase it was paused from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    /// No card on the table; waiting for the turn holder to draw.
    Idle,
    /// A card is attached to the session but not yet shown.
    Drawn,
    /// The card is face up for the turn holder.
    Revealed,
}

impl TurnPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnPhase::Idle => "idle",
            TurnPhase::Drawn => "drawn",
            TurnPhase::Revealed => "revealed",
        }
    }
}

impl Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown turn phase: {0}")]
pub struct ParsePhaseError(pub String);

impl FromStr for TurnPhase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(TurnPhase::Idle),
            "drawn" => Ok(TurnPhase::Drawn),
            "revealed" => Ok(TurnPhase::Revealed),
            other => Err(ParsePhaseError(other.to_string())),
        }
    }
}

/// One row per pairing of two participants.
///
/// Mutated exclusively through the turn coordinator; every persisted write
/// is conditional on `version`, which bumps by one per mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: Uuid,
    pub participant_a: Uuid,
    /// `None` until a real partner joins. Placeholder sessions cannot take
    /// turns.
    pub participant_b: Option<Uuid>,
    pub current_turn: Uuid,
    pub status: SessionStatus,
    pub turn_phase: TurnPhase,
    pub current_card_id: Option<Uuid>,
    pub total_cards_played: u32,
    /// Authoritative play history, in play order.
    pub played_cards: Vec<Uuid>,
    pub skipped_cards: Vec<Uuid>,
    pub deck_size: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl GameSession {
    pub fn new(participant_a: Uuid, participant_b: Option<Uuid>, deck_size: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            participant_a,
            participant_b,
            current_turn: participant_a,
            status: SessionStatus::Active,
            turn_phase: TurnPhase::Idle,
            current_card_id: None,
            total_cards_played: 0,
            played_cards: Vec::new(),
            skipped_cards: Vec::new(),
            deck_size,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_participant(&self, id: Uuid) -> bool {
        self.participant_a == id || self.participant_b == Some(id)
    }

    /// The participant opposite `id`, if both seats are filled.
    pub fn partner_of(&self, id: Uuid) -> Option<Uuid> {
        let b = self.participant_b?;
        if id == self.participant_a {
            Some(b)
        } else if id == b {
            Some(self.participant_a)
        } else {
            None
        }
    }

    /// Any evidence that cards have moved in this session.
    pub fn has_activity(&self) -> bool {
        self.total_cards_played > 0
            || !self.played_cards.is_empty()
            || !self.skipped_cards.is_empty()
    }
}
