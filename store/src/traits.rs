use async_trait::async_trait;
use chrono::{DateTime, Utc};
use types::{Card, DeckEntry, GameSession};
use uuid::Uuid;

use crate::StoreError;

/// The engine's single seam onto the persistent store.
///
/// Implementations must make `insert_deck` atomic (a session never observes
/// a half-built deck) and `update_session` conditional on the stored
/// version; everything else is plain row access.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn insert_cards(&self, cards: &[Card]) -> Result<(), StoreError>;

    async fn active_cards(&self) -> Result<Vec<Card>, StoreError>;

    async fn cards_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Card>, StoreError>;

    /// Bump a card's usage counter. Lost increments under concurrent
    /// sessions are tolerated; usage is a popularity signal, not a
    /// correctness-critical counter.
    async fn increment_usage(&self, card_id: Uuid) -> Result<(), StoreError>;

    async fn insert_session(&self, session: &GameSession) -> Result<(), StoreError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<GameSession>, StoreError>;

    /// Persist `session` only if the stored row still carries
    /// `expected_version`. A mismatch returns
    /// [`StoreError::VersionConflict`] and leaves the row untouched.
    async fn update_session(
        &self,
        session: &GameSession,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    /// Insert a full deck in one transaction.
    async fn insert_deck(&self, entries: &[DeckEntry]) -> Result<(), StoreError>;

    /// All deck entries for a session, ascending by position.
    async fn deck_entries(&self, session_id: Uuid) -> Result<Vec<DeckEntry>, StoreError>;

    async fn mark_played(
        &self,
        session_id: Uuid,
        card_id: Uuid,
        played_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn mark_skipped(&self, session_id: Uuid, card_id: Uuid) -> Result<(), StoreError>;
}
