use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use types::{Card, DeckEntry, GameSession};
use uuid::Uuid;

use crate::{GameStore, StoreError};

/// In-memory `GameStore` for tests and hosts that bring their own
/// persistence. Semantics match the SQLite implementation, including the
/// compare-on-version session update.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    cards: HashMap<Uuid, Card>,
    sessions: HashMap<Uuid, GameSession>,
    decks: HashMap<Uuid, Vec<DeckEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn insert_cards(&self, cards: &[Card]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        for card in cards {
            inner.cards.insert(card.id, card.clone());
        }
        Ok(())
    }

    async fn active_cards(&self) -> Result<Vec<Card>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .cards
            .values()
            .filter(|card| card.is_active)
            .cloned()
            .collect())
    }

    async fn cards_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Card>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(ids
            .iter()
            .filter_map(|id| inner.cards.get(id).cloned())
            .collect())
    }

    async fn increment_usage(&self, card_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let card = inner
            .cards
            .get_mut(&card_id)
            .ok_or(StoreError::CardNotFound(card_id))?;
        card.usage_count += 1;
        Ok(())
    }

    async fn insert_session(&self, session: &GameSession) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<GameSession>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.sessions.get(&id).cloned())
    }

    async fn update_session(
        &self,
        session: &GameSession,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let stored = inner
            .sessions
            .get_mut(&session.id)
            .ok_or(StoreError::SessionNotFound(session.id))?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                session_id: session.id,
                expected: expected_version,
            });
        }

        *stored = session.clone();
        Ok(())
    }

    async fn insert_deck(&self, entries: &[DeckEntry]) -> Result<(), StoreError> {
        let Some(first) = entries.first() else {
            return Ok(());
        };
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner
            .decks
            .entry(first.session_id)
            .or_default()
            .extend(entries.iter().cloned());
        Ok(())
    }

    async fn deck_entries(&self, session_id: Uuid) -> Result<Vec<DeckEntry>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut entries = inner.decks.get(&session_id).cloned().unwrap_or_default();
        entries.sort_by_key(|entry| entry.position);
        Ok(entries)
    }

    async fn mark_played(
        &self,
        session_id: Uuid,
        card_id: Uuid,
        played_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let entry = inner
            .decks
            .get_mut(&session_id)
            .and_then(|deck| {
                deck.iter_mut()
                    .find(|entry| entry.card_id == card_id && entry.is_undealt())
            })
            .ok_or(StoreError::DeckEntryNotFound {
                session_id,
                card_id,
            })?;

        entry.is_played = true;
        entry.played_at = Some(played_at);
        Ok(())
    }

    async fn mark_skipped(&self, session_id: Uuid, card_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let entry = inner
            .decks
            .get_mut(&session_id)
            .and_then(|deck| {
                deck.iter_mut()
                    .find(|entry| entry.card_id == card_id && entry.is_undealt())
            })
            .ok_or(StoreError::DeckEntryNotFound {
                session_id,
                card_id,
            })?;

        entry.skipped = true;
        Ok(())
    }
}
