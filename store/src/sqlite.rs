use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use types::{Card, Category, DeckEntry, GameSession, SessionStatus, TurnPhase};
use uuid::Uuid;

use crate::{GameStore, StoreError};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(StoreError::UuidParsing)
}

fn card_from_row(row: &SqliteRow) -> Result<Card, StoreError> {
    let id: String = row.get("id");
    let category: String = row.get("category");

    Ok(Card {
        id: parse_uuid(&id)?,
        category: Category::from_str(&category).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        prompt: row.get("prompt"),
        usage_count: row.get("usage_count"),
        is_active: row.get("is_active"),
    })
}

fn session_from_row(row: &SqliteRow) -> Result<GameSession, StoreError> {
    let id: String = row.get("id");
    let participant_a: String = row.get("participant_a");
    let participant_b: Option<String> = row.get("participant_b");
    let current_turn: String = row.get("current_turn");
    let status: String = row.get("status");
    let turn_phase: String = row.get("turn_phase");
    let current_card_id: Option<String> = row.get("current_card_id");
    let played_cards: String = row.get("played_cards");
    let skipped_cards: String = row.get("skipped_cards");
    let total_cards_played: i64 = row.get("total_cards_played");
    let deck_size: i64 = row.get("deck_size");

    Ok(GameSession {
        id: parse_uuid(&id)?,
        participant_a: parse_uuid(&participant_a)?,
        participant_b: participant_b.as_deref().map(parse_uuid).transpose()?,
        current_turn: parse_uuid(&current_turn)?,
        status: SessionStatus::from_str(&status).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        turn_phase: TurnPhase::from_str(&turn_phase)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        current_card_id: current_card_id.as_deref().map(parse_uuid).transpose()?,
        total_cards_played: total_cards_played as u32,
        played_cards: serde_json::from_str(&played_cards)?,
        skipped_cards: serde_json::from_str(&skipped_cards)?,
        deck_size: deck_size as u32,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}

fn entry_from_row(row: &SqliteRow) -> Result<DeckEntry, StoreError> {
    let session_id: String = row.get("session_id");
    let card_id: String = row.get("card_id");
    let position: i64 = row.get("position");

    Ok(DeckEntry {
        session_id: parse_uuid(&session_id)?,
        card_id: parse_uuid(&card_id)?,
        position: position as u32,
        is_played: row.get("is_played"),
        skipped: row.get("skipped"),
        played_at: row.get("played_at"),
    })
}

#[async_trait]
impl GameStore for SqliteStore {
    async fn insert_cards(&self, cards: &[Card]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        for card in cards {
            sqlx::query(
                "INSERT INTO cards (id, category, prompt, usage_count, is_active) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(card.id.to_string())
            .bind(card.category.as_str())
            .bind(&card.prompt)
            .bind(card.usage_count)
            .bind(card.is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        Ok(())
    }

    async fn active_cards(&self) -> Result<Vec<Card>, StoreError> {
        let rows = sqlx::query("SELECT * FROM cards WHERE is_active = 1")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(card_from_row).collect()
    }

    async fn cards_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Card>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM cards WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(card_from_row).collect()
    }

    async fn increment_usage(&self, card_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE cards SET usage_count = usage_count + 1 WHERE id = ?")
            .bind(card_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CardNotFound(card_id));
        }
        Ok(())
    }

    async fn insert_session(&self, session: &GameSession) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO game_sessions (id, participant_a, participant_b, current_turn, \
             status, turn_phase, current_card_id, total_cards_played, played_cards, \
             skipped_cards, deck_size, created_at, updated_at, version) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(session.participant_a.to_string())
        .bind(session.participant_b.map(|id| id.to_string()))
        .bind(session.current_turn.to_string())
        .bind(session.status.as_str())
        .bind(session.turn_phase.as_str())
        .bind(session.current_card_id.map(|id| id.to_string()))
        .bind(session.total_cards_played as i64)
        .bind(serde_json::to_string(&session.played_cards)?)
        .bind(serde_json::to_string(&session.skipped_cards)?)
        .bind(session.deck_size as i64)
        .bind(session.created_at)
        .bind(session.updated_at)
        .bind(session.version)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<GameSession>, StoreError> {
        let row = sqlx::query("SELECT * FROM game_sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn update_session(
        &self,
        session: &GameSession,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE game_sessions SET participant_b = ?, current_turn = ?, status = ?, \
             turn_phase = ?, current_card_id = ?, total_cards_played = ?, played_cards = ?, \
             skipped_cards = ?, updated_at = ?, version = ? \
             WHERE id = ? AND version = ?",
        )
        .bind(session.participant_b.map(|id| id.to_string()))
        .bind(session.current_turn.to_string())
        .bind(session.status.as_str())
        .bind(session.turn_phase.as_str())
        .bind(session.current_card_id.map(|id| id.to_string()))
        .bind(session.total_cards_played as i64)
        .bind(serde_json::to_string(&session.played_cards)?)
        .bind(serde_json::to_string(&session.skipped_cards)?)
        .bind(session.updated_at)
        .bind(session.version)
        .bind(session.id.to_string())
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return match self.get_session(session.id).await? {
                Some(_) => Err(StoreError::VersionConflict {
                    session_id: session.id,
                    expected: expected_version,
                }),
                None => Err(StoreError::SessionNotFound(session.id)),
            };
        }
        Ok(())
    }

    async fn insert_deck(&self, entries: &[DeckEntry]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO deck_entries (session_id, card_id, position, is_played, \
                 skipped, played_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(entry.session_id.to_string())
            .bind(entry.card_id.to_string())
            .bind(entry.position as i64)
            .bind(entry.is_played)
            .bind(entry.skipped)
            .bind(entry.played_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        Ok(())
    }

    async fn deck_entries(&self, session_id: Uuid) -> Result<Vec<DeckEntry>, StoreError> {
        let rows =
            sqlx::query("SELECT * FROM deck_entries WHERE session_id = ? ORDER BY position ASC")
                .bind(session_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn mark_played(
        &self,
        session_id: Uuid,
        card_id: Uuid,
        played_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE deck_entries SET is_played = 1, played_at = ? \
             WHERE session_id = ? AND card_id = ? AND is_played = 0 AND skipped = 0",
        )
        .bind(played_at)
        .bind(session_id.to_string())
        .bind(card_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DeckEntryNotFound {
                session_id,
                card_id,
            });
        }
        Ok(())
    }

    async fn mark_skipped(&self, session_id: Uuid, card_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE deck_entries SET skipped = 1 \
             WHERE session_id = ? AND card_id = ? AND is_played = 0 AND skipped = 0",
        )
        .bind(session_id.to_string())
        .bind(card_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DeckEntryNotFound {
                session_id,
                card_id,
            });
        }
        Ok(())
    }
}
