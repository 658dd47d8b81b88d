use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::thread_rng;
use store::{GameStore, StoreError};
use types::{Card, Category, GameSession, PlayHistory, SessionStatus, TurnPhase};
use uuid::Uuid;

use crate::config::{DrawMode, GameConfig};
use crate::deck;
use crate::events::{EventSink, GameEvent, NoopSink};
use crate::selector;
use crate::skip::{FixedSkipGate, SkipGate};
use crate::EngineError;

/// Session-level state machine: draw → reveal → complete/skip → handoff.
///
/// Every operation validates (requester, status, phase) through one guard
/// before touching anything, and every session write is conditional on the
/// version the operation read. Two clients racing for the same transition
/// therefore resolve to one winner and one `Conflict`.
pub struct TurnCoordinator {
    store: Arc<dyn GameStore>,
    skip_gate: Arc<dyn SkipGate>,
    events: Arc<dyn EventSink>,
    config: GameConfig,
}

impl TurnCoordinator {
    pub fn new(
        store: Arc<dyn GameStore>,
        skip_gate: Arc<dyn SkipGate>,
        events: Arc<dyn EventSink>,
        config: GameConfig,
    ) -> Self {
        Self {
            store,
            skip_gate,
            events,
            config,
        }
    }

    /// Default wiring: config-limited skips, no event listener.
    pub fn with_defaults(store: Arc<dyn GameStore>, config: GameConfig) -> Self {
        let skip_gate = Arc::new(FixedSkipGate::new(config.skip_limit));
        Self::new(store, skip_gate, Arc::new(NoopSink), config)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Persists a fresh Active/Idle session (participant A draws first) and
    /// builds its deck. A failed build leaves the session deckless; callers
    /// may retry `build_deck` with a smaller size.
    pub async fn create_session(
        &self,
        participant_a: Uuid,
        participant_b: Option<Uuid>,
    ) -> Result<GameSession, EngineError> {
        let session = GameSession::new(participant_a, participant_b, self.config.deck_size);
        self.store.insert_session(&session).await?;
        log::info!("Created session {} for {participant_a}", session.id);

        deck::build_deck(
            self.store.as_ref(),
            self.events.as_ref(),
            session.id,
            self.config.deck_size,
        )
        .await?;
        Ok(session)
    }

    /// Draws the next card for the turn holder. `Ok(None)` means the deck
    /// is exhausted; the session is left untouched in that case.
    pub async fn draw_card(
        &self,
        session_id: Uuid,
        requester: Uuid,
    ) -> Result<Option<Card>, EngineError> {
        let mut session = self.fetch(session_id).await?;
        authorize(&session, requester, "draw", &[TurnPhase::Idle], "idle")?;

        let entries = self.store.deck_entries(session_id).await?;
        let undealt: Vec<Uuid> = entries
            .iter()
            .filter(|entry| entry.is_undealt())
            .map(|entry| entry.card_id)
            .collect();
        if undealt.is_empty() {
            log::info!("Deck exhausted for session {session_id}");
            return Ok(None);
        }

        let pool = self.store.cards_by_ids(&undealt).await?;
        let card = match self.config.draw_mode {
            DrawMode::Sequential => {
                // `undealt` inherits the store's position ordering.
                let next_id = undealt[0];
                pool.into_iter()
                    .find(|card| card.id == next_id)
                    .ok_or(StoreError::CardNotFound(next_id))?
            }
            DrawMode::Weighted => {
                let history = self.resolve_history(&session).await?;
                match selector::select_next_card(&history, &pool, &mut thread_rng()) {
                    Some(card) => card,
                    None => return Ok(None),
                }
            }
        };

        self.store.increment_usage(card.id).await?;

        session.current_card_id = Some(card.id);
        session.turn_phase = TurnPhase::Drawn;
        self.persist(&mut session).await?;

        log::info!(
            "Participant {requester} drew {} card {} in session {session_id}",
            card.category,
            card.id
        );
        self.events.on_event(&GameEvent::CardDrawn {
            session_id,
            card_id: card.id,
            by: requester,
        });
        Ok(Some(card))
    }

    pub async fn reveal_card(&self, session_id: Uuid, requester: Uuid) -> Result<(), EngineError> {
        let mut session = self.fetch(session_id).await?;
        authorize(&session, requester, "reveal", &[TurnPhase::Drawn], "drawn")?;
        let card_id = current_card(&session)?;

        session.turn_phase = TurnPhase::Revealed;
        self.persist(&mut session).await?;

        self.events.on_event(&GameEvent::CardRevealed {
            session_id,
            card_id,
            by: requester,
        });
        Ok(())
    }

    /// Finishes the turn: the entry is marked played, the play history and
    /// counter grow, and the turn passes to the partner. The response is
    /// forwarded to the event sink, not persisted here.
    pub async fn complete_turn(
        &self,
        session_id: Uuid,
        requester: Uuid,
        response: Option<String>,
    ) -> Result<(), EngineError> {
        let mut session = self.fetch(session_id).await?;
        authorize(
            &session,
            requester,
            "complete",
            &[TurnPhase::Revealed],
            "revealed",
        )?;
        let card_id = current_card(&session)?;

        self.store
            .mark_played(session_id, card_id, Utc::now())
            .await?;

        session.played_cards.push(card_id);
        session.total_cards_played += 1;
        hand_off(&mut session);
        self.persist(&mut session).await?;

        log::info!("Participant {requester} completed card {card_id} in session {session_id}");
        self.events.on_event(&GameEvent::TurnCompleted {
            session_id,
            card_id,
            by: requester,
            response,
        });
        Ok(())
    }

    /// Skips the card on the table. The turn still passes, but
    /// `total_cards_played` does not move and the skip allowance shrinks.
    pub async fn skip_card(&self, session_id: Uuid, requester: Uuid) -> Result<(), EngineError> {
        let mut session = self.fetch(session_id).await?;
        authorize(
            &session,
            requester,
            "skip",
            &[TurnPhase::Drawn, TurnPhase::Revealed],
            "drawn or revealed",
        )?;
        let card_id = current_card(&session)?;

        if !self.skip_gate.try_consume(session_id, requester) {
            return Err(EngineError::SkipLimitExceeded {
                participant: requester,
            });
        }

        self.store.mark_skipped(session_id, card_id).await?;

        session.skipped_cards.push(card_id);
        hand_off(&mut session);
        self.persist(&mut session).await?;

        log::info!("Participant {requester} skipped card {card_id} in session {session_id}");
        self.events.on_event(&GameEvent::CardSkipped {
            session_id,
            card_id,
            by: requester,
        });
        Ok(())
    }

    /// Flips between Active and Paused. Pausing is only allowed while the
    /// table is settled (idle or revealed); resuming restores the phase the
    /// session was paused in.
    pub async fn toggle_pause(&self, session_id: Uuid, requester: Uuid) -> Result<(), EngineError> {
        let mut session = self.fetch(session_id).await?;
        require_participant(&session, requester)?;

        match session.status {
            SessionStatus::Active => {
                if !matches!(session.turn_phase, TurnPhase::Idle | TurnPhase::Revealed) {
                    return Err(EngineError::InvalidState {
                        operation: "pause",
                        expected: "idle or revealed",
                        actual: session.turn_phase.to_string(),
                    });
                }
                session.status = SessionStatus::Paused;
                self.persist(&mut session).await?;
                self.events.on_event(&GameEvent::SessionPaused {
                    session_id,
                    by: requester,
                });
            }
            SessionStatus::Paused => {
                session.status = SessionStatus::Active;
                self.persist(&mut session).await?;
                self.events.on_event(&GameEvent::SessionResumed {
                    session_id,
                    by: requester,
                });
            }
            SessionStatus::Completed => {
                return Err(EngineError::InvalidState {
                    operation: "pause",
                    expected: "an unfinished session",
                    actual: session.status.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Terminal and idempotent; either participant may end the game from
    /// any state.
    pub async fn end_game(&self, session_id: Uuid, requester: Uuid) -> Result<(), EngineError> {
        let mut session = self.fetch(session_id).await?;
        require_participant(&session, requester)?;

        if session.status == SessionStatus::Completed {
            return Ok(());
        }

        session.status = SessionStatus::Completed;
        session.current_card_id = None;
        session.turn_phase = TurnPhase::Idle;
        self.persist(&mut session).await?;

        log::info!("Participant {requester} ended session {session_id}");
        self.events.on_event(&GameEvent::SessionEnded {
            session_id,
            by: requester,
        });
        Ok(())
    }

    async fn fetch(&self, session_id: Uuid) -> Result<GameSession, EngineError> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or(EngineError::SessionNotFound(session_id))
    }

    /// Conditional write keyed on the version this operation read.
    async fn persist(&self, session: &mut GameSession) -> Result<(), EngineError> {
        let expected = session.version;
        session.version += 1;
        session.updated_at = Utc::now();
        self.store.update_session(session, expected).await?;
        Ok(())
    }

    /// Play history for the selector, resolved once per draw.
    async fn resolve_history(&self, session: &GameSession) -> Result<PlayHistory, EngineError> {
        let played = self.store.cards_by_ids(&session.played_cards).await?;
        let lookup: HashMap<Uuid, Category> = played
            .iter()
            .map(|card| (card.id, card.category))
            .collect();
        Ok(PlayHistory::resolve(&session.played_cards, &lookup))
    }
}

fn require_participant(session: &GameSession, requester: Uuid) -> Result<(), EngineError> {
    if !session.is_participant(requester) {
        return Err(EngineError::NotAParticipant {
            session_id: session.id,
            requester,
        });
    }
    Ok(())
}

/// The single precondition guard for turn-holder operations: membership,
/// a real partner, Active status, turn ownership, expected phase.
fn authorize(
    session: &GameSession,
    requester: Uuid,
    operation: &'static str,
    phases: &[TurnPhase],
    expected: &'static str,
) -> Result<(), EngineError> {
    require_participant(session, requester)?;

    if session.participant_b.is_none() {
        return Err(EngineError::NoPartner {
            session_id: session.id,
        });
    }
    if session.status != SessionStatus::Active {
        return Err(EngineError::InvalidState {
            operation,
            expected: "an active session",
            actual: session.status.to_string(),
        });
    }
    if session.current_turn != requester {
        return Err(EngineError::NotYourTurn {
            session_id: session.id,
            requester,
        });
    }
    if !phases.contains(&session.turn_phase) {
        return Err(EngineError::InvalidState {
            operation,
            expected,
            actual: session.turn_phase.to_string(),
        });
    }
    Ok(())
}

/// Clears the table and passes the turn to the other participant.
fn hand_off(session: &mut GameSession) {
    if let Some(partner) = session.partner_of(session.current_turn) {
        session.current_turn = partner;
    }
    session.current_card_id = None;
    session.turn_phase = TurnPhase::Idle;
}

fn current_card(session: &GameSession) -> Result<Uuid, EngineError> {
    session.current_card_id.ok_or(EngineError::InvalidState {
        operation: "resolve current card",
        expected: "a card on the table",
        actual: "none".to_string(),
    })
}
