//! End-to-end engine flows over the in-memory store: deck building at
//! session creation, the draw/reveal/complete/skip state machine, and the
//! failure paths both participants can hit.

use std::sync::Arc;

use engine::{
    build_deck, CollectingSink, DrawMode, EngineError, FixedSkipGate, GameConfig, GameEvent,
    NoopSink, TurnCoordinator, UnlimitedSkips,
};
use store::{GameStore, MemoryStore};
use types::{Card, Category, SessionStatus, TurnPhase};
use uuid::Uuid;

async fn seed_catalog(store: &dyn GameStore, action: usize, text: usize, photo: usize) {
    let mut cards = Vec::new();
    for i in 0..action {
        cards.push(Card::new(Category::Action, format!("action {i}")));
    }
    for i in 0..text {
        cards.push(Card::new(Category::Text, format!("text {i}")));
    }
    for i in 0..photo {
        cards.push(Card::new(Category::Photo, format!("photo {i}")));
    }
    store
        .insert_cards(&cards)
        .await
        .expect("Failed to seed catalog");
}

fn coordinator(
    store: Arc<MemoryStore>,
    config: GameConfig,
) -> (TurnCoordinator, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let coordinator =
        TurnCoordinator::new(store, Arc::new(UnlimitedSkips), sink.clone(), config);
    (coordinator, sink)
}

fn small_config() -> GameConfig {
    GameConfig {
        deck_size: 10,
        ..GameConfig::default()
    }
}

#[tokio::test]
async fn test_deck_of_ten_hits_quota() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let session = coordinator
        .create_session(Uuid::new_v4(), Some(Uuid::new_v4()))
        .await
        .expect("Failed to create session");

    let entries = store
        .deck_entries(session.id)
        .await
        .expect("Failed to fetch deck");
    assert_eq!(entries.len(), 10);

    let ids: Vec<Uuid> = entries.iter().map(|entry| entry.card_id).collect();
    let cards = store
        .cards_by_ids(&ids)
        .await
        .expect("Failed to fetch cards");
    let action = cards
        .iter()
        .filter(|card| card.category == Category::Action)
        .count();
    let text = cards
        .iter()
        .filter(|card| card.category == Category::Text)
        .count();
    let photo = cards
        .iter()
        .filter(|card| card.category == Category::Photo)
        .count();
    assert_eq!((action, text, photo), (4, 3, 3));
}

#[tokio::test]
async fn test_complete_turn_flips_ownership() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    let card = coordinator
        .draw_card(session.id, alice)
        .await
        .expect("Draw should succeed")
        .expect("Deck is not exhausted");
    coordinator
        .reveal_card(session.id, alice)
        .await
        .expect("Reveal should succeed");
    coordinator
        .complete_turn(session.id, alice, Some("done!".to_string()))
        .await
        .expect("Complete should succeed");

    let after = store
        .get_session(session.id)
        .await
        .expect("Failed to fetch session")
        .expect("Session should exist");
    assert_eq!(after.current_turn, bob);
    assert_eq!(after.turn_phase, TurnPhase::Idle);
    assert_eq!(after.current_card_id, None);
    assert_eq!(after.total_cards_played, 1);
    assert_eq!(after.played_cards, vec![card.id]);

    let entries = store
        .deck_entries(session.id)
        .await
        .expect("Failed to fetch deck");
    let entry = entries
        .iter()
        .find(|entry| entry.card_id == card.id)
        .expect("Drawn card must be a deck entry");
    assert!(entry.is_played && !entry.skipped);

    // The used card's wear counter moved.
    let used = store
        .cards_by_ids(&[card.id])
        .await
        .expect("Failed to fetch card");
    assert_eq!(used[0].usage_count, 1);

    // And the handoff is real: Bob can draw now.
    coordinator
        .draw_card(session.id, bob)
        .await
        .expect("Bob should be able to draw")
        .expect("Deck is not exhausted");
}

#[tokio::test]
async fn test_non_turn_holder_rejected() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    let err = coordinator
        .draw_card(session.id, bob)
        .await
        .expect_err("Bob is not the turn holder");
    assert!(matches!(err, EngineError::NotYourTurn { .. }));

    let after = store
        .get_session(session.id)
        .await
        .expect("Failed to fetch session")
        .expect("Session should exist");
    assert_eq!(after.current_turn, alice);
    assert_eq!(after.current_card_id, None);
    assert_eq!(after.version, 0);
}

#[tokio::test]
async fn test_out_of_phase_rejected() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(Uuid::new_v4()))
        .await
        .expect("Failed to create session");

    // Nothing on the table yet.
    let err = coordinator
        .reveal_card(session.id, alice)
        .await
        .expect_err("Reveal requires a drawn card");
    assert!(matches!(err, EngineError::InvalidState { .. }));
    let err = coordinator
        .complete_turn(session.id, alice, None)
        .await
        .expect_err("Complete requires a revealed card");
    assert!(matches!(err, EngineError::InvalidState { .. }));

    // Drawing twice in a row is equally invalid.
    coordinator
        .draw_card(session.id, alice)
        .await
        .expect("Draw should succeed");
    let err = coordinator
        .draw_card(session.id, alice)
        .await
        .expect_err("A second draw must be rejected");
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn test_skip_flips_turn_only() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    let card = coordinator
        .draw_card(session.id, alice)
        .await
        .expect("Draw should succeed")
        .expect("Deck is not exhausted");
    coordinator
        .skip_card(session.id, alice)
        .await
        .expect("Skip should succeed");

    let after = store
        .get_session(session.id)
        .await
        .expect("Failed to fetch session")
        .expect("Session should exist");
    assert_eq!(after.current_turn, bob);
    assert_eq!(after.total_cards_played, 0);
    assert_eq!(after.skipped_cards, vec![card.id]);
    assert!(after.played_cards.is_empty());

    let entries = store
        .deck_entries(session.id)
        .await
        .expect("Failed to fetch deck");
    let entry = entries
        .iter()
        .find(|entry| entry.card_id == card.id)
        .expect("Skipped card must be a deck entry");
    assert!(entry.skipped && !entry.is_played);
}

#[tokio::test]
async fn test_skip_allowance_enforced() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let sink = Arc::new(NoopSink);
    let coordinator = TurnCoordinator::new(
        store.clone(),
        Arc::new(FixedSkipGate::new(1)),
        sink,
        small_config(),
    );

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    // Alice burns her one skip; Bob still has his.
    coordinator
        .draw_card(session.id, alice)
        .await
        .expect("Draw should succeed");
    coordinator
        .skip_card(session.id, alice)
        .await
        .expect("First skip should succeed");
    coordinator
        .draw_card(session.id, bob)
        .await
        .expect("Draw should succeed");
    coordinator
        .skip_card(session.id, bob)
        .await
        .expect("Bob's first skip should succeed");

    coordinator
        .draw_card(session.id, alice)
        .await
        .expect("Draw should succeed");
    let err = coordinator
        .skip_card(session.id, alice)
        .await
        .expect_err("Alice's allowance is spent");
    assert!(matches!(err, EngineError::SkipLimitExceeded { .. }));

    // The rejected skip leaves the card on the table; she can still play it.
    coordinator
        .reveal_card(session.id, alice)
        .await
        .expect("Reveal should succeed");
    coordinator
        .complete_turn(session.id, alice, None)
        .await
        .expect("Complete should succeed");
}

#[tokio::test]
async fn test_pause_and_resume() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    coordinator
        .draw_card(session.id, alice)
        .await
        .expect("Draw should succeed");

    // A drawn-but-unrevealed card blocks pausing.
    let err = coordinator
        .toggle_pause(session.id, bob)
        .await
        .expect_err("Pausing mid-draw is invalid");
    assert!(matches!(err, EngineError::InvalidState { .. }));

    coordinator
        .reveal_card(session.id, alice)
        .await
        .expect("Reveal should succeed");
    // Either participant may pause.
    coordinator
        .toggle_pause(session.id, bob)
        .await
        .expect("Pause should succeed");

    let paused = store
        .get_session(session.id)
        .await
        .expect("Failed to fetch session")
        .expect("Session should exist");
    assert_eq!(paused.status, SessionStatus::Paused);
    assert_eq!(paused.turn_phase, TurnPhase::Revealed);

    let err = coordinator
        .complete_turn(session.id, alice, None)
        .await
        .expect_err("Paused sessions take no turns");
    assert!(matches!(err, EngineError::InvalidState { .. }));

    coordinator
        .toggle_pause(session.id, alice)
        .await
        .expect("Resume should succeed");
    coordinator
        .complete_turn(session.id, alice, None)
        .await
        .expect("The revealed card is still on the table after resume");
}

#[tokio::test]
async fn test_end_game_idempotent() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    coordinator
        .end_game(session.id, bob)
        .await
        .expect("End should succeed");
    coordinator
        .end_game(session.id, alice)
        .await
        .expect("Ending twice is a no-op");

    let after = store
        .get_session(session.id)
        .await
        .expect("Failed to fetch session")
        .expect("Session should exist");
    assert_eq!(after.status, SessionStatus::Completed);
    // Only the first end persisted anything.
    assert_eq!(after.version, 1);

    let err = coordinator
        .draw_card(session.id, alice)
        .await
        .expect_err("Completed sessions take no turns");
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn test_placeholder_session_rejected() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, None)
        .await
        .expect("Placeholder sessions can still be created");

    let err = coordinator
        .draw_card(session.id, alice)
        .await
        .expect_err("No partner, no game");
    assert!(matches!(err, EngineError::NoPartner { .. }));
}

#[tokio::test]
async fn test_deck_exhaustion() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 1, 1, 1).await;
    let config = GameConfig {
        deck_size: 2,
        ..GameConfig::default()
    };
    let (coordinator, _) = coordinator(store.clone(), config);

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    let mut turn_holder = alice;
    for _ in 0..2 {
        coordinator
            .draw_card(session.id, turn_holder)
            .await
            .expect("Draw should succeed")
            .expect("Deck is not exhausted yet");
        coordinator
            .reveal_card(session.id, turn_holder)
            .await
            .expect("Reveal should succeed");
        coordinator
            .complete_turn(session.id, turn_holder, None)
            .await
            .expect("Complete should succeed");
        turn_holder = if turn_holder == alice { bob } else { alice };
    }

    let drawn = coordinator
        .draw_card(session.id, turn_holder)
        .await
        .expect("Draw should not error on an empty deck");
    assert!(drawn.is_none());

    // Exhaustion is not a state change.
    let after = store
        .get_session(session.id)
        .await
        .expect("Failed to fetch session")
        .expect("Session should exist");
    assert_eq!(after.turn_phase, TurnPhase::Idle);
    assert_eq!(after.current_turn, turn_holder);
}

#[tokio::test]
async fn test_sequential_draw_order() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 2, 2, 2).await;
    let config = GameConfig {
        deck_size: 6,
        draw_mode: DrawMode::Sequential,
        ..GameConfig::default()
    };
    let (coordinator, _) = coordinator(store.clone(), config);

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    let entries = store
        .deck_entries(session.id)
        .await
        .expect("Failed to fetch deck");
    let dealt_order: Vec<Uuid> = entries.iter().map(|entry| entry.card_id).collect();

    let mut turn_holder = alice;
    let mut drawn_order = Vec::new();
    for _ in 0..6 {
        let card = coordinator
            .draw_card(session.id, turn_holder)
            .await
            .expect("Draw should succeed")
            .expect("Deck is not exhausted yet");
        drawn_order.push(card.id);
        coordinator
            .reveal_card(session.id, turn_holder)
            .await
            .expect("Reveal should succeed");
        coordinator
            .complete_turn(session.id, turn_holder, None)
            .await
            .expect("Complete should succeed");
        turn_holder = if turn_holder == alice { bob } else { alice };
    }

    assert_eq!(drawn_order, dealt_order);
}

#[tokio::test]
async fn test_weighted_no_three_in_a_row() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, _) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(bob))
        .await
        .expect("Failed to create session");

    let mut turn_holder = alice;
    let mut categories: Vec<Category> = Vec::new();
    loop {
        // Is more than one category still undealt?
        let entries = store
            .deck_entries(session.id)
            .await
            .expect("Failed to fetch deck");
        let undealt: Vec<Uuid> = entries
            .iter()
            .filter(|entry| entry.is_undealt())
            .map(|entry| entry.card_id)
            .collect();
        let remaining = store
            .cards_by_ids(&undealt)
            .await
            .expect("Failed to fetch cards");
        let multi_category = remaining
            .first()
            .map(|first| remaining.iter().any(|card| card.category != first.category))
            .unwrap_or(false);

        let Some(card) = coordinator
            .draw_card(session.id, turn_holder)
            .await
            .expect("Draw should succeed")
        else {
            break;
        };

        if multi_category {
            let run = categories
                .iter()
                .rev()
                .take_while(|&&category| category == card.category)
                .count();
            assert!(run < 2, "three-in-a-row of {}", card.category);
        }
        categories.push(card.category);

        coordinator
            .reveal_card(session.id, turn_holder)
            .await
            .expect("Reveal should succeed");
        coordinator
            .complete_turn(session.id, turn_holder, None)
            .await
            .expect("Complete should succeed");
        turn_holder = if turn_holder == alice { bob } else { alice };
    }

    assert_eq!(categories.len(), 10);
}

#[tokio::test]
async fn test_event_trail() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 4, 3, 3).await;
    let (coordinator, sink) = coordinator(store.clone(), small_config());

    let alice = Uuid::new_v4();
    let session = coordinator
        .create_session(alice, Some(Uuid::new_v4()))
        .await
        .expect("Failed to create session");

    let card = coordinator
        .draw_card(session.id, alice)
        .await
        .expect("Draw should succeed")
        .expect("Deck is not exhausted");
    coordinator
        .reveal_card(session.id, alice)
        .await
        .expect("Reveal should succeed");
    coordinator
        .complete_turn(session.id, alice, Some("we did the thing".to_string()))
        .await
        .expect("Complete should succeed");

    let events = sink.events();
    assert_eq!(
        events,
        vec![
            GameEvent::DeckBuilt {
                session_id: session.id,
                deck_size: 10
            },
            GameEvent::CardDrawn {
                session_id: session.id,
                card_id: card.id,
                by: alice
            },
            GameEvent::CardRevealed {
                session_id: session.id,
                card_id: card.id,
                by: alice
            },
            GameEvent::TurnCompleted {
                session_id: session.id,
                card_id: card.id,
                by: alice,
                response: Some("we did the thing".to_string())
            },
        ]
    );
}

#[tokio::test]
async fn test_failed_build_retry() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), 2, 2, 1).await;
    let session_id = Uuid::new_v4();

    let err = build_deck(store.as_ref(), &NoopSink, session_id, 10)
        .await
        .expect_err("Five cards cannot fill a deck of ten");
    assert!(matches!(err, EngineError::CatalogInsufficient { .. }));

    // Nothing was persisted by the failed attempt.
    let entries = store
        .deck_entries(session_id)
        .await
        .expect("Failed to fetch deck");
    assert!(entries.is_empty());

    build_deck(store.as_ref(), &NoopSink, session_id, 5)
        .await
        .expect("A smaller deck fits the catalog");
    let entries = store
        .deck_entries(session_id)
        .await
        .expect("Failed to fetch deck");
    assert_eq!(entries.len(), 5);
}
