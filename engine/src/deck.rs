use std::collections::HashMap;

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use store::GameStore;
use types::{Card, Category, DeckEntry};
use uuid::Uuid;

use crate::events::{EventSink, GameEvent};
use crate::EngineError;

/// Per-category target counts for a deck of `deck_size`, from the 34/33/33
/// split. Each count is the rounded share; the rounding remainder (which
/// can be negative) lands on the largest bucket.
pub fn category_targets(deck_size: u32) -> [(Category, u32); 3] {
    let mut targets = Category::ALL.map(|category| {
        let exact = deck_size as f64 * category.target_fraction();
        (category, exact.round() as i64)
    });

    let assigned: i64 = targets.iter().map(|(_, count)| count).sum();
    // Action carries the largest fraction, so it absorbs the remainder.
    targets[0].1 += deck_size as i64 - assigned;

    targets.map(|(category, count)| (category, count.max(0) as u32))
}

/// Takes up to `count` cards from `pool`, lowest `usage_count` first. Ties
/// break randomly so equally-worn cards rotate through decks evenly.
fn sample_lowest_usage<R: Rng>(pool: &mut Vec<Card>, count: usize, rng: &mut R) -> Vec<Card> {
    pool.shuffle(rng);
    // Stable sort keeps the shuffled tie order.
    pool.sort_by_key(|card| card.usage_count);
    pool.drain(..count.min(pool.len())).collect()
}

/// Round-robin deal over a freshly shuffled category order each cycle, so
/// the early deck never opens with a block of one category.
fn interleave<R: Rng>(mut groups: HashMap<Category, Vec<Card>>, rng: &mut R) -> Vec<Card> {
    for pool in groups.values_mut() {
        pool.shuffle(rng);
    }

    let mut deck = Vec::with_capacity(groups.values().map(Vec::len).sum());
    let mut order = Category::ALL;
    while groups.values().any(|pool| !pool.is_empty()) {
        order.shuffle(rng);
        for category in order {
            if let Some(card) = groups.get_mut(&category).and_then(Vec::pop) {
                deck.push(card);
            }
        }
    }
    deck
}

/// Selects and orders the cards for a new deck.
///
/// A category without enough active cards borrows the difference from
/// whichever category still has the deepest inventory; only a catalog that
/// cannot fill the deck at all fails the build.
pub fn plan_deck<R: Rng>(
    catalog: &[Card],
    deck_size: u32,
    rng: &mut R,
) -> Result<Vec<Card>, EngineError> {
    let mut by_category: HashMap<Category, Vec<Card>> = HashMap::new();
    for card in catalog.iter().filter(|card| card.is_active) {
        by_category.entry(card.category).or_default().push(card.clone());
    }

    let available: usize = by_category.values().map(Vec::len).sum();
    if available < deck_size as usize {
        return Err(EngineError::CatalogInsufficient {
            requested: deck_size,
            available: available as u32,
        });
    }

    let mut picked: HashMap<Category, Vec<Card>> = HashMap::new();
    let mut shortfall = 0;
    for (category, target) in category_targets(deck_size) {
        let pool = by_category.entry(category).or_default();
        let take = sample_lowest_usage(pool, target as usize, rng);
        shortfall += target as usize - take.len();
        picked.insert(category, take);
    }

    while shortfall > 0 {
        let donor = Category::ALL
            .into_iter()
            .filter(|category| by_category.get(category).is_some_and(|pool| !pool.is_empty()))
            .max_by_key(|category| by_category[category].len());
        let Some(donor) = donor else {
            break;
        };

        let donated = sample_lowest_usage(by_category.entry(donor).or_default(), 1, rng);
        picked.entry(donor).or_default().extend(donated);
        shortfall -= 1;
    }

    Ok(interleave(picked, rng))
}

/// Builds and persists the deck for a session: quota-balanced sample,
/// interleaved order, one atomic insert. Fails without writing anything
/// when the catalog cannot fill the request; callers may retry with a
/// smaller size.
pub async fn build_deck(
    store: &dyn GameStore,
    events: &dyn EventSink,
    session_id: Uuid,
    deck_size: u32,
) -> Result<(), EngineError> {
    let catalog = store.active_cards().await?;
    let cards = plan_deck(&catalog, deck_size, &mut rand::thread_rng())?;

    let entries: Vec<DeckEntry> = cards
        .iter()
        .enumerate()
        .map(|(position, card)| DeckEntry::new(session_id, card.id, position as u32))
        .collect();
    store.insert_deck(&entries).await?;

    log::info!("Built a {} card deck for session {session_id}", entries.len());
    log::debug!(
        "Deck category counts: {:?}",
        cards.iter().map(|card| card.category).counts()
    );
    events.on_event(&GameEvent::DeckBuilt {
        session_id,
        deck_size: entries.len() as u32,
    });
    Ok(())
}
