use rand::seq::SliceRandom;
use rand::Rng;
use types::{Card, Category, PlayHistory};

/// Same-category plays in a row before the streak filter kicks in.
const STREAK_LIMIT: usize = 2;
/// Floor for quota-seeking weights, so over-represented categories stay
/// drawable.
const MIN_WEIGHT: f64 = 0.1;

/// Picks the next card from `pool` given the session's play history.
///
/// Returns `None` only when `pool` is empty, which callers read as "deck
/// exhausted". The selector never mutates anything; usage counting happens
/// at the draw site.
pub fn select_next_card<R: Rng>(
    history: &PlayHistory,
    pool: &[Card],
    rng: &mut R,
) -> Option<Card> {
    if pool.is_empty() {
        return None;
    }

    let eligible = anti_streak_filter(history, pool);
    let category = pick_category(history, &eligible, rng);

    let mut in_category: Vec<&Card> = eligible
        .iter()
        .copied()
        .filter(|card| card.category == category)
        .collect();
    if in_category.is_empty() {
        // The weighted pick can land on a category the pool no longer
        // carries; fall back to a uniform draw over everything eligible.
        let mut all = eligible;
        all.shuffle(rng);
        return all.first().map(|&card| card.clone());
    }

    in_category.shuffle(rng);
    in_category.first().map(|&card| card.clone())
}

/// Drops the streak category from the pool after two consecutive plays of
/// it. If that would leave nothing to draw, the rule is waived for this
/// draw rather than deadlocking the game.
fn anti_streak_filter<'a>(history: &PlayHistory, pool: &'a [Card]) -> Vec<&'a Card> {
    let blocked = history
        .trailing_streak()
        .filter(|&(_, run)| run >= STREAK_LIMIT)
        .map(|(category, _)| category);

    let Some(blocked) = blocked else {
        return pool.iter().collect();
    };

    let filtered: Vec<&Card> = pool
        .iter()
        .filter(|card| card.category != blocked)
        .collect();
    if filtered.is_empty() {
        log::warn!("Streak filter on {blocked} would empty the pool; waiving it for this draw");
        pool.iter().collect()
    } else {
        filtered
    }
}

/// Quota-seeking category weights, normalized to sum 1. Under-played
/// categories are boosted in proportion to how far below target they sit,
/// floored at `MIN_WEIGHT`; an empty history weighs everything equally.
fn category_weights(history: &PlayHistory) -> [(Category, f64); 3] {
    let raw = Category::ALL.map(|category| {
        let weight = if history.is_empty() {
            1.0
        } else {
            (category.target_fraction() - history.fraction(category)).max(MIN_WEIGHT)
        };
        (category, weight)
    });

    let total: f64 = raw.iter().map(|(_, weight)| weight).sum();
    raw.map(|(category, weight)| (category, weight / total))
}

/// One uniform roll against cumulative weight ranges, in the fixed
/// action/text/photo order. A pool down to a single category bypasses the
/// weighting entirely.
fn pick_category<R: Rng>(history: &PlayHistory, eligible: &[&Card], rng: &mut R) -> Category {
    let first = eligible[0].category;
    if eligible.iter().all(|card| card.category == first) {
        return first;
    }

    let roll: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (category, weight) in category_weights(history) {
        cumulative += weight;
        if roll < cumulative {
            return category;
        }
    }
    // Float rounding can leave the roll a hair past the last range.
    Category::Photo
}
