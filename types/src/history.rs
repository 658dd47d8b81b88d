use std::collections::HashMap;

use uuid::Uuid;

use crate::Category;

/// Ordered play history resolved to categories.
///
/// Built once per selection call by joining `GameSession::played_cards`
/// against a card lookup, so selection logic never rescans raw id lists.
/// Never cached beyond a single selection.
#[derive(Clone, Debug, Default)]
pub struct PlayHistory {
    entries: Vec<(Uuid, Category)>,
}

impl PlayHistory {
    pub fn resolve(played: &[Uuid], categories: &HashMap<Uuid, Category>) -> Self {
        let entries = played
            .iter()
            .filter_map(|id| categories.get(id).map(|&cat| (*id, cat)))
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: Vec<(Uuid, Category)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Uuid, Category)] {
        &self.entries
    }

    /// Category of the trailing run of plays, with the run's length.
    pub fn trailing_streak(&self) -> Option<(Category, usize)> {
        let (_, last) = *self.entries.last()?;
        let run = self
            .entries
            .iter()
            .rev()
            .take_while(|(_, cat)| *cat == last)
            .count();
        Some((last, run))
    }

    pub fn count(&self, category: Category) -> usize {
        self.entries.iter().filter(|(_, c)| *c == category).count()
    }

    /// Share of plays so far in `category`; 0.0 on an empty history.
    pub fn fraction(&self, category: Category) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.count(category) as f64 / self.entries.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(categories: &[Category]) -> PlayHistory {
        PlayHistory::from_entries(
            categories
                .iter()
                .map(|&cat| (Uuid::new_v4(), cat))
                .collect(),
        )
    }

    #[test]
    fn test_trailing_streak_counts_last_run() {
        let history = history_of(&[Category::Photo, Category::Action, Category::Action]);
        assert_eq!(history.trailing_streak(), Some((Category::Action, 2)));

        let broken = history_of(&[Category::Action, Category::Action, Category::Text]);
        assert_eq!(broken.trailing_streak(), Some((Category::Text, 1)));

        assert_eq!(PlayHistory::default().trailing_streak(), None);
    }

    #[test]
    fn test_category_fractions() {
        let history = history_of(&[
            Category::Action,
            Category::Action,
            Category::Text,
            Category::Photo,
        ]);
        assert_eq!(history.fraction(Category::Action), 0.5);
        assert_eq!(history.fraction(Category::Text), 0.25);
        assert_eq!(history.fraction(Category::Photo), 0.25);
    }

    #[test]
    fn test_resolve_drops_unknown_ids() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let categories = HashMap::from([(known, Category::Text)]);

        let history = PlayHistory::resolve(&[known, unknown], &categories);
        assert_eq!(history.entries(), &[(known, Category::Text)]);
    }
}
