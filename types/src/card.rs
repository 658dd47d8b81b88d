use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Category;

/// A prompt card from the shared catalog. Immutable except `usage_count`,
/// which grows by one every time the card is drawn in any session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub category: Category,
    pub prompt: String,
    pub usage_count: i64,
    pub is_active: bool,
}

impl Card {
    pub fn new(category: Category, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            prompt: prompt.into(),
            usage_count: 0,
            is_active: true,
        }
    }
}
