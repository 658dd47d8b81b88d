use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three response kinds a prompt card can ask for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Action,
    Text,
    Photo,
}

impl Category {
    /// Fixed order used wherever categories are iterated; also the tie
    /// order for cumulative weight ranges during selection.
    pub const ALL: [Category; 3] = [Category::Action, Category::Text, Category::Photo];

    /// Target share of a freshly built deck (the 34/33/33 split).
    pub fn target_fraction(self) -> f64 {
        match self {
            Category::Action => 0.34,
            Category::Text => 0.33,
            Category::Photo => 0.33,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Action => "action",
            Category::Text => "text",
            Category::Photo => "photo",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown card category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(Category::Action),
            "text" => Ok(Category::Text),
            "photo" => Ok(Category::Photo),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}
