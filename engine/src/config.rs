use serde::{Deserialize, Serialize};

/// Where the next card comes from on a draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// Run the quota-seeking selector over the remaining deck each draw.
    Weighted,
    /// Deal the pre-built deck in position order.
    Sequential,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub deck_size: u32,
    pub skip_limit: u32,
    pub draw_mode: DrawMode,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            deck_size: 60,
            skip_limit: 3,
            draw_mode: DrawMode::Weighted,
        }
    }
}

impl GameConfig {
    /// Resolution order: `DECK_SIZE` env var, then the yaml document, then
    /// defaults.
    pub fn from_env_or_yaml(yaml: Option<&str>) -> Result<Self, serde_yaml::Error> {
        let mut config = match yaml {
            Some(doc) => serde_yaml::from_str(doc)?,
            None => Self::default(),
        };

        if let Ok(size) = std::env::var("DECK_SIZE") {
            if let Ok(size) = size.parse() {
                config.deck_size = size;
            }
        }
        Ok(config)
    }
}
