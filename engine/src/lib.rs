pub mod config;
pub mod deck;
pub mod error;
pub mod events;
pub mod selector;
pub mod skip;
pub mod turns;

pub use config::{DrawMode, GameConfig};
pub use deck::{build_deck, category_targets, plan_deck};
pub use error::EngineError;
pub use events::{CollectingSink, EventSink, GameEvent, NoopSink};
pub use selector::select_next_card;
pub use skip::{FixedSkipGate, SkipGate, UnlimitedSkips};
pub use turns::TurnCoordinator;
