pub mod card;
pub mod category;
pub mod deck;
pub mod history;
pub mod session;

pub use card::Card;
pub use category::{Category, ParseCategoryError};
pub use deck::DeckEntry;
pub use history::PlayHistory;
pub use session::{GameSession, ParsePhaseError, ParseStatusError, SessionStatus, TurnPhase};
