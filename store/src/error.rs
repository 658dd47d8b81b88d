use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Deck entry not found: session {session_id}, card {card_id}")]
    DeckEntryNotFound { session_id: Uuid, card_id: Uuid },

    #[error("Stale write on session {session_id}: expected version {expected}")]
    VersionConflict { session_id: Uuid, expected: i64 },

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("UUID parsing error: {0}")]
    UuidParsing(#[from] uuid::Error),
}
