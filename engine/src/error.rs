use store::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not your turn: session {session_id} is waiting on the other participant")]
    NotYourTurn { session_id: Uuid, requester: Uuid },

    #[error("Invalid state transition: {operation} requires {expected}, session is {actual}")]
    InvalidState {
        operation: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("Catalog cannot fill a deck of {requested}: only {available} active cards")]
    CatalogInsufficient { requested: u32, available: u32 },

    #[error("Skip allowance exhausted for participant {participant}")]
    SkipLimitExceeded { participant: Uuid },

    #[error("Session {session_id} changed underneath this write; refetch and retry")]
    Conflict { session_id: Uuid },

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Not a participant of session {session_id}: {requester}")]
    NotAParticipant { session_id: Uuid, requester: Uuid },

    #[error("Session {session_id} has no partner yet")]
    NoPartner { session_id: Uuid },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { session_id, .. } => EngineError::Conflict { session_id },
            other => EngineError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict_mapping() {
        let session_id = Uuid::new_v4();
        let err: EngineError = StoreError::VersionConflict {
            session_id,
            expected: 3,
        }
        .into();
        assert!(matches!(err, EngineError::Conflict { session_id: id } if id == session_id));
    }

    #[test]
    fn test_store_error_passthrough() {
        let err: EngineError = StoreError::Query("boom".to_string()).into();
        assert!(matches!(err, EngineError::Store(StoreError::Query(_))));
    }
}
