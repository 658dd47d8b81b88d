use types::{GameSession, SessionStatus};

/// Estimates whether the other participant is actively present, without a
/// dedicated presence protocol.
///
/// Any recorded card movement counts as presence. Before the first card
/// moves, a real (non-placeholder) partner on an active session counts
/// too: such a session can only exist because a second live client joined.
pub fn partner_connected(session: &GameSession) -> bool {
    if session.has_activity() {
        return true;
    }
    session.status == SessionStatus::Active && session.participant_b.is_some()
}
