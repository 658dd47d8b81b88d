use types::GameSession;

use crate::ChannelError;

/// Snapshot handed to observers: the session plus the derived partner
/// signal.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionView {
    pub session: GameSession,
    pub partner_connected: bool,
}

/// Callbacks for one participant's live view of a session.
///
/// Updates are last-write-wins snapshots, not deltas; no ordering is
/// guaranteed between overlapping push and poll deliveries.
pub trait SessionObserver: Send + Sync {
    fn on_update(&self, view: &SessionView);

    /// Fired once per false→true transition of the partner signal.
    fn on_partner_join(&self) {}

    /// Channel trouble; the synchronizer is already falling back to polls.
    fn on_error(&self, _error: &ChannelError) {}
}
