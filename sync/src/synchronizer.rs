use std::sync::Arc;
use std::time::Duration;

use store::{retry_with_backoff, GameStore};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use types::GameSession;
use uuid::Uuid;

use crate::channel::{ChangeEvent, ChannelError, PushChannel};
use crate::observer::{SessionObserver, SessionView};
use crate::presence;

#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Cadence of the fallback poll while the push channel is down; each
    /// tick also retries the subscription.
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
        }
    }
}

/// Keeps one participant's view of a session continuously fresh: push
/// events while the channel is healthy, interval polls while it is not,
/// with both paths funneled through a single reducer.
pub struct Synchronizer {
    store: Arc<dyn GameStore>,
    channel: Arc<dyn PushChannel>,
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn GameStore>, channel: Arc<dyn PushChannel>) -> Self {
        Self::with_config(store, channel, SyncConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn GameStore>,
        channel: Arc<dyn PushChannel>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            channel,
            config,
        }
    }

    /// Starts observing a session. The subscription immediately delivers a
    /// baseline snapshot, then at least one update per observed change,
    /// until the returned handle is unsubscribed or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn observe(&self, session_id: Uuid, observer: Arc<dyn SessionObserver>) -> SyncHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_subscription(
            self.store.clone(),
            self.channel.clone(),
            self.config.clone(),
            session_id,
            observer,
            stop_rx,
        ));
        SyncHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

pub struct SyncHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Tears down the push subscription and the polling timer. Safe to
    /// call any number of times.
    pub fn unsubscribe(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Reducer state. Both delivery paths call [`SyncState::apply`], so
/// last-write-wins semantics and the partner-join edge live in one
/// function, testable without any channel or store.
struct SyncState {
    partner_connected: bool,
}

impl SyncState {
    fn new() -> Self {
        Self {
            partner_connected: false,
        }
    }

    /// Applies a snapshot: fires `on_update` for every delivery and
    /// `on_partner_join` on each false→true edge of the partner signal.
    /// The pre-baseline state counts as false, so a session that already
    /// has a connected partner joins once at baseline time.
    fn apply(&mut self, session: GameSession, observer: &dyn SessionObserver) {
        let partner_connected = presence::partner_connected(&session);
        let joined = partner_connected && !self.partner_connected;
        self.partner_connected = partner_connected;

        let view = SessionView {
            session,
            partner_connected,
        };
        observer.on_update(&view);
        if joined {
            observer.on_partner_join();
        }
    }
}

enum Step {
    Event(ChangeEvent),
    Lagged(u64),
    ChannelDown,
    Poll,
    Stop,
}

async fn run_subscription(
    store: Arc<dyn GameStore>,
    channel: Arc<dyn PushChannel>,
    config: SyncConfig,
    session_id: Uuid,
    observer: Arc<dyn SessionObserver>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut state = SyncState::new();

    let mut receiver = match channel.subscribe(session_id).await {
        Ok(receiver) => Some(receiver),
        Err(err) => {
            warn!(%session_id, error = %err, "Push subscription failed, starting on polls");
            observer.on_error(&err);
            None
        }
    };

    // Baseline snapshot before any deliveries.
    let baseline = retry_with_backoff(
        || {
            let store = store.clone();
            async move { store.get_session(session_id).await }
        },
        2,
        Duration::from_millis(50),
        Duration::from_millis(500),
    )
    .await;
    match baseline {
        Ok(Some(session)) => state.apply(session, observer.as_ref()),
        Ok(None) => debug!(%session_id, "No session row yet at subscribe time"),
        Err(err) => warn!(%session_id, error = %err, "Baseline fetch failed"),
    }

    let mut poll = tokio::time::interval(config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // interval() completes its first tick immediately, and ticks pile up
    // unobserved while the push channel is healthy; reset so the fallback
    // always waits a full period after the baseline fetch.
    poll.reset();

    loop {
        let step = match receiver.as_mut() {
            Some(rx) => next_push_step(rx, &mut stop).await,
            None => {
                tokio::select! {
                    _ = &mut stop => Step::Stop,
                    _ = poll.tick() => Step::Poll,
                }
            }
        };

        match step {
            Step::Stop => break,
            Step::Event(event) => {
                if event.session_id != session_id {
                    warn!(
                        %session_id,
                        received = %event.session_id,
                        "Change event for a different session; dropping"
                    );
                    continue;
                }
                match event.session {
                    Some(session) => state.apply(session, observer.as_ref()),
                    None => refetch_and_apply(&store, session_id, &mut state, &observer).await,
                }
            }
            Step::Lagged(count) => {
                // At-least-once still holds: a refetch covers whatever the
                // dropped events would have said.
                observer.on_error(&ChannelError::Lagged(count));
                refetch_and_apply(&store, session_id, &mut state, &observer).await;
            }
            Step::ChannelDown => {
                warn!(%session_id, "Push channel closed, falling back to polls");
                observer.on_error(&ChannelError::Closed);
                receiver = None;
                // First fallback poll one full period from now, not from
                // whenever the interval last ticked.
                poll.reset();
            }
            Step::Poll => {
                refetch_and_apply(&store, session_id, &mut state, &observer).await;
                match channel.subscribe(session_id).await {
                    Ok(rx) => {
                        debug!(%session_id, "Push channel recovered, polls stop");
                        receiver = Some(rx);
                    }
                    Err(err) => observer.on_error(&err),
                }
            }
        }
    }

    debug!(%session_id, "Subscription closed");
}

async fn next_push_step(
    rx: &mut Receiver<ChangeEvent>,
    stop: &mut oneshot::Receiver<()>,
) -> Step {
    tokio::select! {
        _ = stop => Step::Stop,
        received = rx.recv() => match received {
            Ok(event) => Step::Event(event),
            Err(RecvError::Lagged(count)) => Step::Lagged(count),
            Err(RecvError::Closed) => Step::ChannelDown,
        },
    }
}

async fn refetch_and_apply(
    store: &Arc<dyn GameStore>,
    session_id: Uuid,
    state: &mut SyncState,
    observer: &Arc<dyn SessionObserver>,
) {
    match store.get_session(session_id).await {
        Ok(Some(session)) => state.apply(session, observer.as_ref()),
        Ok(None) => debug!(%session_id, "Session row missing on refetch"),
        Err(err) => warn!(%session_id, error = %err, "Session refetch failed"),
    }
}
