pub mod bridge;
pub mod channel;
pub mod observer;
pub mod presence;
pub mod synchronizer;

pub use bridge::EventPublisher;
pub use channel::{ChangeEvent, ChangeKind, ChannelError, InProcessChannel, PushChannel};
pub use observer::{SessionObserver, SessionView};
pub use presence::partner_connected;
pub use synchronizer::{SyncConfig, SyncHandle, Synchronizer};
