use tandem_core::{PeerId, RoomId};
use thiserror::Error;

/// Room-level failures, surfaced to the caller.
///
/// Everything not listed here is a per-peer problem: it is logged, the
/// offending session is destroyed, and the room keeps running.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("media acquisition failed: {0}")]
    MediaAcquisition(#[from] MediaError),

    /// The room already held two participants when we joined. The channel is
    /// closed and nothing is retried.
    #[error("room \"{0}\" is full")]
    RoomFull(RoomId),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The relay connection dropped. Equivalent to `leave()` plus this error.
    #[error("signaling transport closed")]
    TransportClosed,
}

/// Local capture failures. Fatal to `join`; no channel traffic is sent.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media capture permission denied")]
    PermissionDenied,

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect to signaling relay")]
    Connect(#[source] anyhow::Error),

    #[error("failed to send signal message")]
    Send(#[source] anyhow::Error),
}

/// A failed asynchronous negotiation step.
///
/// Local to one peer session: the session moves to
/// [`NegotiationState::Failed`](crate::peer::NegotiationState) and is
/// destroyed by the manager. Other sessions and the room are unaffected, and
/// the step is not retried.
#[derive(Debug, Error)]
#[error("negotiation step `{step}` failed for peer {peer}")]
pub struct NegotiationError {
    pub peer: PeerId,
    pub step: &'static str,
    #[source]
    pub source: anyhow::Error,
}
