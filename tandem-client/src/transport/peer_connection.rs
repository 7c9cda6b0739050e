use crate::media::{LocalTrack, RemoteMediaHandle};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{CandidateInit, PeerId, SessionDescription};
use tokio::sync::mpsc;

/// Connection-level state as reported by the transport.
///
/// Diagnostics and cleanup triggers only; protocol decisions never consult
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Failed,
    Closed,
}

/// Events a live connection pushes back into the session loop.
///
/// Each carries the owning `PeerId` so that results arriving after the
/// session was destroyed can be matched and dropped.
pub enum ConnectionEvent {
    /// A local ICE candidate was discovered and must be relayed to the peer
    /// immediately. End of gathering produces no event.
    LocalCandidate(PeerId, CandidateInit),

    /// Inbound media arrived from the peer.
    RemoteMedia(PeerId, RemoteMediaHandle),

    StateChanged(PeerId, ConnectionState),
}

/// One negotiable connection to one remote peer.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn add_local_track(&self, track: LocalTrack) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: CandidateInit) -> Result<()>;

    /// Release the connection. Idempotent.
    async fn close(&self) -> Result<()>;
}

/// Creates one connection per remote peer, wiring its callbacks into the
/// session loop's event channel.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn PeerConnection>>;
}
