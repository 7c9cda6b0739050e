use crate::error::MediaError;
use async_trait::async_trait;
use std::sync::Arc;
use webrtc::track::track_local::TrackLocal;

/// A local track in the form the connection primitive attaches.
pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// What the session asks the capture device for.
#[derive(Debug, Clone, Copy)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Live local capture handle.
///
/// Shared read-only across peer sessions: each session attaches its own
/// senders referencing the same tracks. Only the room session manager calls
/// `stop`, and only after every session is destroyed. `stop` is idempotent.
pub trait MediaHandle: Send + Sync {
    fn tracks(&self) -> Vec<LocalTrack>;

    fn stop(&self);
}

/// Camera/microphone capture, owned by the UI layer.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Arc<dyn MediaHandle>, MediaError>;
}
