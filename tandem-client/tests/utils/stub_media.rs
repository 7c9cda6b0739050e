use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tandem_client::error::MediaError;
use tandem_client::media::{LocalTrack, MediaConstraints, MediaHandle, MediaSource, RemoteMedia};

/// Trackless capture handle; the negotiation core never inspects track
/// contents, only attaches them.
#[derive(Default)]
pub struct StubMediaHandle {
    stopped: AtomicBool,
}

impl StubMediaHandle {
    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl MediaHandle for StubMediaHandle {
    fn tracks(&self) -> Vec<LocalTrack> {
        Vec::new()
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

enum StubMediaMode {
    Grant,
    Deny,
}

pub struct StubMediaSource {
    mode: StubMediaMode,
    handle: Arc<StubMediaHandle>,
    acquisitions: AtomicUsize,
}

impl StubMediaSource {
    pub fn granting() -> Arc<Self> {
        Arc::new(Self {
            mode: StubMediaMode::Grant,
            handle: Arc::new(StubMediaHandle::default()),
            acquisitions: AtomicUsize::new(0),
        })
    }

    pub fn denying() -> Arc<Self> {
        Arc::new(Self {
            mode: StubMediaMode::Deny,
            handle: Arc::new(StubMediaHandle::default()),
            acquisitions: AtomicUsize::new(0),
        })
    }

    pub fn handle(&self) -> Arc<StubMediaHandle> {
        self.handle.clone()
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for StubMediaSource {
    async fn acquire(
        &self,
        _constraints: MediaConstraints,
    ) -> Result<Arc<dyn MediaHandle>, MediaError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            StubMediaMode::Grant => Ok(self.handle.clone()),
            StubMediaMode::Deny => Err(MediaError::PermissionDenied),
        }
    }
}

/// Stand-in for an inbound media handle.
pub struct StubRemoteMedia(pub String);

impl RemoteMedia for StubRemoteMedia {
    fn media_id(&self) -> String {
        self.0.clone()
    }
}
