use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::PeerId;

/// Opaque inbound media handle, as the display layer consumes it.
pub trait RemoteMedia: Send + Sync {
    /// Transport-level identifier of the media stream.
    fn media_id(&self) -> String;
}

pub type RemoteMediaHandle = Arc<dyn RemoteMedia>;

/// Peer-id → inbound media handle mapping for display.
///
/// Cloning is cheap and shares the underlying map, so the UI layer can hold
/// one while the session loop writes to another.
#[derive(Clone, Default)]
pub struct RemoteMediaRegistry {
    entries: Arc<DashMap<PeerId, RemoteMediaHandle>>,
}

impl RemoteMediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-or-overwrite: a peer has at most one active inbound handle, so
    /// later media for the same peer wins.
    pub fn set(&self, peer_id: PeerId, handle: RemoteMediaHandle) {
        self.entries.insert(peer_id, handle);
    }

    /// Idempotent.
    pub fn remove(&self, peer_id: &PeerId) {
        self.entries.remove(peer_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<RemoteMediaHandle> {
        self.entries.get(peer_id).map(|entry| entry.value().clone())
    }

    /// Lazy snapshot of the current entries, restartable by calling again.
    /// No ordering guarantee.
    pub fn entries(&self) -> impl Iterator<Item = (PeerId, RemoteMediaHandle)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
