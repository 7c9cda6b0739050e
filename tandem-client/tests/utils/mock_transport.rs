use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tandem_client::media::LocalTrack;
use tandem_client::transport::{ConnectionEvent, PeerConnection, PeerConnector};
use tandem_core::{CandidateInit, PeerId, SessionDescription};
use tokio::sync::{Mutex, mpsc};

/// Mock connection factory: records every connection the manager opens and
/// lets tests script step failures.
#[derive(Default)]
pub struct MockConnector {
    connections: Mutex<HashMap<PeerId, Arc<MockConnection>>>,
    /// Step name that connections created from now on will fail at.
    fail_step: Mutex<Option<&'static str>>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn fail_step(&self, step: &'static str) {
        *self.fail_step.lock().await = Some(step);
    }

    pub async fn connection(&self, peer: &PeerId) -> Option<Arc<MockConnection>> {
        self.connections.lock().await.get(peer).cloned()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}

#[async_trait]
impl PeerConnector for MockConnector {
    async fn connect(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        let conn = Arc::new(MockConnection {
            peer_id: peer_id.clone(),
            events,
            fail_step: *self.fail_step.lock().await,
            ops: Mutex::new(Vec::new()),
            remote_descriptions: Mutex::new(Vec::new()),
            remote_candidates: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
        });
        self.connections.lock().await.insert(peer_id, conn.clone());
        Ok(conn)
    }
}

/// In-memory connection primitive that logs every operation in call order.
pub struct MockConnection {
    pub peer_id: PeerId,
    events: mpsc::Sender<ConnectionEvent>,
    fail_step: Option<&'static str>,
    ops: Mutex<Vec<String>>,
    remote_descriptions: Mutex<Vec<SessionDescription>>,
    remote_candidates: Mutex<Vec<CandidateInit>>,
    close_calls: AtomicUsize,
}

impl MockConnection {
    fn check(&self, step: &'static str) -> Result<()> {
        if self.fail_step == Some(step) {
            anyhow::bail!("scripted failure in {step}");
        }
        Ok(())
    }

    async fn record(&self, op: impl Into<String>) {
        self.ops.lock().await.push(op.into());
    }

    pub async fn ops(&self) -> Vec<String> {
        self.ops.lock().await.clone()
    }

    pub async fn remote_descriptions(&self) -> Vec<SessionDescription> {
        self.remote_descriptions.lock().await.clone()
    }

    /// Remote candidates in the order they were applied.
    pub async fn remote_candidates(&self) -> Vec<CandidateInit> {
        self.remote_candidates.lock().await.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Push a transport event into the session loop, as the platform
    /// callbacks would.
    pub async fn emit(&self, event: ConnectionEvent) {
        let _ = self.events.send(event).await;
    }
}

#[async_trait]
impl PeerConnection for MockConnection {
    async fn add_local_track(&self, _track: LocalTrack) -> Result<()> {
        self.check("add-local-track")?;
        self.record("add-local-track").await;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.check("create-offer")?;
        self.record("create-offer").await;
        Ok(SessionDescription::offer(format!(
            "v=0 mock-offer-for-{}",
            self.peer_id
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.check("create-answer")?;
        self.record("create-answer").await;
        Ok(SessionDescription::answer(format!(
            "v=0 mock-answer-for-{}",
            self.peer_id
        )))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.check("set-local-description")?;
        self.record(format!("set-local-description:{:?}", desc.kind))
            .await;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.check("set-remote-description")?;
        self.record(format!("set-remote-description:{:?}", desc.kind))
            .await;
        self.remote_descriptions.lock().await.push(desc);
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: CandidateInit) -> Result<()> {
        self.check("add-remote-candidate")?;
        self.record("add-remote-candidate").await;
        self.remote_candidates.lock().await.push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record("close").await;
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
