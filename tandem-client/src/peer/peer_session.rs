use crate::error::NegotiationError;
use crate::media::MediaHandle;
use crate::peer::negotiation::{NegotiationState, Role};
use crate::transport::{ConnectionState, PeerConnection};
use std::sync::Arc;
use tandem_core::{CandidateInit, PeerId, SdpKind, SessionDescription, SignalMessage, SignalPayload};
use tracing::{debug, warn};

/// One negotiated connection to one remote peer.
///
/// Exclusively owned by the room session manager, which drives every method
/// from its single event loop; the session itself never runs concurrently
/// with itself and needs no locking.
pub struct PeerSession {
    peer_id: PeerId,
    role: Role,
    state: NegotiationState,
    connection_state: ConnectionState,
    conn: Arc<dyn PeerConnection>,
    /// Candidates that arrived before any remote description. Replayed in
    /// arrival order the moment the description is set.
    pending_candidates: Vec<CandidateInit>,
    remote_description_set: bool,
}

impl PeerSession {
    pub(crate) fn new(peer_id: PeerId, role: Role, conn: Arc<dyn PeerConnection>) -> Self {
        Self {
            peer_id,
            role,
            state: NegotiationState::New,
            connection_state: ConnectionState::Connecting,
            conn,
            pending_candidates: Vec::new(),
            remote_description_set: false,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub(crate) fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection_state = state;
    }

    /// Attach every local capture track. Each session adds its own senders
    /// referencing the shared tracks.
    pub(crate) async fn attach_media(
        &mut self,
        media: &dyn MediaHandle,
    ) -> Result<(), NegotiationError> {
        for track in media.tracks() {
            if let Err(source) = self.conn.add_local_track(track).await {
                self.state = NegotiationState::Failed;
                return Err(self.step_error("add-local-track", source));
            }
        }
        Ok(())
    }

    /// Initiator opening move: generate and install the local offer.
    pub(crate) async fn start_offer(&mut self) -> Result<SignalMessage, NegotiationError> {
        let result = self.offer().await;
        if result.is_err() {
            self.state = NegotiationState::Failed;
        }
        result
    }

    /// Apply one signal payload from the remote peer, returning the reply to
    /// relay, if any.
    pub(crate) async fn handle_signal(
        &mut self,
        data: SignalPayload,
    ) -> Result<Option<SignalMessage>, NegotiationError> {
        if matches!(
            self.state,
            NegotiationState::Failed | NegotiationState::Closed
        ) {
            debug!(peer = %self.peer_id, state = ?self.state, "ignoring signal for terminal session");
            return Ok(None);
        }

        let result = match data {
            SignalPayload::Description(desc) => match desc.kind {
                SdpKind::Offer => self.handle_offer(desc).await,
                SdpKind::Answer => self.handle_answer(desc).await,
            },
            SignalPayload::Candidate(candidate) => {
                self.handle_candidate(candidate).await;
                Ok(None)
            }
        };
        if result.is_err() {
            self.state = NegotiationState::Failed;
        }
        result
    }

    /// The relay accepted our answer; the responder handshake is complete.
    pub(crate) fn answer_delivered(&mut self) {
        if self.state == NegotiationState::AnswerSent {
            self.state = NegotiationState::Stable;
            debug!(peer = %self.peer_id, "negotiation stable");
        }
    }

    /// Release the connection. Terminal and idempotent; anything arriving for
    /// a closed session afterwards is a no-op.
    pub(crate) async fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.state = NegotiationState::Closed;
        self.pending_candidates.clear();
        if let Err(error) = self.conn.close().await {
            debug!(peer = %self.peer_id, %error, "error closing peer connection");
        }
        self.connection_state = ConnectionState::Closed;
    }

    async fn offer(&mut self) -> Result<SignalMessage, NegotiationError> {
        let offer = self
            .conn
            .create_offer()
            .await
            .map_err(|source| self.step_error("create-offer", source))?;
        self.conn
            .set_local_description(offer.clone())
            .await
            .map_err(|source| self.step_error("set-local-description", source))?;
        self.state = NegotiationState::OfferSent;
        Ok(self.signal_to_peer(SignalPayload::Description(offer)))
    }

    async fn handle_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<Option<SignalMessage>, NegotiationError> {
        if self.state != NegotiationState::New {
            // Glare: both sides initiated. The side that already sent an
            // offer must not also answer; drop the colliding offer.
            warn!(peer = %self.peer_id, state = ?self.state, "dropping remote offer (glare)");
            return Ok(None);
        }
        self.state = NegotiationState::OfferReceived;
        self.apply_remote_description(offer).await?;

        let answer = self
            .conn
            .create_answer()
            .await
            .map_err(|source| self.step_error("create-answer", source))?;
        self.conn
            .set_local_description(answer.clone())
            .await
            .map_err(|source| self.step_error("set-local-description", source))?;
        self.state = NegotiationState::AnswerSent;
        Ok(Some(self.signal_to_peer(SignalPayload::Description(answer))))
    }

    async fn handle_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<Option<SignalMessage>, NegotiationError> {
        if self.state != NegotiationState::OfferSent {
            warn!(peer = %self.peer_id, state = ?self.state, "ignoring answer in unexpected state");
            return Ok(None);
        }
        self.apply_remote_description(answer).await?;
        self.state = NegotiationState::Stable;
        debug!(peer = %self.peer_id, "negotiation stable");
        Ok(None)
    }

    /// Candidates are valid any time after the remote description; earlier
    /// arrivals are buffered, never dropped.
    async fn handle_candidate(&mut self, candidate: CandidateInit) {
        if !self.remote_description_set {
            self.pending_candidates.push(candidate);
            return;
        }
        if let Err(error) = self.conn.add_remote_candidate(candidate).await {
            warn!(peer = %self.peer_id, %error, "failed to apply remote candidate");
        }
    }

    async fn apply_remote_description(
        &mut self,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.conn
            .set_remote_description(desc)
            .await
            .map_err(|source| self.step_error("set-remote-description", source))?;
        self.remote_description_set = true;

        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(error) = self.conn.add_remote_candidate(candidate).await {
                warn!(peer = %self.peer_id, %error, "failed to apply buffered candidate");
            }
        }
        Ok(())
    }

    fn signal_to_peer(&self, data: SignalPayload) -> SignalMessage {
        SignalMessage::Signal {
            to: Some(self.peer_id.clone()),
            from: None,
            data,
        }
    }

    fn step_error(&self, step: &'static str, source: anyhow::Error) -> NegotiationError {
        NegotiationError {
            peer: self.peer_id.clone(),
            step,
            source,
        }
    }
}
