use crate::error::RoomError;
use crate::media::{MediaConstraints, MediaHandle, MediaSource, RemoteMediaRegistry};
use crate::peer::{PeerSession, Role};
use crate::room::room_command::RoomCommand;
use crate::room::room_handle::RoomHandle;
use crate::signaling::{SignalChannel, SignalConnector};
use crate::transport::{ConnectionEvent, ConnectionState, PeerConnector};
use std::collections::HashMap;
use std::sync::Arc;
use tandem_core::{PeerId, RoomId, SignalMessage, SignalPayload};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Single authority over room membership and peer-session lifecycle for the
/// local participant.
///
/// All protocol steps run on one event loop ([`run`](Self::run)), so no two
/// handlers for the same session ever execute concurrently and the session
/// map needs no locking. Applications that embed their own loop can instead
/// drive [`handle_message`](Self::handle_message) and
/// [`handle_connection_event`](Self::handle_connection_event) directly, and
/// must call [`shutdown`](Self::shutdown) when done.
pub struct RoomSessionManager {
    room: RoomId,
    channel: Arc<dyn SignalChannel>,
    inbound: mpsc::Receiver<SignalMessage>,
    conn_events_tx: mpsc::Sender<ConnectionEvent>,
    conn_events: mpsc::Receiver<ConnectionEvent>,
    command_tx: mpsc::Sender<RoomCommand>,
    commands: mpsc::Receiver<RoomCommand>,
    connector: Arc<dyn PeerConnector>,
    media: Arc<dyn MediaHandle>,
    sessions: HashMap<PeerId, PeerSession>,
    registry: RemoteMediaRegistry,
}

impl RoomSessionManager {
    /// Join `room`: acquire the local capture handle, open the relay
    /// connection and announce ourselves.
    ///
    /// Capture comes first: if the user denies it, the relay never hears
    /// from us and the caller is back in the pre-join state.
    pub async fn join(
        room: RoomId,
        media_source: Arc<dyn MediaSource>,
        signaling: Arc<dyn SignalConnector>,
        connector: Arc<dyn PeerConnector>,
    ) -> Result<Self, RoomError> {
        let media = media_source.acquire(MediaConstraints::default()).await?;

        let link = match signaling.connect().await {
            Ok(link) => link,
            Err(error) => {
                media.stop();
                return Err(error.into());
            }
        };
        let join = SignalMessage::Join { room: room.clone() };
        if let Err(error) = link.outbound.send(join).await {
            link.outbound.close().await;
            media.stop();
            return Err(error.into());
        }

        info!(room = %room, "joined room, awaiting membership");

        let (conn_events_tx, conn_events) = mpsc::channel(256);
        let (command_tx, commands) = mpsc::channel(16);

        Ok(Self {
            room,
            channel: link.outbound,
            inbound: link.inbound,
            conn_events_tx,
            conn_events,
            command_tx,
            commands,
            connector,
            media,
            sessions: HashMap::new(),
            registry: RemoteMediaRegistry::new(),
        })
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn handle(&self) -> RoomHandle {
        RoomHandle {
            commands: self.command_tx.clone(),
        }
    }

    /// Shared view of the inbound media map, for the display layer.
    pub fn media_registry(&self) -> RemoteMediaRegistry {
        self.registry.clone()
    }

    pub fn session(&self, peer_id: &PeerId) -> Option<&PeerSession> {
        self.sessions.get(peer_id)
    }

    pub fn live_peers(&self) -> Vec<PeerId> {
        self.sessions.keys().cloned().collect()
    }

    /// Drive the session until `leave()` or a room-level failure, then tear
    /// everything down. Per-peer failures never end the loop.
    pub async fn run(mut self) -> Result<(), RoomError> {
        info!(room = %self.room, "room session loop started");
        let outcome = self.event_loop().await;
        self.shutdown().await;
        match &outcome {
            Ok(()) => info!(room = %self.room, "room session ended"),
            Err(error) => warn!(room = %self.room, %error, "room session failed"),
        }
        outcome
    }

    async fn event_loop(&mut self) -> Result<(), RoomError> {
        loop {
            tokio::select! {
                msg = self.inbound.recv() => match msg {
                    Some(msg) => self.handle_message(msg).await?,
                    None => return Err(RoomError::TransportClosed),
                },

                event = self.conn_events.recv() => {
                    if let Some(event) = event {
                        self.handle_connection_event(event).await;
                    }
                },

                cmd = self.commands.recv() => match cmd {
                    Some(RoomCommand::Leave) | None => return Ok(()),
                },
            }
        }
    }

    /// Dispatch one relay envelope. The single protocol entry point.
    ///
    /// An `Err` is a room-level failure; the caller is expected to
    /// [`shutdown`](Self::shutdown) (as [`run`](Self::run) does).
    pub async fn handle_message(&mut self, msg: SignalMessage) -> Result<(), RoomError> {
        match msg {
            SignalMessage::ExistingPeers { ids } => self.on_existing_peers(ids).await,
            SignalMessage::NewPeer { id } => {
                self.on_new_peer(id).await;
                Ok(())
            }
            SignalMessage::PeerLeft { id } => {
                self.on_peer_left(&id).await;
                Ok(())
            }
            SignalMessage::Signal {
                from: Some(from),
                data,
                ..
            } => {
                self.on_signal(from, data).await;
                Ok(())
            }
            SignalMessage::Signal { from: None, .. } => {
                warn!("dropping signal without a sender");
                Ok(())
            }
            // `join` never flows relay-to-client; unknown types are ignored.
            SignalMessage::Join { .. } | SignalMessage::Unknown => Ok(()),
        }
    }

    /// Apply one event from a peer connection's callbacks. Events for
    /// already-destroyed sessions are dropped here, which is what makes
    /// `leave()`/destruction safe while negotiation steps are in flight.
    pub async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::LocalCandidate(peer_id, candidate) => {
                if !self.sessions.contains_key(&peer_id) {
                    debug!(peer = %peer_id, "discarding candidate for destroyed session");
                    return;
                }
                let msg = SignalMessage::Signal {
                    to: Some(peer_id),
                    from: None,
                    data: SignalPayload::Candidate(candidate),
                };
                self.send_signal(msg).await;
            }

            ConnectionEvent::RemoteMedia(peer_id, handle) => {
                if !self.sessions.contains_key(&peer_id) {
                    debug!(peer = %peer_id, "discarding media for destroyed session");
                    return;
                }
                self.registry.set(peer_id, handle);
            }

            ConnectionEvent::StateChanged(peer_id, state) => {
                let Some(session) = self.sessions.get_mut(&peer_id) else {
                    return;
                };
                session.set_connection_state(state);
                if state == ConnectionState::Failed {
                    warn!(peer = %peer_id, "transport failed, destroying session");
                    self.destroy_session(&peer_id).await;
                }
            }
        }
    }

    /// Destroy every session, clear the media registry, close the relay
    /// connection and release the capture handle. Idempotent.
    pub async fn shutdown(&mut self) {
        let sessions: Vec<_> = self.sessions.drain().collect();
        for (_, mut session) in sessions {
            session.close().await;
        }
        self.registry.clear();
        self.channel.close().await;
        // The capture handle is released only after every session is gone.
        self.media.stop();
    }

    async fn on_existing_peers(&mut self, ids: Vec<PeerId>) -> Result<(), RoomError> {
        if ids.len() > 1 {
            warn!(room = %self.room, members = ids.len(), "room already has two participants");
            return Err(RoomError::RoomFull(self.room.clone()));
        }
        match ids.into_iter().next() {
            // A single occupant: we learned of them through membership, so
            // we initiate.
            Some(id) => self.on_new_peer(id).await,
            None => debug!(room = %self.room, "room empty, awaiting peer"),
        }
        Ok(())
    }

    async fn on_new_peer(&mut self, id: PeerId) {
        if self.sessions.contains_key(&id) {
            debug!(peer = %id, "session already exists, ignoring membership replay");
            return;
        }
        self.create_session(id, Role::Initiator).await;
    }

    async fn on_peer_left(&mut self, id: &PeerId) {
        if !self.sessions.contains_key(id) {
            debug!(peer = %id, "peer-left for unknown peer");
            return;
        }
        info!(peer = %id, "peer left, destroying session");
        self.destroy_session(id).await;
    }

    async fn on_signal(&mut self, from: PeerId, data: SignalPayload) {
        if !self.sessions.contains_key(&from) {
            // Signals can outrun membership events; first contact through a
            // signal makes us the responder.
            debug!(peer = %from, "signal for unknown peer, creating responder session");
            if !self.create_session(from.clone(), Role::Responder).await {
                return;
            }
        }

        let result = match self.sessions.get_mut(&from) {
            Some(session) => session.handle_signal(data).await,
            None => return,
        };
        match result {
            Ok(Some(reply)) => {
                self.send_signal(reply).await;
                if let Some(session) = self.sessions.get_mut(&from) {
                    session.answer_delivered();
                }
            }
            Ok(None) => {}
            Err(error) => {
                error!(peer = %from, %error, "negotiation failed, destroying session");
                self.destroy_session(&from).await;
            }
        }
    }

    async fn create_session(&mut self, peer_id: PeerId, role: Role) -> bool {
        info!(peer = %peer_id, ?role, "creating peer session");
        let conn = match self
            .connector
            .connect(peer_id.clone(), self.conn_events_tx.clone())
            .await
        {
            Ok(conn) => conn,
            Err(error) => {
                error!(peer = %peer_id, %error, "failed to create peer connection");
                return false;
            }
        };

        let mut session = PeerSession::new(peer_id.clone(), role, conn);
        if let Err(error) = session.attach_media(self.media.as_ref()).await {
            error!(peer = %peer_id, %error, "failed to attach local media");
            session.close().await;
            return false;
        }

        let opening = if role == Role::Initiator {
            match session.start_offer().await {
                Ok(msg) => Some(msg),
                Err(error) => {
                    error!(peer = %peer_id, %error, "failed to start negotiation");
                    session.close().await;
                    return false;
                }
            }
        } else {
            None
        };

        self.sessions.insert(peer_id, session);
        if let Some(msg) = opening {
            self.send_signal(msg).await;
        }
        true
    }

    async fn destroy_session(&mut self, peer_id: &PeerId) {
        let Some(mut session) = self.sessions.remove(peer_id) else {
            return;
        };
        session.close().await;
        self.registry.remove(peer_id);
    }

    async fn send_signal(&self, msg: SignalMessage) {
        if let Err(error) = self.channel.send(msg).await {
            // An outbound failure means the link is dying; the inbound side
            // surfaces it as TransportClosed.
            warn!(%error, "failed to send signal message");
        }
    }
}
