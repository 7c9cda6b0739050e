use crate::media::{LocalTrack, RemoteMedia};
use crate::transport::peer_connection::{
    ConnectionEvent, ConnectionState, PeerConnection, PeerConnector,
};
use crate::transport::transport_config::TransportConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{CandidateInit, PeerId, SdpKind, SessionDescription};
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_remote::TrackRemote;

/// Inbound track as delivered by webrtc-rs.
pub struct RemoteTrack(Arc<TrackRemote>);

impl RemoteTrack {
    pub fn track(&self) -> &Arc<TrackRemote> {
        &self.0
    }
}

impl RemoteMedia for RemoteTrack {
    fn media_id(&self) -> String {
        self.0.id()
    }
}

/// [`PeerConnector`] over webrtc-rs.
pub struct RtcPeerConnector {
    config: TransportConfig,
}

impl RtcPeerConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PeerConnector for RtcPeerConnector {
    async fn connect(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: self.config.ice_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        // Every callback re-emits over the event channel, tagged with the
        // peer id, so the session loop can drop results for destroyed
        // sessions.
        let state_tx = events.clone();
        let state_peer = peer_id.clone();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let peer = state_peer.clone();

            Box::pin(async move {
                debug!(peer = %peer, ?state, "peer connection state changed");
                let mapped = match state {
                    RTCPeerConnectionState::New | RTCPeerConnectionState::Connecting => {
                        ConnectionState::Connecting
                    }
                    RTCPeerConnectionState::Connected => ConnectionState::Connected,
                    RTCPeerConnectionState::Disconnected | RTCPeerConnectionState::Failed => {
                        ConnectionState::Failed
                    }
                    RTCPeerConnectionState::Closed => ConnectionState::Closed,
                    _ => return,
                };
                let _ = tx.send(ConnectionEvent::StateChanged(peer, mapped)).await;
            })
        }));

        // Trickle ICE: relay every discovered candidate right away. The
        // end-of-gathering `None` produces nothing.
        let ice_tx = events.clone();
        let ice_peer = peer_id.clone();
        pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let peer = ice_peer.clone();

            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let init = CandidateInit {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx.send(ConnectionEvent::LocalCandidate(peer, init)).await;
            })
        }));

        let track_tx = events;
        let track_peer = peer_id.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let peer = track_peer.clone();

            Box::pin(async move {
                debug!(peer = %peer, track = %track.id(), "remote track arrived");
                let handle = Arc::new(RemoteTrack(track));
                let _ = tx.send(ConnectionEvent::RemoteMedia(peer, handle)).await;
            })
        }));

        Ok(Arc::new(RtcConnection { pc }))
    }
}

struct RtcConnection {
    pc: Arc<RTCPeerConnection>,
}

impl RtcConnection {
    fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
        let rtc = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        Ok(rtc)
    }
}

#[async_trait]
impl PeerConnection for RtcConnection {
    async fn add_local_track(&self, track: LocalTrack) -> Result<()> {
        self.pc.add_track(track).await?;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.pc.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.pc.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc
            .set_local_description(Self::to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc
            .set_remote_description(Self::to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: CandidateInit) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.pc.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}
