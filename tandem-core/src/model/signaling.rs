use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// An SDP description as it crosses the wire: `{ "type": "offer"|"answer", "sdp": … }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Trickle ICE candidate in the browser `RTCIceCandidate` JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInit {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

/// Payload of a `signal` envelope.
///
/// A description carries a `type` tag, a candidate is a bare object without
/// one, so decoding goes by shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalPayload {
    Description(SessionDescription),
    Candidate(CandidateInit),
}

/// Envelope exchanged with the signaling relay, one JSON object per line.
///
/// `join` is the only client-originated membership message; `new-peer`,
/// `peer-left` and `existing-peers` flow relay-to-client. `signal` flows both
/// ways: the client fills `to`, the relay rewrites it to `from` on delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    Join {
        room: RoomId,
    },
    NewPeer {
        id: PeerId,
    },
    PeerLeft {
        id: PeerId,
    },
    ExistingPeers {
        ids: Vec<PeerId>,
    },
    Signal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<PeerId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<PeerId>,
        data: SignalPayload,
    },
    /// Envelope types this client does not know. Ignored for forward
    /// compatibility.
    #[serde(other)]
    Unknown,
}

impl SignalMessage {
    /// Encode as one JSON line (no trailing newline).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode one JSON line.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
