mod peer;
mod room;
mod signaling;

pub use peer::PeerId;
pub use room::{InvalidRoomId, RoomId};
pub use signaling::{CandidateInit, SdpKind, SessionDescription, SignalMessage, SignalPayload};
