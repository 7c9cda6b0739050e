pub mod model;

pub use model::{
    CandidateInit, PeerId, RoomId, SdpKind, SessionDescription, SignalMessage, SignalPayload,
};
