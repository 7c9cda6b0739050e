//! Client-side signaling core for two-party room sessions.
//!
//! [`room::RoomSessionManager`] owns room membership and the per-peer
//! negotiation sessions; everything that touches the outside world (capture,
//! the relay connection, the platform peer-connection primitive) sits behind
//! the trait seams in [`media`], [`signaling`] and [`transport`].

pub mod error;
pub mod media;
pub mod peer;
pub mod room;
pub mod signaling;
pub mod transport;

pub use error::{ChannelError, MediaError, NegotiationError, RoomError};
pub use media::{MediaConstraints, MediaHandle, MediaSource, RemoteMediaRegistry};
pub use peer::{NegotiationState, PeerSession, Role};
pub use room::{RoomHandle, RoomSessionManager};
