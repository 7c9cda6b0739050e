use crate::error::ChannelError;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::SignalMessage;
use tokio::sync::mpsc;

/// Outbound half of the relay connection.
#[async_trait]
pub trait SignalChannel: Send + Sync {
    /// Send one envelope to the relay.
    async fn send(&self, msg: SignalMessage) -> Result<(), ChannelError>;

    /// Close the underlying connection. Idempotent.
    async fn close(&self);
}

/// A freshly opened duplex relay connection.
///
/// The inbound half is an mpsc receiver: the transport pushes every decoded
/// envelope into it in arrival order and drops the sender when the connection
/// dies, which the session loop observes as `TransportClosed`. Per-peer
/// ordering is the transport's guarantee; the core never reorders.
pub struct SignalLink {
    pub outbound: Arc<dyn SignalChannel>,
    pub inbound: mpsc::Receiver<SignalMessage>,
}

/// Opens the relay connection for one room session.
#[async_trait]
pub trait SignalConnector: Send + Sync {
    async fn connect(&self) -> Result<SignalLink, ChannelError>;
}
