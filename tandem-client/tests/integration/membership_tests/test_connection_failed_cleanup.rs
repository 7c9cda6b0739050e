use crate::integration::join_test_room;
use std::sync::Arc;
use tandem_client::transport::{ConnectionEvent, ConnectionState};
use tandem_core::{PeerId, SignalMessage};

use crate::utils::StubRemoteMedia;

/// A failed transport is a cleanup trigger: the session and its registry
/// entry are destroyed, nothing else is touched.
#[tokio::test]
async fn test_connection_failed_cleanup() {
    let room = join_test_room("r1").await;
    let mut manager = room.manager;
    let registry = manager.media_registry();
    let p1 = PeerId::from("p1");
    let p2 = PeerId::from("p2");

    for id in [&p1, &p2] {
        manager
            .handle_message(SignalMessage::NewPeer { id: id.clone() })
            .await
            .unwrap();
        manager
            .handle_connection_event(ConnectionEvent::RemoteMedia(
                id.clone(),
                Arc::new(StubRemoteMedia(format!("media-{id}"))),
            ))
            .await;
    }

    manager
        .handle_connection_event(ConnectionEvent::StateChanged(
            p1.clone(),
            ConnectionState::Failed,
        ))
        .await;

    assert_eq!(manager.live_peers(), vec![p2.clone()]);
    assert!(registry.get(&p1).is_none());
    assert!(registry.get(&p2).is_some(), "other peer is unaffected");

    let conn = room.transport.connection(&p1).await.expect("connection");
    assert_eq!(conn.close_calls(), 1);
}
