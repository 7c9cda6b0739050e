use crate::integration::init_tracing;
use crate::utils::{MockConnector, MockSignalChannel, MockSignalConnector, StubMediaSource};
use tandem_client::error::MediaError;
use tandem_client::{RoomError, RoomSessionManager};
use tandem_core::RoomId;

/// Denied capture aborts the join before any channel traffic: the relay
/// never learns we exist.
#[tokio::test]
async fn test_media_denied_aborts_join() {
    init_tracing();

    let media = StubMediaSource::denying();
    let (signaling, _outbound) = MockSignalChannel::new();
    let (connector, _inbound) = MockSignalConnector::new(signaling.clone());

    let result = RoomSessionManager::join(
        RoomId::new("r1").unwrap(),
        media.clone(),
        connector,
        MockConnector::new(),
    )
    .await;

    assert!(matches!(
        result,
        Err(RoomError::MediaAcquisition(MediaError::PermissionDenied))
    ));
    assert_eq!(media.acquisitions(), 1, "no retry");
    assert!(
        signaling.sent().await.is_empty(),
        "no join may have been sent"
    );
}
