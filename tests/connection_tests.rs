use std::time::Duration;

use hublink::transport::mock::MockTransport;
use hublink::{connect, HubError, HubEvent, RevisionDependent, SessionConfig};

fn fast_config() -> SessionConfig {
    SessionConfig::new()
        .with_write_pacing(Duration::from_millis(1))
        .with_link_settle_delay(Duration::from_millis(1))
        .with_stop_confirm_timeout(Duration::from_millis(50))
        .with_stop_fallback_delay(Duration::from_millis(5))
}

fn caps_bytes(max_write: u16, flags: u32, max_program: u32, slots: Option<u8>) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&max_write.to_le_bytes());
    bytes.extend_from_slice(&flags.to_le_bytes());
    bytes.extend_from_slice(&max_program.to_le_bytes());
    if let Some(slots) = slots {
        bytes.push(slots);
    }
    bytes
}

#[tokio::test]
async fn unsupported_transport_is_rejected() {
    let transport = MockTransport::new().with_unsupported();
    let result = connect(&transport, fast_config()).await;
    assert!(matches!(result, Err(HubError::Unsupported)));
}

#[tokio::test]
async fn powered_off_transport_is_rejected() {
    let transport = MockTransport::new().with_unavailable();
    let result = connect(&transport, fast_config()).await;
    assert!(matches!(result, Err(HubError::Unavailable)));
}

#[tokio::test]
async fn cancelled_selection_is_a_quiet_outcome() {
    let transport = MockTransport::new().with_cancelled_selection();
    let result = connect(&transport, fast_config()).await;
    assert!(matches!(result, Err(HubError::Cancelled)));
}

#[tokio::test]
async fn failed_link_surfaces_link_error() {
    let transport = MockTransport::new().with_failing_link();
    let result = connect(&transport, fast_config()).await;
    assert!(matches!(result, Err(HubError::Link(_))));
}

#[tokio::test]
async fn missing_service_names_the_device() {
    let transport = MockTransport::new();
    let link = transport.link();
    link.remove_service();

    let result = connect(&transport, fast_config()).await;
    match result {
        Err(HubError::IncompatibleDevice { device }) => assert_eq!(device, "mock-hub"),
        other => panic!("expected IncompatibleDevice, got {other:?}"),
    }
    // Connection-phase errors must clean up the partially-opened link.
    assert!(link.is_closed());
}

#[tokio::test]
async fn refused_notifications_degrade_without_aborting() {
    let transport = MockTransport::new();
    transport.link().refuse_subscription();

    let session = connect(&transport, fast_config()).await.unwrap();
    assert!(session.is_connected());
    assert!(session.status().is_none());
    // Commands still work; the session is merely blind.
    session.stop_program().await.unwrap();
    assert_eq!(transport.link().writes(), vec![vec![0x00]]);
}

#[tokio::test]
async fn missing_capabilities_fall_back_to_conservative_chunking() {
    let transport = MockTransport::new();
    let session = connect(&transport, fast_config()).await.unwrap();
    assert_eq!(session.capabilities().chunk_size(), 100);
    assert!(!session.capabilities().max_write_size.is_reported());
}

#[tokio::test]
async fn capability_snapshot_is_read_once_at_connect() {
    let transport = MockTransport::new();
    transport
        .link()
        .set_capabilities(caps_bytes(20, 0, 4096, Some(4)));

    let session = connect(&transport, fast_config()).await.unwrap();
    let caps = session.capabilities();
    assert_eq!(caps.max_write_size, RevisionDependent::Reported(20));
    assert_eq!(caps.max_user_program_size, RevisionDependent::Reported(4096));
    assert_eq!(caps.num_slots, RevisionDependent::Reported(4));
    assert_eq!(caps.chunk_size(), 15);
    assert_eq!(session.device_name(), "mock-hub");
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let transport = MockTransport::new();
    let session = connect(&transport, fast_config()).await.unwrap();

    session.disconnect().await;
    assert!(!session.is_connected());
    // A second disconnect of the same dead session is a no-op, not an error.
    session.disconnect().await;

    let result = session.stop_program().await;
    assert!(matches!(result, Err(HubError::NoSession)));
}

#[tokio::test]
async fn transport_disconnect_invalidates_the_session() {
    let transport = MockTransport::new();
    let session = connect(&transport, fast_config()).await.unwrap();
    let mut events = session.subscribe();

    transport.link().emit_disconnect();

    loop {
        match events.recv().await.unwrap() {
            HubEvent::Disconnected => break,
            _ => continue,
        }
    }
    assert!(!session.is_connected());
    assert!(session.status().is_none());
    assert!(matches!(
        session.send_input("x").await,
        Err(HubError::NoSession)
    ));
}

#[tokio::test]
async fn sessions_are_owned_values_not_globals() {
    // Two independent sessions in one process; nothing is shared between them.
    let first_transport = MockTransport::new();
    let second_transport = MockTransport::new();
    let first = connect(&first_transport, fast_config()).await.unwrap();
    let second = connect(&second_transport, fast_config()).await.unwrap();

    first.disconnect().await;
    assert!(!first.is_connected());
    assert!(second.is_connected());
    second.stop_program().await.unwrap();
}
