use std::sync::Arc;
use std::time::Duration;

use hublink::transport::mock::{MockLink, MockTransport, WriteOutcome};
use hublink::{connect, HubError, HubEvent, HubSession, SessionConfig, StatusFlags};

fn fast_config() -> SessionConfig {
    // RUST_LOG=hublink=debug surfaces queue/pipeline tracing when a test fails.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    SessionConfig::new()
        .with_write_pacing(Duration::from_millis(1))
        .with_link_settle_delay(Duration::from_millis(1))
        .with_stop_confirm_timeout(Duration::from_millis(50))
        .with_stop_fallback_delay(Duration::from_millis(5))
}

fn caps_bytes(max_write: u16, max_program: u32, slots: Option<u8>) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&max_write.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&max_program.to_le_bytes());
    if let Some(slots) = slots {
        bytes.push(slots);
    }
    bytes
}

/// Connect against a mock hub with the given capabilities and an idle
/// (not-running) cached status.
async fn connected_session(max_write: u16, max_program: u32) -> (HubSession, Arc<MockLink>) {
    let transport = MockTransport::new();
    let link = transport.link();
    link.set_capabilities(caps_bytes(max_write, max_program, Some(4)));

    let session = connect(&transport, fast_config()).await.unwrap();
    link.emit_status(StatusFlags::empty());
    assert!(
        session
            .wait_for_status(|s| !s.program_running(), Duration::from_millis(500))
            .await,
        "idle status report should arrive"
    );
    (session, link)
}

#[tokio::test]
async fn upload_writes_the_documented_frame_sequence() {
    let (session, link) = connected_session(20, 4096).await;
    let program: Vec<u8> = (0u8..37).collect();

    session.upload_program(&program).await.unwrap();

    let writes = link.writes();
    assert_eq!(writes.len(), 6, "stop, meta(0), 3 chunks, meta(37)");
    assert_eq!(writes[0], vec![0x00]);
    assert_eq!(writes[1], vec![0x03, 0, 0, 0, 0]);

    // Chunk size 15 from max_write_size 20: offsets 0/15/30, lengths 15/15/7.
    let expected_chunks: [(u32, &[u8]); 3] = [
        (0, &program[0..15]),
        (15, &program[15..30]),
        (30, &program[30..37]),
    ];
    for (frame, (offset, payload)) in writes[2..5].iter().zip(expected_chunks) {
        let mut expected = vec![0x04];
        expected.extend_from_slice(&offset.to_le_bytes());
        expected.extend_from_slice(payload);
        assert_eq!(frame, &expected);
    }

    assert_eq!(writes[5], vec![0x03, 37, 0, 0, 0]);
}

#[tokio::test]
async fn oversize_program_fails_before_any_write() {
    let (session, link) = connected_session(20, 16).await;
    let before = link.write_count();

    let result = session.upload_program(&[0u8; 32]).await;
    match result {
        Err(HubError::ProgramTooLarge { size, max }) => {
            assert_eq!(size, 32);
            assert_eq!(max, 16);
        }
        other => panic!("expected ProgramTooLarge, got {other:?}"),
    }
    assert_eq!(link.write_count(), before, "no command may be enqueued");
}

#[tokio::test]
async fn upload_without_capabilities_uses_fallback_chunking() {
    let transport = MockTransport::new();
    let link = transport.link();
    let session = connect(&transport, fast_config()).await.unwrap();
    link.emit_status(StatusFlags::empty());
    session
        .wait_for_status(|s| !s.program_running(), Duration::from_millis(500))
        .await;

    // 150 bytes at the conservative 100-byte fallback: two chunks.
    let program = vec![0xABu8; 150];
    session.upload_program(&program).await.unwrap();

    let writes = link.writes();
    assert_eq!(writes.len(), 5);
    assert_eq!(writes[2][0], 0x04);
    assert_eq!(&writes[2][1..5], &0u32.to_le_bytes());
    assert_eq!(writes[2].len(), 5 + 100);
    assert_eq!(&writes[3][1..5], &100u32.to_le_bytes());
    assert_eq!(writes[3].len(), 5 + 50);
}

#[tokio::test]
async fn upload_proceeds_after_stop_confirmation_timeout() {
    // No status report ever arrives; the pipeline must fall back to a fixed
    // delay instead of failing.
    let transport = MockTransport::new();
    let link = transport.link();
    link.set_capabilities(caps_bytes(20, 4096, None));
    let session = connect(&transport, fast_config()).await.unwrap();

    session.upload_program(&[1, 2, 3]).await.unwrap();

    let writes = link.writes();
    assert_eq!(writes[0], vec![0x00]);
    assert_eq!(writes[1], vec![0x03, 0, 0, 0, 0]);
    assert_eq!(writes[2], vec![0x04, 0, 0, 0, 0, 1, 2, 3]);
    assert_eq!(writes[3], vec![0x03, 3, 0, 0, 0]);
}

#[tokio::test]
async fn upload_error_leaves_session_connected() {
    let (session, link) = connected_session(20, 4096).await;
    // Reject the first ram write (index 2: after stop and meta).
    link.script_writes(|index, _| {
        if index == 2 {
            WriteOutcome::Reject("radio glitch".to_string())
        } else {
            WriteOutcome::Accept
        }
    });

    let result = session.upload_program(&[0u8; 20]).await;
    assert!(matches!(result, Err(HubError::WriteFailed(_))));
    assert!(session.is_connected(), "upload errors do not kill the session");

    // The aborted upload stops after the failed chunk; retry succeeds.
    link.script_writes(|_, _| WriteOutcome::Accept);
    session.upload_program(&[0u8; 20]).await.unwrap();
}

#[tokio::test]
async fn start_falls_back_to_legacy_form_once() {
    let (session, link) = connected_session(20, 4096).await;
    // Reject the versioned two-byte start; accept the legacy one-byte form.
    link.script_writes(|_, frame| {
        if frame.len() == 2 && frame[0] == 0x01 {
            WriteOutcome::Reject("unknown command format".to_string())
        } else {
            WriteOutcome::Accept
        }
    });

    session.start_program(3).await.unwrap();

    let writes = link.writes();
    assert_eq!(writes[writes.len() - 2], vec![0x01, 3]);
    assert_eq!(writes[writes.len() - 1], vec![0x01]);
}

#[tokio::test]
async fn start_fails_after_exactly_one_legacy_retry() {
    let (session, link) = connected_session(20, 4096).await;
    let before = link.write_count();
    link.script_writes(|_, frame| {
        if frame[0] == 0x01 {
            WriteOutcome::Reject("start unsupported".to_string())
        } else {
            WriteOutcome::Accept
        }
    });

    let result = session.start_program(0).await;
    assert!(matches!(result, Err(HubError::WriteFailed(_))));
    assert_eq!(link.write_count() - before, 2, "versioned attempt plus one retry");
}

#[tokio::test]
async fn send_input_is_a_single_passthrough_write() {
    let (session, link) = connected_session(20, 4096).await;
    session.send_input("hi").await.unwrap();
    assert_eq!(link.writes().last().unwrap(), &vec![0x06, b'h', b'i']);
}

#[tokio::test]
async fn stdout_reaches_subscribers_and_app_data_does_not() {
    let (session, link) = connected_session(20, 4096).await;
    let mut events = session.subscribe();

    link.emit_notification(vec![0x02, b'n', b'o']); // app data, ignored
    link.emit_stdout("yes");

    match events.recv().await.unwrap() {
        HubEvent::Stdout(bytes) => assert_eq!(bytes, b"yes"),
        other => panic!("expected stdout to be the first delivered event, got {other:?}"),
    }
}

#[tokio::test]
async fn operations_after_disconnect_fail_fast() {
    let (session, _link) = connected_session(20, 4096).await;
    session.disconnect().await;

    assert!(matches!(
        session.upload_program(&[0u8; 4]).await,
        Err(HubError::NoSession)
    ));
    assert!(matches!(session.start_program(0).await, Err(HubError::NoSession)));
    assert!(matches!(session.stop_program().await, Err(HubError::NoSession)));
    assert!(matches!(session.send_input("x").await, Err(HubError::NoSession)));
}
