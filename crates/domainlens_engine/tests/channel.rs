use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use domainlens_engine::{ChannelConfig, DuplexChannel, EngineEvent};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const RECONNECT_DELAY: Duration = Duration::from_millis(100);

fn test_config() -> ChannelConfig {
    ChannelConfig {
        reconnect_delay: RECONNECT_DELAY,
        connect_timeout: Duration::from_secs(2),
    }
}

fn envelope_json(id: &str, content: &str) -> String {
    serde_json::json!({
        "message_id": id,
        "session_id": "sess_test",
        "message_type": "system",
        "content": content,
        "timestamp": "2026-08-23T10:00:00Z",
        "metadata": null
    })
    .to_string()
}

async fn bind_server() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    (listener, addr)
}

fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{addr}/ws/sess_test")
}

fn expect_channel_up(events: &mpsc::Receiver<EngineEvent>) {
    match events.recv_timeout(RECV_TIMEOUT).expect("event in time") {
        EngineEvent::ChannelUp => {}
        other => panic!("expected channel up, got {other:?}"),
    }
}

fn expect_channel_down(events: &mpsc::Receiver<EngineEvent>) {
    match events.recv_timeout(RECV_TIMEOUT).expect("event in time") {
        EngineEvent::ChannelDown => {}
        other => panic!("expected channel down, got {other:?}"),
    }
}

fn expect_envelope(events: &mpsc::Receiver<EngineEvent>) -> String {
    match events.recv_timeout(RECV_TIMEOUT).expect("event in time") {
        EngineEvent::EnvelopeReceived(envelope) => envelope.content,
        other => panic!("expected envelope, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn envelopes_are_delivered_in_order() {
    let (listener, addr) = bind_server().await;
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(socket).await.expect("handshake");
        ws.send(Message::Text(envelope_json("m1", "first").into()))
            .await
            .expect("send");
        ws.send(Message::Text(envelope_json("m2", "second").into()))
            .await
            .expect("send");
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let (event_tx, events) = mpsc::channel();
    let channel = DuplexChannel::connect(
        &tokio::runtime::Handle::current(),
        ws_url(addr),
        test_config(),
        event_tx,
    );

    expect_channel_up(&events);
    assert_eq!(expect_envelope(&events), "first");
    assert_eq!(expect_envelope(&events), "second");
    channel.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_lost_connection_is_reestablished_after_the_delay() {
    let (listener, addr) = bind_server().await;
    tokio::spawn(async move {
        // First connection delivers one envelope, then drops.
        let (socket, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(socket).await.expect("handshake");
        ws.send(Message::Text(envelope_json("m1", "before drop").into()))
            .await
            .expect("send");
        drop(ws);
        // The client comes back on its own.
        let (socket, _) = listener.accept().await.expect("second accept");
        let mut ws = tokio_tungstenite::accept_async(socket).await.expect("handshake");
        ws.send(Message::Text(envelope_json("m2", "after reconnect").into()))
            .await
            .expect("send");
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let (event_tx, events) = mpsc::channel();
    let channel = DuplexChannel::connect(
        &tokio::runtime::Handle::current(),
        ws_url(addr),
        test_config(),
        event_tx,
    );

    expect_channel_up(&events);
    assert_eq!(expect_envelope(&events), "before drop");
    expect_channel_down(&events);
    let lost_at = Instant::now();

    expect_channel_up(&events);
    assert!(
        lost_at.elapsed() >= RECONNECT_DELAY,
        "reconnect happened before the delay elapsed"
    );
    assert_eq!(expect_envelope(&events), "after reconnect");
    channel.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_frames_are_dropped_without_closing_the_channel() {
    let (listener, addr) = bind_server().await;
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(socket).await.expect("handshake");
        ws.send(Message::Text("{this is not an envelope".into()))
            .await
            .expect("send");
        ws.send(Message::Text(envelope_json("m1", "still alive").into()))
            .await
            .expect("send");
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let (event_tx, events) = mpsc::channel();
    let channel = DuplexChannel::connect(
        &tokio::runtime::Handle::current(),
        ws_url(addr),
        test_config(),
        event_tx,
    );

    expect_channel_up(&events);
    // The malformed frame produced no event; the next valid one arrives.
    assert_eq!(expect_envelope(&events), "still alive");
    channel.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_suppresses_reconnects_and_disconnect_events() {
    let (listener, addr) = bind_server().await;
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept");
        let ws = tokio_tungstenite::accept_async(socket).await.expect("handshake");
        // Hold the connection open until the client tears down.
        tokio::time::sleep(Duration::from_secs(3)).await;
        drop(ws);
    });

    let (event_tx, events) = mpsc::channel();
    let channel = DuplexChannel::connect(
        &tokio::runtime::Handle::current(),
        ws_url(addr),
        test_config(),
        event_tx,
    );

    expect_channel_up(&events);
    channel.shutdown();

    tokio::time::sleep(RECONNECT_DELAY * 3).await;
    assert!(
        events.try_recv().is_err(),
        "teardown must not surface as a disconnect or reconnect"
    );
}
