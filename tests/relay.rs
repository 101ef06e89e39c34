//! End-to-end relay scenarios over real sockets
//!
//! Drives the server the way production traffic does: a producer pushing a
//! chunked HTTP body (reqwest) and viewers on real WebSocket connections
//! (tokio-tungstenite).

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use relay_rs::{RelayConfig, RelayHandle, RelayServer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const SECRET: &str = "supersecret";

async fn start_relay(record_dir: Option<&Path>) -> RelayHandle {
    let mut config = RelayConfig::with_secret(SECRET)
        .stream_addr("127.0.0.1:0".parse().unwrap())
        .ws_addr("127.0.0.1:0".parse().unwrap())
        .dimensions(320, 240);
    if let Some(dir) = record_dir {
        config = config.record_to(dir);
    }
    RelayServer::new(config).unwrap().start().await.unwrap()
}

async fn connect_viewer(ws_port: u16) -> WsClient {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{}/", ws_port))
        .await
        .expect("viewer connect");
    ws
}

async fn next_binary(ws: &mut WsClient) -> Bytes {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Binary(b) = msg {
            return b;
        }
    }
}

/// Expect silence on the socket for a little while
async fn assert_no_message(ws: &mut WsClient) {
    let result = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(result.is_err(), "expected no message, got {:?}", result);
}

/// Start a producer request whose body is fed chunk-by-chunk from a channel
fn spawn_producer(
    stream_port: u16,
    secret: &str,
) -> (mpsc::Sender<Bytes>, JoinHandle<reqwest::Result<reqwest::Response>>) {
    let (tx, rx) = mpsc::channel::<Bytes>(16);
    let body_stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|chunk| (Ok::<_, std::io::Error>(chunk), rx))
    });
    let url = format!("http://127.0.0.1:{}/{}/", stream_port, secret);
    let task = tokio::spawn(async move {
        reqwest::Client::new()
            .post(url)
            .body(reqwest::Body::wrap_stream(body_stream))
            .send()
            .await
    });
    (tx, task)
}

fn assert_header(header: &Bytes) {
    assert_eq!(header.len(), 8);
    assert_eq!(&header[0..4], b"jsmp");
    assert_eq!(u16::from_be_bytes([header[4], header[5]]), 320);
    assert_eq!(u16::from_be_bytes([header[6], header[7]]), 240);
}

#[tokio::test]
async fn relays_header_then_chunks_in_order_with_late_joiner() {
    let dir = tempfile::tempdir().unwrap();
    let handle = start_relay(Some(dir.path())).await;

    let mut v1 = connect_viewer(handle.ws_addr.port()).await;
    let mut v2 = connect_viewer(handle.ws_addr.port()).await;

    let h1 = next_binary(&mut v1).await;
    let h2 = next_binary(&mut v2).await;
    assert_header(&h1);
    assert_header(&h2);

    let (chunks_tx, producer) = spawn_producer(handle.stream_addr.port(), SECRET);
    chunks_tx
        .send(Bytes::from_static(&[0x01, 0x02]))
        .await
        .unwrap();

    // Both early viewers get the first chunk
    assert_eq!(next_binary(&mut v1).await, Bytes::from_static(&[0x01, 0x02]));
    assert_eq!(next_binary(&mut v2).await, Bytes::from_static(&[0x01, 0x02]));

    // A late joiner gets the header, but never the chunk broadcast before
    // it registered
    let mut v3 = connect_viewer(handle.ws_addr.port()).await;
    let h3 = next_binary(&mut v3).await;
    assert_header(&h3);

    chunks_tx.send(Bytes::from_static(&[0x03])).await.unwrap();

    assert_eq!(next_binary(&mut v1).await, Bytes::from_static(&[0x03]));
    assert_eq!(next_binary(&mut v2).await, Bytes::from_static(&[0x03]));
    assert_eq!(next_binary(&mut v3).await, Bytes::from_static(&[0x03]));

    // Producer hangs up; the session finalizes and the recording is flushed
    drop(chunks_tx);
    let response = producer.await.unwrap().unwrap();
    assert!(response.status().is_success());

    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    let entry = entries.next_entry().await.unwrap().expect("recording file");
    assert_eq!(
        entry.path().extension().and_then(|e| e.to_str()),
        Some("ts")
    );
    let content = tokio::fs::read(entry.path()).await.unwrap();
    assert_eq!(content, vec![0x01, 0x02, 0x03]);

    handle.shutdown();
}

#[tokio::test]
async fn rejects_wrong_secret_before_any_broadcast() {
    let handle = start_relay(None).await;

    let mut viewer = connect_viewer(handle.ws_addr.port()).await;
    assert_header(&next_binary(&mut viewer).await);

    let url = format!("http://127.0.0.1:{}/wrongsecret/", handle.stream_addr.port());
    let response = reqwest::Client::new()
        .post(url)
        .body("should never be relayed")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    assert!(response.bytes().await.unwrap().is_empty());

    // Nothing reached the fan-out engine
    assert_no_message(&mut viewer).await;

    handle.shutdown();
}

#[tokio::test]
async fn refuses_second_concurrent_producer_then_recovers() {
    let handle = start_relay(None).await;

    let mut viewer = connect_viewer(handle.ws_addr.port()).await;
    assert_header(&next_binary(&mut viewer).await);

    let (chunks_tx, producer) = spawn_producer(handle.stream_addr.port(), SECRET);
    chunks_tx.send(Bytes::from_static(&[0xAA])).await.unwrap();
    // Receiving the chunk proves the first session holds the producer slot
    assert_eq!(next_binary(&mut viewer).await, Bytes::from_static(&[0xAA]));

    let url = format!("http://127.0.0.1:{}/{}/", handle.stream_addr.port(), SECRET);
    let second = reqwest::Client::new()
        .post(&url)
        .body("busy")
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::CONFLICT);

    let health: serde_json::Value = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{}/health", handle.ws_addr.port()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["viewers"], 1);
    assert_eq!(health["total_sessions"], 1);

    // First producer ends; the slot frees and a new session streams again
    drop(chunks_tx);
    producer.await.unwrap().unwrap();

    let (chunks_tx, producer) = spawn_producer(handle.stream_addr.port(), SECRET);
    chunks_tx.send(Bytes::from_static(&[0xBB])).await.unwrap();
    assert_eq!(next_binary(&mut viewer).await, Bytes::from_static(&[0xBB]));

    drop(chunks_tx);
    producer.await.unwrap().unwrap();
    handle.shutdown();
}
