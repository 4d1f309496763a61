use super::*;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

// =============================================================================
// Helpers
// =============================================================================

fn small_batch() -> Vec<String> {
    vec![
        "proxy.requests.count 42 source=\"host1\" ".to_string(),
        "proxy.queue_depth.value 5 source=\"host1\" ".to_string(),
    ]
}

/// A batch large enough that a write cannot complete inside kernel buffers,
/// so writing to a peer that never reads fails deterministically.
fn oversized_batch() -> Vec<String> {
    let payload = "x".repeat(1024);
    (0..16_384).map(|i| format!("m{i} {payload}")).collect()
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("failed to bind");
    let port = listener.local_addr().expect("failed to get addr").port();
    (listener, format!("127.0.0.1:{port}"))
}

fn sender_for(addr: &str) -> ProxySender {
    let (host, port) = addr.split_once(':').expect("addr");
    ProxySender::new(
        ProxyConfig::new(host, port.parse().expect("port"))
            .with_connect_timeout(Duration::from_secs(5))
            .with_write_timeout(Duration::from_secs(30)),
    )
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn test_send_writes_newline_delimited_lines() {
    let (listener, addr) = bind().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("failed to accept");
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.expect("read");
        received
    });

    let sender = sender_for(&addr);
    let lines = small_batch();
    sender.send(&lines).await;
    sender.stop().await;

    let received = server.await.expect("server task failed");
    let expected = format!("{}\n", lines.join("\n"));
    assert_eq!(String::from_utf8(received).expect("utf8"), expected);

    let snapshot = sender.metrics().snapshot();
    assert_eq!(snapshot.batches_sent, 1);
    assert_eq!(snapshot.lines_sent, 2);
    assert_eq!(snapshot.connects, 1);
    assert_eq!(snapshot.retries, 0);
    assert_eq!(snapshot.batches_dropped, 0);
}

#[tokio::test]
async fn test_connection_reused_across_sends() {
    let (listener, addr) = bind().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("failed to accept");
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.expect("read");
        received
    });

    let sender = sender_for(&addr);
    sender.send(&["one 1".to_string()]).await;
    sender.send(&["two 2".to_string()]).await;
    sender.stop().await;

    let received = server.await.expect("server task failed");
    assert_eq!(String::from_utf8(received).expect("utf8"), "one 1\ntwo 2\n");
    assert_eq!(sender.metrics().snapshot().connects, 1);
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    // No listener: an empty batch must not even connect
    let sender = sender_for("127.0.0.1:1");
    sender.send(&[]).await;

    let snapshot = sender.metrics().snapshot();
    assert_eq!(snapshot.connects, 0);
    assert_eq!(snapshot.batches_sent, 0);
    assert_eq!(snapshot.batches_dropped, 0);
}

// =============================================================================
// Reconnect-and-retry-once
// =============================================================================

#[tokio::test]
async fn test_write_failure_retries_whole_batch_once() {
    let (listener, addr) = bind().await;
    let server = tokio::spawn(async move {
        // First connection is dropped without reading: the in-flight write fails
        let (socket, _) = listener.accept().await.expect("accept first");
        drop(socket);

        // Retry lands on a fresh connection that reads everything
        let (mut socket, _) = listener.accept().await.expect("accept second");
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.expect("read");
        received
    });

    let sender = sender_for(&addr);
    let lines = oversized_batch();
    sender.send(&lines).await;
    sender.stop().await;

    let received = server.await.expect("server task failed");
    let newlines = received.iter().filter(|b| **b == b'\n').count();
    assert_eq!(newlines, lines.len(), "retry must redeliver the whole batch");

    let snapshot = sender.metrics().snapshot();
    assert_eq!(snapshot.retries, 1);
    assert_eq!(snapshot.batches_sent, 1);
    assert_eq!(snapshot.batches_dropped, 0);
    assert_eq!(snapshot.connects, 2);
}

#[tokio::test]
async fn test_second_failure_drops_batch_and_next_cycle_recovers() {
    let (listener, addr) = bind().await;
    let server = tokio::spawn(async move {
        // Both the initial attempt and the retry hit a peer that never reads
        let (socket, _) = listener.accept().await.expect("accept first");
        drop(socket);
        let (socket, _) = listener.accept().await.expect("accept second");
        drop(socket);

        // The next cycle gets a working peer
        let (mut socket, _) = listener.accept().await.expect("accept third");
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.expect("read");
        received
    });

    let sender = sender_for(&addr);
    sender.send(&oversized_batch()).await;

    let snapshot = sender.metrics().snapshot();
    assert_eq!(snapshot.retries, 1, "exactly one retry per send call");
    assert_eq!(snapshot.batches_dropped, 1);
    assert_eq!(snapshot.batches_sent, 0);

    // A failed cycle must not poison the next one
    sender.send(&["next 1".to_string()]).await;
    sender.stop().await;

    let received = server.await.expect("server task failed");
    assert_eq!(String::from_utf8(received).expect("utf8"), "next 1\n");
    assert_eq!(sender.metrics().snapshot().batches_sent, 1);
}

#[tokio::test]
async fn test_connect_refused_drops_batch() {
    // Bind then drop to get a port with nothing listening
    let (listener, addr) = bind().await;
    drop(listener);

    let sender = sender_for(&addr);
    sender.send(&small_batch()).await;

    let snapshot = sender.metrics().snapshot();
    assert_eq!(snapshot.connects, 0);
    assert_eq!(snapshot.retries, 1);
    assert_eq!(snapshot.batches_dropped, 1);
    assert_eq!(snapshot.batches_sent, 0);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn test_stop_without_connection_is_idempotent() {
    let sender = sender_for("127.0.0.1:1");
    sender.stop().await;
    sender.stop().await;
}

#[tokio::test]
async fn test_stop_closes_live_connection() {
    let (listener, addr) = bind().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut received = Vec::new();
        // EOF only arrives if stop() actually closes the stream
        socket.read_to_end(&mut received).await.expect("read");
        received
    });

    let sender = sender_for(&addr);
    sender.send(&["m 1".to_string()]).await;
    sender.stop().await;
    sender.stop().await;

    let received = server.await.expect("server task failed");
    assert_eq!(String::from_utf8(received).expect("utf8"), "m 1\n");
}
