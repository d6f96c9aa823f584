//! End-to-end pub/sub through a live socket.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use campus_realtime::{
    Dispatcher, FileTokenStore, Frame, MemoryTokenStore, MessageType, ParsedMessage, handler,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::time::sleep;

use common::{TestServer, config, init_tracing, wait_until};

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn subscribers_receive_frames_of_their_type_only() -> anyhow::Result<()> {
    init_tracing();
    let server = TestServer::start().await?;
    let dispatcher = Dispatcher::new(config(&server.url()), MemoryTokenStore::with_token("t"));

    let orders: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&orders);
    dispatcher.subscribe(
        MessageType::OrderUpdate,
        handler(move |frame| {
            if let ParsedMessage::OrderUpdate(update) = frame.parse() {
                sink.lock().push(format!("{}:{}", update.order_id, update.status));
            }
        }),
    );

    let chats = Arc::new(AtomicUsize::new(0));
    let chat_count = Arc::clone(&chats);
    dispatcher.subscribe(
        MessageType::Chat,
        handler(move |_| {
            chat_count.fetch_add(1, Ordering::SeqCst);
        }),
    );

    dispatcher.connect();
    assert!(wait_until(WAIT, || dispatcher.is_connected()).await);

    server.push(r#"{"type":"heartbeat","data":{"timestamp":1}}"#);
    server.push(r#"{"type":"notification","data":{"title":"nobody listens"}}"#);
    server.push(r#"{"type":"order_update","data":{"orderId":42,"status":"shipped"}}"#);
    server.push(r#"{"type":"chat","data":{"conversationId":"c","senderId":"u","content":"hi"}}"#);

    assert!(wait_until(WAIT, || chats.load(Ordering::SeqCst) == 1).await);
    assert_eq!(*orders.lock(), vec!["42:shipped".to_string()]);

    dispatcher.disconnect();
    Ok(())
}

#[tokio::test]
async fn panicking_subscriber_does_not_block_siblings() -> anyhow::Result<()> {
    init_tracing();
    let server = TestServer::start().await?;
    let dispatcher = Dispatcher::new(config(&server.url()), MemoryTokenStore::with_token("t"));

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    dispatcher.subscribe("notification", handler(|_| panic!("subscriber bug")));
    dispatcher.subscribe(
        "notification",
        handler(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    dispatcher.connect();
    assert!(wait_until(WAIT, || dispatcher.is_connected()).await);

    server.push(r#"{"type":"notification","data":{"title":"one"}}"#);
    server.push(r#"{"type":"notification","data":{"title":"two"}}"#);

    assert!(wait_until(WAIT, || delivered.load(Ordering::SeqCst) == 2).await);
    assert!(dispatcher.is_connected());

    dispatcher.disconnect();
    Ok(())
}

#[tokio::test]
async fn unsubscribed_handler_stops_receiving() -> anyhow::Result<()> {
    init_tracing();
    let server = TestServer::start().await?;
    let dispatcher = Dispatcher::new(config(&server.url()), MemoryTokenStore::with_token("t"));

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let listener = handler(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(dispatcher.subscribe("user_online", Arc::clone(&listener)));
    assert!(!dispatcher.subscribe("user_online", Arc::clone(&listener)));

    dispatcher.connect();
    assert!(wait_until(WAIT, || dispatcher.is_connected()).await);

    server.push(r#"{"type":"user_online","data":{"userId":"u1"}}"#);
    assert!(wait_until(WAIT, || seen.load(Ordering::SeqCst) == 1).await);

    assert!(dispatcher.unsubscribe("user_online", &listener));
    assert_eq!(dispatcher.subscriber_count("user_online"), 0);

    server.push(r#"{"type":"user_online","data":{"userId":"u2"}}"#);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    dispatcher.disconnect();
    Ok(())
}

#[tokio::test]
async fn send_message_reaches_server_with_timestamp() -> anyhow::Result<()> {
    init_tracing();
    let server = TestServer::start().await?;
    let dispatcher = Dispatcher::new(config(&server.url()), MemoryTokenStore::with_token("t"));

    dispatcher.send_message(MessageType::Chat, json!({ "content": "queued" }));

    dispatcher.connect();
    assert!(wait_until(WAIT, || dispatcher.is_connected()).await);
    dispatcher.send(Frame::new("chat", json!({ "content": "live" })).with_id("m-2"));

    assert!(wait_until(WAIT, || server.received_of("chat").len() == 2).await);
    let chats = server.received_of("chat");
    assert_eq!(chats[0]["data"]["content"], "queued");
    assert_eq!(chats[1]["data"]["content"], "live");
    assert_eq!(chats[1]["id"], "m-2");
    assert!(chats.iter().all(|f| f["timestamp"].as_u64().is_some()));

    dispatcher.disconnect();
    Ok(())
}

#[tokio::test]
async fn auto_connect_reads_token_from_file() -> anyhow::Result<()> {
    init_tracing();
    let server = TestServer::start().await?;
    let dir = tempfile::tempdir()?;
    let tokens = FileTokenStore::new(dir.path().join("session.json"));
    tokens.store("from-disk")?;

    let mut config = config(&server.url());
    config.auto_connect = true;
    let dispatcher = Dispatcher::new(config, tokens);

    assert!(wait_until(WAIT, || dispatcher.is_connected()).await);
    assert_eq!(server.uris(), vec!["/ws?token=from-disk".to_string()]);

    dispatcher.disconnect();
    Ok(())
}
