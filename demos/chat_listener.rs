//! Chat and order listener.
//!
//! Demonstrates:
//! - Building a Dispatcher from `REALTIME_*` environment variables
//! - Reading the bearer token from a JSON session file
//! - Typed subscriptions for chat and order updates
//! - Lifecycle callbacks and clean shutdown on Ctrl-C
//!
//! Usage:
//!   REALTIME_WS_URL=ws://127.0.0.1:8080/ws cargo run --example chat_listener -- ./session.json
//!   RUST_LOG=campus_realtime=debug cargo run --example chat_listener -- ./session.json

// ============================================================================
// Imports
// ============================================================================

use campus_realtime::{
    Dispatcher, FileTokenStore, MessageType, ParsedMessage, Result, handler,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_SESSION_FILE: &str = "./session.json";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== Chat Listener ===\n");

    let session = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());
    let tokens = FileTokenStore::new(&session);

    if tokens.load()?.is_none() {
        println!("[!] No token in {session}; write {{\"token\": \"...\"}} there first");
    }

    // ========================================================================
    // Dispatcher
    // ========================================================================

    let dispatcher = Dispatcher::from_env(tokens)?;
    println!("[1] Server: {}", dispatcher.transport().config().base_url);

    dispatcher.on_open(|| println!("    ✓ Connected"));
    dispatcher.on_close(|info| println!("    ✗ Closed ({:?}) {}", info.code, info.reason));
    dispatcher.on_reconnect(|attempt| println!("    … Reconnect attempt {attempt}"));
    dispatcher.on_error(|err| {
        let hint = if err.is_recoverable() { "transient" } else { "needs attention" };
        println!("    ! {err} ({hint})");
    });

    // ========================================================================
    // Subscriptions
    // ========================================================================

    dispatcher.subscribe(
        MessageType::Chat,
        handler(|frame| match frame.parse() {
            ParsedMessage::Chat(chat) => {
                println!("[chat:{}] {}: {}", chat.conversation_id, chat.sender_id, chat.content);
            }
            other => println!("[chat] unreadable payload: {other:?}"),
        }),
    );

    dispatcher.subscribe(
        MessageType::OrderUpdate,
        handler(|frame| {
            if let ParsedMessage::OrderUpdate(update) = frame.parse() {
                println!("[order:{}] -> {}", update.order_id, update.status);
            }
        }),
    );

    println!("[2] Listening, Ctrl-C to quit\n");
    dispatcher.connect();

    tokio::signal::ctrl_c().await?;

    dispatcher.disconnect();
    println!("\n[3] Done");
    Ok(())
}
