//! Telegram and Discord bridges against fake upstream APIs.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};

use chat_bridge::discord::{DiscordBridge, DiscordConfig};
use chat_bridge::telegram::{TelegramBridge, TelegramConfig};
use chat_bridge::{OutboundMessage, PlayerRef, Scope};

use common::{context, eventually, next_presented, serve};

const WAIT: Duration = Duration::from_secs(5);

fn steve() -> PlayerRef {
    PlayerRef::new(uuid::Uuid::new_v4(), "Steve", "world")
}

// ── Telegram ──────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct FakeTelegram {
    polls: Arc<AtomicUsize>,
    offsets: Arc<Mutex<Vec<String>>>,
    sent: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn get_updates(State(fake): State<FakeTelegram>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    fake.offsets
        .lock()
        .unwrap()
        .push(query.get("offset").cloned().unwrap_or_default());

    if fake.polls.fetch_add(1, Ordering::SeqCst) > 0 {
        return Json(json!({ "ok": true, "result": [] }));
    }
    Json(json!({
        "ok": true,
        "result": [
            { "update_id": 5, "message": { "chat": { "id": 77 }, "from": { "is_bot": false, "username": "alice" }, "text": "five" } },
            { "update_id": 3, "message": { "chat": { "id": 77 }, "from": { "is_bot": false, "username": "old" }, "text": "three" } },
            { "update_id": 6, "message": { "chat": { "id": 77 }, "from": { "is_bot": true, "username": "relay" }, "text": "echo" } },
            { "update_id": 7, "message": { "chat": { "id": 77 }, "from": { "is_bot": false, "first_name": "Bob" }, "text": "seven" } }
        ]
    }))
}

async fn send_message(State(fake): State<FakeTelegram>, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    fake.sent.lock().unwrap().push(form);
    Json(json!({ "ok": true }))
}

async fn telegram_server(fake: FakeTelegram) -> String {
    serve(
        Router::new()
            .route("/bottest-token/getUpdates", get(get_updates))
            .route("/bottest-token/sendMessage", post(send_message))
            .with_state(fake),
    )
    .await
}

fn telegram_config(base: String) -> TelegramConfig {
    TelegramConfig {
        enabled: true,
        token: "test-token".to_string(),
        chat_id: "77".to_string(),
        poll_interval_seconds: 2,
        format_from_telegram: "[TG] {user}: {message}".to_string(),
        format_to_telegram: "[{type}] {player}: {message}".to_string(),
        api_base: base,
    }
}

#[tokio::test]
async fn test_telegram_inbound_dedup_and_cursor() {
    let fake = FakeTelegram::default();
    let base = telegram_server(fake.clone()).await;
    let (ctx, mut stage) = context();

    let bridge = TelegramBridge::start(telegram_config(base), ctx);
    assert!(bridge.is_running());

    assert_eq!(next_presented(&mut stage, WAIT).await.as_deref(), Some("[TG] @alice: five"));
    assert_eq!(next_presented(&mut stage, WAIT).await.as_deref(), Some("[TG] Bob: seven"));
    assert_eq!(bridge.cursor(), 7);

    // The next poll asks for everything after the cursor.
    let offsets = fake.offsets.clone();
    assert!(
        eventually(WAIT, || {
            let offsets = offsets.clone();
            async move { offsets.lock().unwrap().len() >= 2 }
        })
        .await
    );
    let offsets = fake.offsets.lock().unwrap().clone();
    assert_eq!(offsets[0], "1");
    assert_eq!(offsets[1], "8");

    bridge.stop();
}

#[tokio::test]
async fn test_telegram_outbound_form() {
    let fake = FakeTelegram::default();
    let base = telegram_server(fake.clone()).await;
    let (ctx, _stage) = context();

    let bridge = TelegramBridge::start(telegram_config(base), ctx);
    bridge.send_from_game(&OutboundMessage::new(steve(), "hello there", Scope::Local));

    let sent = fake.sent.clone();
    assert!(
        eventually(WAIT, || {
            let sent = sent.clone();
            async move { !sent.lock().unwrap().is_empty() }
        })
        .await
    );
    let form = fake.sent.lock().unwrap()[0].clone();
    assert_eq!(form["chat_id"], "77");
    assert_eq!(form["text"], "[L] Steve: hello there");

    bridge.stop();
}

#[tokio::test]
async fn test_telegram_failures_keep_schedule() {
    let base = serve(Router::new().route(
        "/bottest-token/getUpdates",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    ))
    .await;
    let (ctx, mut stage) = context();

    let bridge = TelegramBridge::start(telegram_config(base), ctx);
    let probe = bridge.probe().unwrap();

    assert!(
        eventually(WAIT, || {
            let probe = probe.clone();
            async move { probe.ticks() >= 2 }
        })
        .await
    );
    assert!(next_presented(&mut stage, Duration::from_millis(100)).await.is_none());
    assert_eq!(bridge.cursor(), 0);
    bridge.stop();
}

// ── Discord ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct FakeDiscord {
    auth: Arc<Mutex<Vec<String>>>,
    webhooks: Arc<Mutex<Vec<Value>>>,
}

async fn channel_messages(State(fake): State<FakeDiscord>, headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    fake.auth.lock().unwrap().push(auth);

    // Newest first, the same window on every poll.
    Json(json!([
        { "id": "1003", "content": "third", "author": { "username": "carol" } },
        { "id": "1002", "content": "beep", "author": { "username": "hook", "bot": true } },
        { "id": "1001", "content": "first", "author": { "username": "alice" } }
    ]))
}

async fn webhook(State(fake): State<FakeDiscord>, Json(body): Json<Value>) -> StatusCode {
    fake.webhooks.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
}

async fn discord_server(fake: FakeDiscord) -> String {
    serve(
        Router::new()
            .route("/api/channels/555/messages", get(channel_messages))
            .route("/webhook", post(webhook))
            .with_state(fake),
    )
    .await
}

fn discord_config(base: &str) -> DiscordConfig {
    DiscordConfig {
        enabled: true,
        webhook_url: format!("{}/webhook", base),
        bot_token: "bot-secret".to_string(),
        channel_id: "555".to_string(),
        poll_interval_seconds: 2,
        format_from_discord: "[DC] {user}: {message}".to_string(),
        format_to_discord: "{player}: {message}".to_string(),
        api_base: format!("{}/api", base),
    }
}

#[tokio::test]
async fn test_discord_window_presented_once() {
    let fake = FakeDiscord::default();
    let base = discord_server(fake.clone()).await;
    let (ctx, mut stage) = context();

    let bridge = DiscordBridge::start(discord_config(&base), ctx);
    assert!(bridge.is_polling());

    assert_eq!(next_presented(&mut stage, WAIT).await.as_deref(), Some("[DC] alice: first"));
    assert_eq!(next_presented(&mut stage, WAIT).await.as_deref(), Some("[DC] carol: third"));
    assert_eq!(bridge.cursor().as_deref(), Some("1003"));

    // The second poll returns the same window and presents nothing.
    let auth = fake.auth.clone();
    assert!(
        eventually(WAIT, || {
            let auth = auth.clone();
            async move { auth.lock().unwrap().len() >= 2 }
        })
        .await
    );
    assert!(next_presented(&mut stage, Duration::from_millis(300)).await.is_none());
    assert_eq!(fake.auth.lock().unwrap()[0], "Bot bot-secret");

    bridge.stop();
}

#[tokio::test]
async fn test_discord_webhook_without_poller() {
    let fake = FakeDiscord::default();
    let base = discord_server(fake.clone()).await;
    let (ctx, _stage) = context();

    let config = DiscordConfig {
        bot_token: String::new(),
        ..discord_config(&base)
    };
    let bridge = DiscordBridge::start(config, ctx);
    assert!(!bridge.is_polling());

    bridge.send_from_game(&OutboundMessage::new(steve(), "gg", Scope::Global));

    let hooks = fake.webhooks.clone();
    assert!(
        eventually(WAIT, || {
            let hooks = hooks.clone();
            async move { !hooks.lock().unwrap().is_empty() }
        })
        .await
    );
    assert_eq!(fake.webhooks.lock().unwrap()[0], json!({ "content": "Steve: gg" }));
    bridge.stop();
}

#[tokio::test]
async fn test_discord_stop_halts_polling() {
    let fake = FakeDiscord::default();
    let base = discord_server(fake.clone()).await;
    let (ctx, mut stage) = context();

    let bridge = DiscordBridge::start(discord_config(&base), ctx);
    assert!(next_presented(&mut stage, WAIT).await.is_some());
    bridge.stop();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let polls = fake.auth.lock().unwrap().len();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(fake.auth.lock().unwrap().len(), polls);
}
