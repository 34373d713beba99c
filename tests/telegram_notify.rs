// tests/telegram_notify.rs
//
// TelegramNotifier against a local fake Bot API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use inventory_watch::{Notifier, NotifyError, TelegramCredentials, TelegramNotifier};

type Posts = Arc<Mutex<Vec<(String, Value)>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake telegram");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake telegram");
    });
    format!("http://{addr}")
}

async fn send_message(
    State(posts): State<Posts>,
    Path(bot): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    posts.lock().unwrap().push((bot.clone(), body));
    if bot.ends_with("bad") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"ok": false})),
        );
    }
    (StatusCode::OK, Json(serde_json::json!({"ok": true})))
}

fn notifier(base: &str, token: &str) -> TelegramNotifier {
    TelegramNotifier::new(TelegramCredentials {
        bot_token: token.into(),
        chat_id: "4242".into(),
    })
    .with_api_base(base)
}

#[tokio::test]
async fn send_posts_chat_id_and_text() {
    let posts: Posts = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/{bot}/sendMessage", post(send_message))
        .with_state(posts.clone());
    let base = serve(app).await;

    notifier(&base, "123:abc")
        .send("🚗 New listings: 1")
        .await
        .expect("send ok");

    let posts = posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "bot123:abc");
    assert_eq!(posts[0].1["chat_id"], "4242");
    assert_eq!(posts[0].1["text"], "🚗 New listings: 1");
}

#[tokio::test]
async fn send_to_overrides_destination() {
    let posts: Posts = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/{bot}/sendMessage", post(send_message))
        .with_state(posts.clone());
    let base = serve(app).await;

    notifier(&base, "1:x").send_to("777", "hi").await.expect("send ok");
    assert_eq!(posts.lock().unwrap()[0].1["chat_id"], "777");
}

#[tokio::test]
async fn rejected_send_is_a_status_error_without_retry() {
    let posts: Posts = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/{bot}/sendMessage", post(send_message))
        .with_state(posts.clone());
    let base = serve(app).await;

    let err = notifier(&base, "1:bad").send("x").await.unwrap_err();
    assert!(matches!(err, NotifyError::Status(401)), "got {err:?}");
    assert_eq!(posts.lock().unwrap().len(), 1, "no retry expected");
}
