//! HTTP API tests driving the axum router with `oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use shopchat_core::UserId;
use shopchat_integration_tests::{InMemoryStore, ScriptedCompletion, app_state, order, user};
use shopchat_server::routes;
use shopchat_server::services::FALLBACK_REPLY;

fn store() -> Arc<InMemoryStore> {
    Arc::new(
        InMemoryStore::new()
            .with_user(user(1, "Ada"))
            .with_user(user(2, "Grace"))
            .with_user(user(3, "Alan"))
            .with_order(UserId::new(1), order(42, "Shipped", "Denim Jacket")),
    )
}

fn app(store: &Arc<InMemoryStore>, completion: ScriptedCompletion) -> Router {
    routes::app(app_state(store, &Arc::new(completion)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("request should complete");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

fn post_chat(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

// ============================================================================
// Health & welcome
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let store = store();

    let (status, body) = send(app(&store, ScriptedCompletion::new()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));

    let (status, _) = send(app(&store, ScriptedCompletion::new()), get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);

    store.set_store_down(true).await;
    let (status, _) = send(app(&store, ScriptedCompletion::new()), get("/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_welcome() {
    let (status, body) = send(app(&store(), ScriptedCompletion::new()), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn test_chat_turn_round_trip() {
    let store = store();
    let completion = ScriptedCompletion::new()
        .reply(r#"{"tool_call": {"function_name": "get_order_details", "parameters": {"order_id": "42"}}}"#)
        .reply("Your order 42 shipped.");

    let (status, body) = send(
        app(&store, completion),
        post_chat(&json!({"user_id": 1, "message": "where is order 42?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_message"], "where is order 42?");
    assert_eq!(body["ai_response"], "Your order 42 shipped.");
    let conversation_id = body["conversation_id"].as_i64().expect("conversation id");
    assert!(body["message_id"].as_i64().is_some());

    let (status, messages) = send(
        app(&store, ScriptedCompletion::new()),
        get(&format!("/conversations/{conversation_id}/messages")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().expect("message list");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages.first().map(|m| &m["sender"]), Some(&json!("user")));
    assert_eq!(
        messages.get(1).map(|m| &m["sender"]),
        Some(&json!("assistant"))
    );
    assert_eq!(
        messages.get(1).map(|m| &m["content"]),
        Some(&json!("Your order 42 shipped."))
    );
}

#[tokio::test]
async fn test_chat_fallback_is_a_success() {
    let store = store();

    let (status, body) = send(
        app(&store, ScriptedCompletion::new().fail("overloaded")),
        post_chat(&json!({"user_id": 1, "message": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ai_response"], FALLBACK_REPLY);
}

#[tokio::test]
async fn test_chat_foreign_conversation_returns_404() {
    let store = store();

    let (status, body) = send(
        app(&store, ScriptedCompletion::new().reply("Hello Grace!")),
        post_chat(&json!({"user_id": 2, "message": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversation_id = body["conversation_id"].clone();
    let before = store.message_count().await;

    let (status, body) = send(
        app(&store, ScriptedCompletion::new().reply("should not be used")),
        post_chat(&json!({
            "user_id": 1,
            "message": "let me read this",
            "conversation_id": conversation_id,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found: conversation");
    assert_eq!(store.message_count().await, before);
}

#[tokio::test]
async fn test_chat_unknown_user_returns_404() {
    let (status, body) = send(
        app(&store(), ScriptedCompletion::new()),
        post_chat(&json!({"user_id": 999, "message": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found: user");
}

#[tokio::test]
async fn test_chat_empty_message_returns_400() {
    let (status, _) = send(
        app(&store(), ScriptedCompletion::new()),
        post_chat(&json!({"user_id": 1, "message": "  "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_storage_failure_returns_500_without_details() {
    let store = store();
    store.set_store_down(true).await;

    let (status, body) = send(
        app(&store, ScriptedCompletion::new()),
        post_chat(&json!({"user_id": 1, "message": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn test_list_users_paginates() {
    let (status, body) = send(
        app(&store(), ScriptedCompletion::new()),
        get("/users?skip=1&limit=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().expect("user list");
    assert_eq!(users.len(), 1);
    assert_eq!(users.first().map(|u| &u["id"]), Some(&json!(2)));
    assert_eq!(users.first().map(|u| &u["first_name"]), Some(&json!("Grace")));
}

#[tokio::test]
async fn test_list_users_zero_or_negative_limit_is_empty() {
    for uri in ["/users?limit=0", "/users?skip=0&limit=-5"] {
        let (status, body) = send(app(&store(), ScriptedCompletion::new()), get(uri)).await;

        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body.as_array().map(Vec::len), Some(0), "{uri}");
    }
}

#[tokio::test]
async fn test_list_users_defaults() {
    let (status, body) = send(app(&store(), ScriptedCompletion::new()), get("/users")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_list_conversations_newest_first() {
    let store = store();
    let completion = ScriptedCompletion::new().reply("One.").reply("Two.");
    let state = app_state(&store, &Arc::new(completion));

    let first = state
        .chat()
        .handle_turn(UserId::new(1), "first question", None)
        .await
        .expect("first turn");
    let second = state
        .chat()
        .handle_turn(UserId::new(1), "second question", None)
        .await
        .expect("second turn");

    let (status, body) = send(routes::app(state), get("/users/1/conversations")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .expect("conversation list")
        .iter()
        .filter_map(|c| c["id"].as_i64())
        .collect();
    assert_eq!(
        ids,
        vec![
            i64::from(second.conversation_id.as_i32()),
            i64::from(first.conversation_id.as_i32()),
        ]
    );
}

#[tokio::test]
async fn test_list_conversations_unknown_user_returns_404() {
    let (status, _) = send(
        app(&store(), ScriptedCompletion::new()),
        get("/users/999/conversations"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_messages_unknown_conversation_returns_404() {
    let (status, body) = send(
        app(&store(), ScriptedCompletion::new()),
        get("/conversations/12345/messages"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found: conversation");
}
