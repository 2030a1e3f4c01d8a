use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use policy_chat::application::ports::{ChatBackend, ChatBackendError};
use policy_chat::domain::{ChatId, Message, MessageMetadata, MessageRole, ThreadId};
use policy_chat::infrastructure::http::HttpChatBackend;

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn healthy_router() -> Router {
    Router::new()
        .route(
            "/chat",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "reply": format!("{} @ {}", body["message"].as_str().unwrap_or(""), body["thread_id"].as_str().unwrap_or("")),
                    "context_used": true,
                    "tool_calls": ["search_policies"]
                }))
            }),
        )
        .route(
            "/chat/{thread_id}",
            delete(|Path(thread_id): Path<String>| async move {
                if thread_id == "missing" {
                    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"})))
                } else {
                    (
                        StatusCode::OK,
                        Json(json!({"status": "deleted", "thread_id": thread_id})),
                    )
                }
            }),
        )
}

const STORED_CHAT_ID: &str = "5b2f4c1e-8a3d-4f7b-9c2e-1d6a0b3e7f90";
const STORED_MESSAGE_ID: &str = "0e9d8c7b-6a5f-4e3d-8c2b-1a0f9e8d7c6b";

fn history_router(chat_id: &'static str) -> Router {
    Router::new()
        .route(
            "/api/chats",
            get(move || async move {
                Json(json!([{
                    "id": chat_id,
                    "title": "Parking",
                    "created_at": "2026-10-01T09:00:00Z",
                    "updated_at": "2026-10-01T09:05:00Z",
                    "messages": [{
                        "id": STORED_MESSAGE_ID,
                        "role": "assistant",
                        "content": "Lot B.",
                        "metadata": {"response_time_ms": 420, "error_occurred": false},
                        "created_at": "2026-10-01T09:05:00Z"
                    }]
                }]))
            }),
        )
        .route(
            "/api/chats/{chat_id}/messages/{message_id}",
            put(
                |Path((chat_id, message_id)): Path<(String, String)>,
                 Json(body): Json<Value>| async move {
                    if body["role"] == "user" && body["metadata"].is_null() {
                        (StatusCode::NO_CONTENT, format!("{}/{}", chat_id, message_id))
                    } else {
                        (StatusCode::BAD_REQUEST, body.to_string())
                    }
                },
            ),
        )
        .route(
            "/api/chats/{chat_id}/title",
            patch(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"detail": "not found: chat"})),
                )
            }),
        )
}

fn failing_router() -> Router {
    Router::new()
        .route(
            "/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "agent exploded"})),
                )
            }),
        )
        .route(
            "/chat/{thread_id}",
            delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "plain failure") }),
        )
}

#[tokio::test]
async fn given_running_api_when_sending_message_then_reply_is_parsed() {
    let base_url = spawn_server(healthy_router()).await;
    let backend = HttpChatBackend::new(&format!("{}/", base_url));

    let reply = backend
        .send_message("Hello", &ThreadId::parse("abc").unwrap())
        .await
        .unwrap();

    assert_eq!(reply.reply, "Hello @ abc");
    assert_eq!(reply.context_used, Some(true));
    assert_eq!(reply.tool_calls, vec!["search_policies".to_string()]);
}

#[tokio::test]
async fn given_running_api_when_deleting_thread_then_succeeds() {
    let base_url = spawn_server(healthy_router()).await;
    let backend = HttpChatBackend::new(&base_url);

    backend
        .delete_thread(&ThreadId::parse("abc").unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn given_unknown_thread_when_deleting_then_treated_as_deleted() {
    let base_url = spawn_server(healthy_router()).await;
    let backend = HttpChatBackend::new(&base_url);

    let result = backend
        .delete_thread(&ThreadId::parse("missing").unwrap())
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn given_server_error_when_sending_message_then_detail_is_surfaced() {
    let base_url = spawn_server(failing_router()).await;
    let backend = HttpChatBackend::new(&base_url);

    let error = backend
        .send_message("Hello", &ThreadId::default())
        .await
        .unwrap_err();

    match error {
        ChatBackendError::Server { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "agent exploded");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn given_non_json_error_when_deleting_then_raw_body_is_detail() {
    let base_url = spawn_server(failing_router()).await;
    let backend = HttpChatBackend::new(&base_url);

    let error = backend
        .delete_thread(&ThreadId::default())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "server_error");
    assert!(error.to_string().contains("plain failure"));
}

#[tokio::test]
async fn given_unreachable_api_when_sending_message_then_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let backend = HttpChatBackend::new(&format!("http://{}", addr));

    let error = backend
        .send_message("Hello", &ThreadId::default())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "network_error");
}

#[tokio::test]
async fn given_stored_history_when_listing_chats_then_chats_and_messages_are_parsed() {
    let base_url = spawn_server(history_router(STORED_CHAT_ID)).await;
    let backend = HttpChatBackend::new(&base_url);

    let chats = backend.list_chats().await.unwrap();

    assert_eq!(chats.len(), 1);
    let chat = &chats[0];
    assert_eq!(chat.id.to_string(), STORED_CHAT_ID);
    assert_eq!(chat.title, "Parking");
    assert_eq!(chat.messages[0].id.to_string(), STORED_MESSAGE_ID);
    assert_eq!(chat.messages[0].chat_id, chat.id);
    assert_eq!(chat.messages[0].role, MessageRole::Assistant);
    assert_eq!(
        chat.messages[0].metadata,
        Some(MessageMetadata {
            response_time_ms: Some(420),
            ..MessageMetadata::default()
        })
    );
}

#[tokio::test]
async fn given_malformed_chat_id_when_listing_chats_then_invalid_response() {
    let base_url = spawn_server(history_router("not-a-uuid")).await;
    let backend = HttpChatBackend::new(&base_url);

    let error = backend.list_chats().await.unwrap_err();

    assert_eq!(error.kind(), "invalid_response");
}

#[tokio::test]
async fn given_user_message_when_saving_then_it_is_put_under_its_chat() {
    let base_url = spawn_server(history_router(STORED_CHAT_ID)).await;
    let backend = HttpChatBackend::new(&base_url);
    let message = Message::new(ChatId::new(), MessageRole::User, "Where can I park?".to_string());

    backend.save_message(&message).await.unwrap();
}

#[tokio::test]
async fn given_missing_chat_when_renaming_then_not_found_is_surfaced() {
    let base_url = spawn_server(history_router(STORED_CHAT_ID)).await;
    let backend = HttpChatBackend::new(&base_url);

    let error = backend.rename_chat(ChatId::new(), "Parking").await.unwrap_err();

    match error {
        ChatBackendError::Server { status, detail } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "not found: chat");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
