use axum::Router;
use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{LlmClient, PolicyStore};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::config::CorsSettings;
use crate::presentation::handlers::{
    chat_handler, delete_chat_handler, delete_thread_handler, get_chat_handler, health_handler,
    list_chats_handler, rename_chat_handler, save_message_handler, upsert_chat_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<L, S>(state: AppState<L, S>) -> Router
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    let cors = cors_layer(&state.settings.cors);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler::<L, S>))
        .route("/chat/{thread_id}", delete(delete_thread_handler::<L, S>))
        .route("/api/chats", get(list_chats_handler::<L, S>))
        .route(
            "/api/chats/{chat_id}",
            get(get_chat_handler::<L, S>)
                .put(upsert_chat_handler::<L, S>)
                .delete(delete_chat_handler::<L, S>),
        )
        .route(
            "/api/chats/{chat_id}/title",
            patch(rename_chat_handler::<L, S>),
        )
        .route(
            "/api/chats/{chat_id}/messages/{message_id}",
            put(save_message_handler::<L, S>),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origin = if settings.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = settings
            .allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
