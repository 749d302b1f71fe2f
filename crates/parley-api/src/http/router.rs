//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/` except `/health`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/threads", get(handlers::thread::list_threads))
        .route("/threads/{thread_id}", get(handlers::thread::get_thread))
        .route(
            "/threads/{thread_id}/messages",
            post(handlers::chat::send_message),
        )
        .route(
            "/threads/{thread_id}/stream",
            post(handlers::chat::stream_message),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::state::test_support::state_with;

    /// Serve the router on an ephemeral port and issue one raw HTTP/1.1 request.
    async fn request(state: AppState, head: &str, body: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let raw = format!(
            "{head} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(raw.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_health() {
        let response = request(state_with(vec![]), "GET /health", "").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#""status":"ok""#));
    }

    #[tokio::test]
    async fn test_post_message_route() {
        let response = request(
            state_with(vec![Ok("Hola!")]),
            "POST /api/v1/threads/language-demo/messages",
            r#"{"message":"Tell me about artificial intelligence.","language":"Spanish"}"#,
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#""content":"Hola!""#));
    }

    #[tokio::test]
    async fn test_unknown_thread_route_is_404() {
        let response = request(state_with(vec![]), "GET /api/v1/threads/ghost", "").await;
        assert!(response.starts_with("HTTP/1.1 404"));
        assert!(response.contains("THREAD_NOT_FOUND"));
    }
}
