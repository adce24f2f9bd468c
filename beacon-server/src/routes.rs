use axum::{
    Router,
    extract::State,
    response::Json,
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

/// Build the application router: the two WebSocket surfaces plus liveness
/// endpoints.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(handlers::broadcast::broadcast_handler))
        .route("/notify", get(handlers::targeted::targeted_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| axum::http::HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
}

async fn ping_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Beacon dispatch server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "queue": {
                "depth": state.queue.len(),
                "closed": state.queue.is_closed(),
            },
            "broadcast": {
                "connections": state.hub.connection_count(),
            },
            "routing": {
                "registered_users": state.routing.registered_count(),
            },
        },
    }))
}
