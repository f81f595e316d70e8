use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the embedding backend in use.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let aggregator = state.engine.aggregator();
    let embeddings = aggregator.embeddings();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-matcher-api",
        "embedding_backend": embeddings.backend_name(),
        "embedding_dim": embeddings.dimension(),
        "weights": aggregator.weights()
    }))
}
