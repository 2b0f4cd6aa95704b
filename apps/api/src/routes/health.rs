use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and provider backends.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "relevance-api",
        "similarity_provider": state.engine.provider_name(),
        "feedback_provider": state.engine.feedback_provider_name(),
        "max_concurrent_evaluations": state.config.max_concurrent_evaluations,
    }))
}
