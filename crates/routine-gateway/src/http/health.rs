use axum::{extract::State, Json};
use routine_scheduler::Job;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health: liveness probe with build info and live routine count.
pub async fn health_handler<J: Job>(State(state): State<Arc<AppState<J>>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git_sha": env!("ROUTINE_GIT_SHA"),
        "routines": state.scheduler.len(),
        "tick_ms": state.config.counter.tick_ms,
    }))
}
