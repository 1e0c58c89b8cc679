//! Routine lifecycle routes.
//!
//! | Route                | Input                                  |
//! |----------------------|----------------------------------------|
//! | `/start`             | query `count`, `config`                |
//! | `POST /stop`         | JSON array of keys                     |
//! | `POST /suspend`      | JSON array of keys                     |
//! | `POST /resume`       | JSON array of keys                     |
//! | `POST /update-config`| `{"ids": [...], "config": "..."}`      |
//! | `GET /status`        | query `filter` (optional)              |
//!
//! All but `/status` answer with a [`BatchResponse`].

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use routine_scheduler::{Job, RoutineStatus};
use serde::Deserialize;

use super::response::{decode_body, BatchResponse};
use crate::app::AppState;

const START_FAILED: &str = "Failed to start all requested routines";
const STOP_FAILED: &str = "Failed to stop all requested routines";
const SUSPEND_FAILED: &str = "Failed to suspend all requested routines";
const RESUME_FAILED: &str = "Failed to resume all requested routines";
const UPDATE_FAILED: &str = "Failed to update all requested routines";

#[derive(Debug, Deserialize)]
pub struct StartQuery {
    pub count: Option<String>,
    pub config: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConfigPayload {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub config: String,
}

/// Start `count` routines with one serialized config.
pub async fn start<J: Job>(
    State(state): State<Arc<AppState<J>>>,
    Query(query): Query<StartQuery>,
) -> BatchResponse {
    // An unparsable count is treated like a missing one.
    let count: i64 = query
        .count
        .as_deref()
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(0);
    let raw = query.config.unwrap_or_default();
    let result = BatchResponse::new(count, START_FAILED);

    if count <= 0 {
        return result.with_error("invalid count parameter: must be greater than 0");
    }
    if raw.is_empty() {
        return result.with_error("config parameter is required but was not provided");
    }
    let Ok(requested) = usize::try_from(count) else {
        return result.with_error("invalid count parameter: too large");
    };

    match state.scheduler.start_many(requested, &raw) {
        Ok(outcome) => result
            .with_result(outcome.error.as_ref())
            .with_counts(outcome.succeeded() as i64, count),
        Err(e) => result.with_error(e),
    }
}

pub async fn stop<J: Job>(State(state): State<Arc<AppState<J>>>, body: Bytes) -> BatchResponse {
    let ids: Vec<String> = match decode_body(&body, STOP_FAILED) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    BatchResponse::from_batch(&state.scheduler.stop(&ids), STOP_FAILED)
}

pub async fn suspend<J: Job>(State(state): State<Arc<AppState<J>>>, body: Bytes) -> BatchResponse {
    let ids: Vec<String> = match decode_body(&body, SUSPEND_FAILED) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    BatchResponse::from_batch(&state.scheduler.suspend(&ids), SUSPEND_FAILED)
}

pub async fn resume<J: Job>(State(state): State<Arc<AppState<J>>>, body: Bytes) -> BatchResponse {
    let ids: Vec<String> = match decode_body(&body, RESUME_FAILED) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    BatchResponse::from_batch(&state.scheduler.resume(&ids), RESUME_FAILED)
}

pub async fn update_config<J: Job>(
    State(state): State<Arc<AppState<J>>>,
    body: Bytes,
) -> BatchResponse {
    let payload: UpdateConfigPayload = match decode_body(&body, UPDATE_FAILED) {
        Ok(payload) => payload,
        Err(resp) => return resp,
    };

    match state.scheduler.update_config(&payload.ids, &payload.config) {
        Ok(outcome) => BatchResponse::from_batch(&outcome, UPDATE_FAILED),
        // Nothing was attempted, so counts stay 0/0 and the parse error is reported as is.
        Err(e) => BatchResponse::new(0, UPDATE_FAILED)
            .with_error(format!("could not deserialize config: {e}")),
    }
}

/// List live routines, optionally filtered by a case-insensitive key substring.
pub async fn status<J: Job>(
    State(state): State<Arc<AppState<J>>>,
    Query(query): Query<StatusQuery>,
) -> Json<Vec<RoutineStatus>> {
    Json(state.scheduler.status(query.filter.as_deref()))
}
