//! Uniform response body for every mutating route.
//!
//! `{"success": bool, "error": string, "success_count": int, "total_count": int}`
//!
//! `success` is true only when both counts match and no error was recorded.
//! When the counts disagree and an error exists, the route's default message
//! replaces the specific one; the specific error is logged instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use routine_scheduler::{BatchOutcome, SchedulerError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub error: String,
    pub success_count: i64,
    pub total_count: i64,
    #[serde(skip)]
    default_error: &'static str,
}

impl BatchResponse {
    pub fn new(total_count: i64, default_error: &'static str) -> Self {
        Self {
            success: false,
            error: String::new(),
            success_count: 0,
            total_count,
            default_error,
        }
    }

    /// Build from a scheduler batch tally.
    pub fn from_batch(outcome: &BatchOutcome, default_error: &'static str) -> Self {
        Self::new(outcome.total as i64, default_error)
            .with_result(outcome.error.as_ref())
            .with_counts(outcome.succeeded as i64, outcome.total as i64)
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = error.to_string();
        self
    }

    /// Record `error`, or clear any previous one when `None`.
    pub fn with_result(mut self, error: Option<&SchedulerError>) -> Self {
        self.error = error.map(ToString::to_string).unwrap_or_default();
        self
    }

    pub fn with_counts(mut self, success_count: i64, total_count: i64) -> Self {
        self.success_count = success_count;
        self.total_count = total_count;
        self
    }

    /// Apply the success rule and default-message substitution.
    fn finish(mut self) -> Self {
        let counts_match = self.success_count == self.total_count;
        self.success = counts_match && self.error.is_empty();
        if !counts_match && !self.error.is_empty() {
            warn!(
                error = %self.error,
                success_count = self.success_count,
                total_count = self.total_count,
                "partial failure"
            );
            self.error = self.default_error.to_string();
        }
        self
    }
}

impl IntoResponse for BatchResponse {
    fn into_response(self) -> Response {
        let body = self.finish();
        let status = if body.success {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(body)).into_response()
    }
}

/// Decode a JSON request body, or produce the `invalid request format`
/// response (counts 0/0) for the route.
pub fn decode_body<T: DeserializeOwned>(
    body: &[u8],
    default_error: &'static str,
) -> Result<T, BatchResponse> {
    serde_json::from_slice(body).map_err(|e| {
        BatchResponse::new(0, default_error).with_error(format!("invalid request format: {e}"))
    })
}
