//! Interactive/test mode toggle used by the dashboard.
//!
//! Test mode (`interactive = false`) hides the dashboard controls; the routine
//! API itself behaves the same in both modes.

use std::sync::{atomic::Ordering, Arc};

use axum::{
    extract::{Query, State},
    Json,
};
use routine_scheduler::Job;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;

/// `interactiveMode` is true while the dashboard shows its controls, so
/// `/switch?mode=on` (test mode) answers `false` and `mode=off` answers `true`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeResponse {
    #[serde(rename = "interactiveMode")]
    pub interactive_mode: bool,
}

#[derive(Debug, Deserialize)]
pub struct SwitchQuery {
    pub mode: Option<String>,
}

/// GET /interactive_mode
pub async fn interactive_mode<J: Job>(State(state): State<Arc<AppState<J>>>) -> Json<ModeResponse> {
    Json(ModeResponse {
        interactive_mode: state.interactive.load(Ordering::Relaxed),
    })
}

/// `/switch?mode=on` enters test mode, `mode=off` returns to interactive
/// mode. Any other value leaves the mode unchanged.
pub async fn switch<J: Job>(
    State(state): State<Arc<AppState<J>>>,
    Query(query): Query<SwitchQuery>,
) -> Json<ModeResponse> {
    match query.mode.as_deref() {
        Some("on") => {
            state.interactive.store(false, Ordering::Relaxed);
            info!("switched to test mode (non-interactive)");
        }
        Some("off") => {
            state.interactive.store(true, Ordering::Relaxed);
            info!("switched to interactive mode");
        }
        _ => {}
    }
    Json(ModeResponse {
        interactive_mode: state.interactive.load(Ordering::Relaxed),
    })
}
