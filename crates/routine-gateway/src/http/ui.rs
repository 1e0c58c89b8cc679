use std::sync::{atomic::Ordering, Arc};

use axum::{extract::State, response::Html};
use routine_scheduler::Job;

use crate::app::AppState;

static INDEX_HTML: &str = include_str!("../../static/index.html");

/// Serve the embedded dashboard at `GET /`.
///
/// The page boots with the current mode baked into `<body data-interactive>`
/// and afterwards polls `/interactive_mode` to follow `/switch`.
pub async fn ui_handler<J: Job>(State(state): State<Arc<AppState<J>>>) -> Html<String> {
    let interactive = state.interactive.load(Ordering::Relaxed);
    Html(INDEX_HTML.replace("{{INTERACTIVE}}", if interactive { "true" } else { "false" }))
}
