use axum::{
    routing::{get, post},
    Router,
};
use routine_core::config::RoutineConfig;
use routine_scheduler::{Job, Scheduler};
use std::sync::{atomic::AtomicBool, Arc};

use crate::http;

/// Central shared state, passed as `Arc<AppState<J>>` to all Axum handlers.
pub struct AppState<J: Job> {
    pub config: RoutineConfig,
    pub scheduler: Scheduler<J>,
    /// Dashboard mode; flipped at runtime by `/switch`.
    pub interactive: AtomicBool,
}

impl<J: Job> AppState<J> {
    pub fn new(config: RoutineConfig, scheduler: Scheduler<J>) -> Self {
        let interactive = AtomicBool::new(config.server.interactive);
        Self {
            config,
            scheduler,
            interactive,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router<J: Job>(state: Arc<AppState<J>>) -> Router {
    Router::new()
        .route("/", get(http::ui::ui_handler::<J>))
        .route("/health", get(http::health::health_handler::<J>))
        .route(
            "/start",
            get(http::routines::start::<J>).post(http::routines::start::<J>),
        )
        .route("/stop", post(http::routines::stop::<J>))
        .route("/suspend", post(http::routines::suspend::<J>))
        .route("/resume", post(http::routines::resume::<J>))
        .route("/update-config", post(http::routines::update_config::<J>))
        .route("/status", get(http::routines::status::<J>))
        .route("/interactive_mode", get(http::mode::interactive_mode::<J>))
        .route(
            "/switch",
            get(http::mode::switch::<J>).post(http::mode::switch::<J>),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
