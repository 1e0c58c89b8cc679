use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use routine_core::config::RoutineConfig;
use routine_scheduler::Scheduler;

mod app;
mod counter;
mod http;

/// HTTP control surface for a fleet of in-process counter routines.
#[derive(Debug, Parser)]
#[command(name = "routine-gateway", version)]
struct Cli {
    /// Port to listen on (overrides `server.port`).
    #[arg(long)]
    port: Option<u16>,

    /// Start in test mode: the dashboard hides its interactive controls.
    #[arg(long)]
    test: bool,

    /// Config file (default: $ROUTINE_CONFIG, then ~/.routine/routine.toml).
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "routine_gateway=info,routine_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let mut config = RoutineConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        RoutineConfig::default()
    });
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.test {
        config.server.interactive = false;
    }
    config.validate()?;

    let tick = Duration::from_millis(config.counter.tick_ms);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    let interactive = config.server.interactive;
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    let scheduler = Scheduler::new(counter::CounterJob::new(tick));
    let state = Arc::new(app::AppState::new(config, scheduler.clone()));
    let router = app::build_router(state);

    info!(
        interactive,
        tick_ms = tick.as_millis() as u64,
        "routine gateway listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let lingering = scheduler.shutdown(shutdown_timeout).await;
    if lingering > 0 {
        warn!(lingering, "some routines were still running at exit");
    }
    info!("routine gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
