mod display;
mod error;
mod handlers;
mod metrics;
mod misuse;
mod routes;


use anyhow::Context;
use axum::Router;
use gauntlet_common::Config;
use gauntlet_engine::{FixtureStore, Judge, QuestionStore};
use misuse::MisuseLog;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct AppState {
    pub config: Config,
    pub judge: Judge,
    pub fixtures: FixtureStore,
    pub questions: QuestionStore,
    pub misuse_log: MisuseLog,
}

impl AppState {
    pub fn new(config: Config, judge: Judge) -> Self {
        Self {
            fixtures: FixtureStore::new(&config.fixtures_dir),
            questions: QuestionStore::new(&config.questions_dir),
            misuse_log: MisuseLog::new(&config.misuse_log),
            judge,
            config,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();
    init_tracing();

    info!("Gauntlet API booting...");

    let config = Config::from_env().context("invalid configuration")?;
    let judge = Judge::from_config(&config).context("failed to initialise judge")?;
    let bind_addr = config.bind_addr.clone();

    info!(
        fixtures_dir = %config.fixtures_dir.display(),
        questions_dir = %config.questions_dir.display(),
        time_limit_ms = config.time_limit_ms,
        suite_policy = %config.suite_policy,
        "Configuration loaded"
    );

    let state = Arc::new(AppState::new(config, judge));
    let router = app(state.clone());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", bind_addr))?;

    info!("HTTP server listening on {}", bind_addr);

    let shutdown_state = state.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            warn!("Received shutdown signal, refusing new submissions...");
            shutdown_state.judge.close();
        })
        .await
        .context("server error")?;

    info!("Gauntlet API stopped");
    Ok(())
}
