use allocator::AllocationCalculator;
use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod middleware;
mod models;
mod notify;
mod routes;

use config::Args;
use models::{PlayerStore, SessionStore};
use notify::Notifier;
use routes::catalog::get_catalog;
use routes::game::{get_game, get_tax_tables, reset, start_game};
use routes::notify::send_summary;
use routes::players::{get_leaderboard, update_player};
use routes::session::{debug_session, get_session};

const SESSION_REAP_INTERVAL: Duration = Duration::from_secs(10 * 60);

// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub calculator: Arc<AllocationCalculator>,
    pub players: Arc<PlayerStore>,
    pub sessions: SessionStore,
    pub notifier: Notifier,
    pub catalog_dir: Arc<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let calculator = AllocationCalculator::new(args.allocation_config()?);
    tracing::info!(
        "Allocation config: savings fraction {}, max entry {}",
        calculator.config().savings_fraction,
        calculator.config().max_entry_amount
    );

    let players = PlayerStore::open(&args.database_path)?;
    tracing::info!("Player store ready ({} players)", players.count()?);

    let notifier = Notifier::new(args.notify_webhook_url.clone(), args.notify_timeout())?;
    if !notifier.is_enabled() {
        tracing::warn!("No notification webhook configured, email summaries are disabled");
    }

    let sessions = SessionStore::new(args.session_ttl());
    tokio::spawn(sessions.clone().run_reaper(SESSION_REAP_INTERVAL));

    let state = AppState {
        calculator: Arc::new(calculator),
        players: Arc::new(players),
        sessions,
        notifier,
        catalog_dir: Arc::new(args.catalog_dir.clone()),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!("Server running on http://{}", args.listen);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/startgame", post(start_game))
        .route("/api/game", get(get_game))
        .route("/api/update", post(update_player))
        .route("/leaderboard", get(get_leaderboard))
        .route("/api/catalog/{cat}", get(get_catalog))
        .route("/api/session", get(get_session))
        .route("/debugsession", get(debug_session))
        .route("/api/tax-tables", get(get_tax_tables))
        .route("/api/notify", post(send_summary))
        .route("/reset", get(reset).post(reset))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// Root endpoint
async fn root() -> &'static str {
    "Lotto Life API - POST /startgame to enter your winnings, POST /api/update to save progress, GET /leaderboard for the top players"
}
