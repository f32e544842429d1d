//! Crowdfunding API — entry point.
//!
//! Serves the funding ledger, project lifecycle, and payment reconciliation
//! over a small Axum REST API backed by SQLite. A background sweeper task
//! periodically re-evaluates active projects whose deadline has passed.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod ledger;
mod models;
mod payments;
mod sweeper;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::ApiState;
use config::Config;
use payments::StripeGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Load config from environment.
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    // HTTP client for outbound processor calls.
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let processor = Arc::new(StripeGateway::new(
        client,
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
    ));

    // ─── Background deadline sweeper ──────────────────────
    let sweeper_state = Arc::new(sweeper::SweeperState {
        pool: pool.clone(),
        interval_secs: config.sweep_interval_secs,
    });
    tokio::spawn(sweeper::run(sweeper_state));

    // ─── REST API ─────────────────────────────────────────
    let api_port = config.api_port;
    let api_state = Arc::new(ApiState {
        pool,
        config,
        processor,
    });

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/projects", post(api::create_project).get(api::list_projects))
        .route("/projects/:id", get(api::get_project))
        .route("/projects/:id/validate", post(api::validate_project))
        .route("/projects/:id/recheck", post(api::recheck_project))
        .route(
            "/investments",
            post(api::create_investment).get(api::list_investments),
        )
        .route("/investments/:id", get(api::get_investment))
        .route(
            "/investments/:id/payment-intent",
            post(api::create_payment_intent),
        )
        .route("/investments/:id/confirm", post(api::confirm_payment))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(api_state);

    let addr = format!("0.0.0.0:{api_port}");
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
