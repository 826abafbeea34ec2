//! trending-crawlers: binary entrypoint.
//! Boots the Axum HTTP server exposing the tool endpoints plus `/metrics`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trending_crawlers::api::{self, AppState};
use trending_crawlers::config::{AppConfig, Credentials};
use trending_crawlers::engine::TrendingEngine;
use trending_crawlers::metrics::Metrics;

/// Compact local logs, enabled with TRENDING_DEV_LOG=1.
/// The hosting runtime may already own the global subscriber; then this is a no-op.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("TRENDING_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");
    if !dev_flag {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("engine=info,fanout=info,sources=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    let cfg = AppConfig::load()?;
    let creds = Credentials::from_env();
    tracing::info!(?creds, region = %cfg.engine.default_region, "configuration loaded");

    let engine = TrendingEngine::from_config(&cfg, &creds)?;

    let mut router = api::create_router(AppState::new(engine.clone()));
    match Metrics::init(engine.route_table()) {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
