use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use workshophub_server::config::AppConfig;
use workshophub_server::notify::LogNotifier;
use workshophub_server::state::AppState;
use workshophub_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    seed::ensure_indexes(&db).await?;

    if config.seed.demo_data {
        seed::seed_demo_data(&db)
            .await
            .context("Failed to seed demo data")?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: Arc::new(config),
        notifier: Arc::new(LogNotifier),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("WorkshopHub API listening on http://{}", addr);
    info!("API docs at http://{}/swagger-ui and /scalar", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
