//! Review latency API server

use std::sync::Arc;
use std::time::Duration;

use processor::{
    AbsenceRefresher, Calendar, GapApiClient, Ingestor, PgStore, Store, SyncConfig, SyncService,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = common::Config::from_env()?;

    let filter = EnvFilter::from_default_env()
        .add_directive("review_latency_api=debug".parse()?)
        .add_directive("processor=info".parse()?)
        .add_directive("github=info".parse()?);
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting review latency API");

    // Connect to database
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let github = Arc::new(github::GitHubClient::new(config.github_token.clone()));
    let ingestor = Arc::new(Ingestor::new(
        github,
        store.clone(),
        Calendar::new(config.calendar.clone()),
        config.policy.clone(),
    ));

    // Start background ingestion (if enabled)
    if config.sync_interval_minutes > 0 {
        let sync_service = SyncService::new(
            ingestor.clone(),
            SyncConfig {
                interval: Duration::from_secs(config.sync_interval_minutes * 60),
                backoff: Duration::from_secs(config.tick_backoff_secs),
                repos: config.tracked_repos.clone(),
            },
        );
        tokio::spawn(async move {
            sync_service.run().await;
        });
        info!(
            "Background ingestion enabled (every {} minutes)",
            config.sync_interval_minutes
        );
    } else {
        info!("Background ingestion disabled (SYNC_INTERVAL_MINUTES=0)");
    }

    // Start absence refresh (if configured)
    match config.gap_api_url.as_deref() {
        Some(url) if config.absence_refresh_hours > 0 => {
            let refresher = AbsenceRefresher::new(
                Arc::new(GapApiClient::new(url, config.gap_api_token.clone())),
                store.clone(),
                Duration::from_secs(config.absence_refresh_hours * 60 * 60),
                config.absence_lookahead_days,
                config.reviewer_lookback_days,
            );
            tokio::spawn(async move {
                refresher.run().await;
            });
            info!(
                "Absence refresh enabled (every {} hours)",
                config.absence_refresh_hours
            );
        }
        _ => info!("Absence refresh disabled"),
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, store, ingestor));

    let app = routes::router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
