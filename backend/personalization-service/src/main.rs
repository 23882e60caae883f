/// Personalization Service - HTTP Server
///
/// Records per-user interaction signals and serves rule-based wellness
/// recommendations.
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::Context;
use personalization_service::handlers::{self, AppState};
use personalization_service::services::snapshot;
use personalization_service::{
    Config, ConversationContextStore, PatternSnapshotStore, PatternStore, PersonalizationEngine,
    RedisSnapshotStore,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load config
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    info!(
        "Starting {} on HTTP {}",
        config.service_name,
        config.http_bind_address()
    );

    // Stores live for the whole process and are drained at shutdown
    let store = Arc::new(PatternStore::new());
    let engine = Arc::new(PersonalizationEngine::new(store.clone(), &config.engine));
    let conversations = Arc::new(ConversationContextStore::new(
        config.engine.context_window,
        config.engine.prompt_history_turns,
    ));

    let mut state = AppState::new(engine, conversations);
    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("Invalid Redis URL")?;
            let sink: Arc<dyn PatternSnapshotStore> = Arc::new(
                RedisSnapshotStore::new(client).with_ttl_days(config.snapshot_ttl_days),
            );
            state = state.with_snapshots(sink);
            info!("Pattern snapshots enabled");
        }
        None => warn!("Redis URL not set - patterns are kept in memory only"),
    }
    let state = web::Data::new(state);
    let server_state = state.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .wrap(actix_middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(config.http_bind_address())?
    .run()
    .await?;

    info!(users = store.len(), "HTTP server stopped");
    if let Some(snapshots) = &state.snapshots {
        snapshot::flush(&store, snapshots.sink()).await;
    }

    info!("{} stopped", config.service_name);
    Ok(())
}
