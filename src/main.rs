use anyhow::Context;
use socialgraph::{spawn_notification_sink, HttpServer, ServerConfig, SocialGraphEngine};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Social Graph Engine v{}", socialgraph::version());

    let config = ServerConfig::from_env();
    let engine = SocialGraphEngine::open(&config).context("failed to open follow graph")?;
    let engine = Arc::new(engine);

    let stats = engine.statistics().await;
    info!("Loaded {} users and {} follows", stats.user_count, stats.edge_count);

    let events = engine.subscribe().await;
    let sink = spawn_notification_sink(events);

    let server = HttpServer::new(Arc::clone(&engine), config.bind_address());
    server
        .start(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")?;

    engine.checkpoint().await.context("checkpoint on shutdown failed")?;
    engine.flush().await?;
    sink.abort();

    info!("Bye");
    Ok(())
}
