use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use translation_gateway::config::Config;
use translation_gateway::scheduler;
use translation_gateway::server::{self, AppState};
use translation_gateway::service::TranslationService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_gateway=info".parse()?),
        )
        .init();

    info!("Starting translation gateway");

    let config = Config::from_env()?;
    let service = Arc::new(TranslationService::from_config(&config).await?);

    if config.warm_on_start {
        match service.warm().await {
            Ok(count) => info!("Warmed cache for {} locales", count),
            Err(e) => error!("Cache warm-up failed: {}", e),
        }
    }

    let mut scheduler = scheduler::start_scheduler(Arc::clone(&service), &config.sweep_schedule).await?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .context(format!("Failed to bind port {}", config.port))?;
    info!("Listening on http://{}", listener.local_addr()?);

    let state = AppState {
        service,
        debug: config.debug,
    };
    server::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
    })
    .await?;

    scheduler.shutdown().await?;
    info!("✓ Translation gateway stopped");
    Ok(())
}
