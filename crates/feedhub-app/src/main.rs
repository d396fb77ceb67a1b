use feedhub_infrastructure::config::AppConfig;
use feedhub_infrastructure::logging;
use feedhub_lib::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;

    match logging::init_logger(config.log_dir.clone()) {
        Ok(_) => {
            tracing::info!("🚀 FeedHub starting...");
            tracing::info!("📝 File logging initialized at: {}", config.log_dir.display());
        }
        Err(e) => {
            eprintln!("⚠️  Failed to initialize file logging: {}", e);
            eprintln!("   Falling back to console logging only");

            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .try_init();
        }
    }

    tracing::info!("🚀 Starting app state initialization...");
    let state = match AppState::new(config).await {
        Ok(state) => {
            tracing::info!("✅ App state initialized successfully");
            state
        }
        Err(e) => {
            tracing::error!("❌ Failed to initialize app state: {:#}", e);
            return Err(e);
        }
    };

    for topic in state.collection.topic_ids() {
        tracing::info!("📡 Publishing on topic {}", topic);
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("🛑 Shutdown requested");
    state.shutdown().await;

    Ok(())
}
