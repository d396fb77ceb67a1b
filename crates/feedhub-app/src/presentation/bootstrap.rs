use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::info;

use super::state::AppState;
use crate::application::default_content::DefaultContentSeeder;
use crate::application::event_handlers::{InboxCountHandler, LabelIndexHandler};
use feedhub_domain::feed::{Collection, FeedRepository};
use feedhub_domain::notification::NotificationService;
use feedhub_infrastructure::config::AppConfig;
use feedhub_infrastructure::messaging::{create_publisher, EnvelopeNotificationService};
use feedhub_infrastructure::persistence::{Database, SqliteFeedRepository};

pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let startup_started_at = Instant::now();

    let db_path = config
        .database_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    info!("Database path: {}", db_path);

    info!("🔌 Connecting to database...");
    let started_at = Instant::now();
    let database = Arc::new(Database::new(db_path).await?);
    info!(
        "✓ Database connection established ({}ms)",
        started_at.elapsed().as_millis()
    );

    info!("🔄 Running migrations...");
    let started_at = Instant::now();
    database.run_migrations().await?;
    info!(
        "✓ Migrations completed ({}ms)",
        started_at.elapsed().as_millis()
    );

    let repository = Arc::new(SqliteFeedRepository::new(database.shared_pool(), &config.feed))
        as Arc<dyn FeedRepository>;

    let transport = create_publisher(&config.messaging, &config.timeouts)?;
    let notifier = Arc::new(EnvelopeNotificationService::new(
        transport.publisher(),
        config.messaging.namespace.clone(),
    )) as Arc<dyn NotificationService>;
    info!(
        "📣 Notifications via {:?} transport, environment '{}'",
        config.messaging.transport, config.messaging.namespace.environment
    );

    let seeder = Arc::new(DefaultContentSeeder::builtin()?);
    let collection =
        Collection::new(repository, notifier, config.feed.clone()).with_initializer(seeder);

    let local_bus = transport.local_bus();
    if let Some(bus) = &local_bus {
        bus.subscribe(Arc::new(InboxCountHandler::new(collection.clone())))
            .await;
        bus.subscribe(Arc::new(LabelIndexHandler::new(collection.clone())))
            .await;
        info!("✓ Local envelope handlers subscribed");
    }

    info!(
        "🚀 Startup completed ({}ms)",
        startup_started_at.elapsed().as_millis()
    );

    Ok(AppState {
        config,
        collection,
        database,
        local_bus,
    })
}
