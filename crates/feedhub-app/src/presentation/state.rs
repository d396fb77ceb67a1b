use std::sync::Arc;

use feedhub_domain::feed::Collection;
use feedhub_infrastructure::config::AppConfig;
use feedhub_infrastructure::messaging::InMemoryTopicBus;
use feedhub_infrastructure::persistence::Database;

use super::bootstrap::build_app_state;

/// Everything the running service holds on to.
pub struct AppState {
    pub config: AppConfig,
    pub collection: Collection,
    pub database: Arc<Database>,
    /// Present with the memory transport; local consumers are subscribed here.
    pub local_bus: Option<Arc<InMemoryTopicBus>>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        build_app_state(config).await
    }

    pub async fn shutdown(&self) {
        self.database.pool().close().await;
    }
}
