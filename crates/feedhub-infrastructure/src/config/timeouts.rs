use std::time::Duration;

/// Timeouts used by the adapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Pub/Sub publish request timeout
    pub http_request: Duration,

    /// Wait for a pooled database connection
    pub db_acquire: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        GLOBAL_TIMEOUT_CONFIG.clone()
    }
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the global timeout configuration
    pub fn global() -> &'static Self {
        &GLOBAL_TIMEOUT_CONFIG
    }
}

/// Global timeout configuration instance
static GLOBAL_TIMEOUT_CONFIG: TimeoutConfig = TimeoutConfig {
    http_request: Duration::from_secs(30),
    db_acquire: Duration::from_secs(10),
};
