use serde::{Deserialize, Serialize};

use super::query::DEFAULT_ITEMS_LIMIT;

pub const DEFAULT_LABEL: &str = "A Default Label";
pub const DEFAULT_ORGANIZATION_ID: &str = "default-organization";
pub const DEFAULT_LOCATION_ID: &str = "default-location";

/// Settings handed to the aggregate at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub items_limit: usize,
    pub default_label: String,
    pub default_organization_id: String,
    pub default_location_id: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            items_limit: DEFAULT_ITEMS_LIMIT,
            default_label: DEFAULT_LABEL.to_string(),
            default_organization_id: DEFAULT_ORGANIZATION_ID.to_string(),
            default_location_id: DEFAULT_LOCATION_ID.to_string(),
        }
    }
}
