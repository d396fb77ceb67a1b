pub mod default_content;
pub mod event_handlers;

pub use default_content::DefaultContentSeeder;
pub use event_handlers::{InboxCountHandler, LabelIndexHandler};
