mod inbox_count_handler;
mod label_index_handler;

pub use inbox_count_handler::InboxCountHandler;
pub use label_index_handler::LabelIndexHandler;
