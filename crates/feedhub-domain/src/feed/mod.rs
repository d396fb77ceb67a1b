pub mod action;
pub mod aggregate;
pub mod collection;
pub mod config;
pub mod event;
pub mod item;
pub mod link;
pub mod message;
pub mod nudge;
pub mod query;
pub mod repository;
pub mod snapshot;
pub mod value_objects;

#[cfg(test)]
mod test_support;

pub use action::Action;
pub use aggregate::Feed;
pub use collection::{Collection, FeedInitializer};
pub use config::FeedConfig;
pub use event::{Event, EventContext};
pub use item::Item;
pub use link::Link;
pub use message::Message;
pub use nudge::Nudge;
pub use query::{FilterParams, ItemQuery, NudgeQuery, DEFAULT_ITEMS_LIMIT};
pub use repository::FeedRepository;
pub use snapshot::FeedSnapshot;
pub use value_objects::{
    ActionType, BooleanFilter, Channel, FeedScope, Flavour, Handling, LinkType, Status, TextType,
    Visibility,
};
