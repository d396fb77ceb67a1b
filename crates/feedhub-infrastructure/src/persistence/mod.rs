mod database;
mod error_mapper;
pub mod in_memory;
pub mod repositories;
mod result_ext;

pub use database::Database;
pub use error_mapper::RepositoryErrorMapper;
pub use in_memory::InMemoryFeedRepository;
pub use repositories::SqliteFeedRepository;
pub use result_ext::ResultExt;
