pub mod application;
pub mod presentation;

pub use presentation::bootstrap::build_app_state;
pub use presentation::state::AppState;
