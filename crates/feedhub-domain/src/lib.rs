// Domain layer - Pure business logic
// No dependencies on infrastructure or presentation layers

pub mod element;
pub mod feed;
pub mod notification;
pub mod shared;

// Re-exports for convenience
pub use element::{Element, ElementKind};
pub use shared::{DomainError, ElementId};
