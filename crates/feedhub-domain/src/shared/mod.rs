use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod attributes;
pub use attributes::{AttributeValue, Attributes};

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn from_string(s: &str) -> Self {
                Self(s.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// An id that was never assigned (empty or whitespace only).
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(ElementId);

impl ElementId {
    /// Placeholder id for elements whose id is assigned on publish.
    pub fn unassigned() -> Self {
        Self(String::new())
    }
}

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Preconditions (1xxx)
    PreconditionFailed = 1001,

    // Resource Not Found (2xxx)
    ElementNotFound = 2001,
    NilElement = 2002,

    // Business Rules (3xxx)
    DuplicateElement = 3001,
    FlavourMismatch = 3002,
    FloatingAction = 3003,

    // Data & Persistence (4xxx)
    RepositoryError = 4001,
    SerializationError = 4004,

    // Infrastructure (5xxx)
    InfrastructureError = 5001,
    NotificationError = 5002,

    // Validation (6xxx)
    ValidationError = 6001,
    InvalidInput = 6002,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::ElementNotFound
            | ErrorCode::NilElement
            | ErrorCode::ValidationError
            | ErrorCode::InvalidInput => ErrorSeverity::Info,

            ErrorCode::DuplicateElement
            | ErrorCode::FloatingAction
            | ErrorCode::NotificationError => ErrorSeverity::Warning,

            ErrorCode::FlavourMismatch
            | ErrorCode::RepositoryError
            | ErrorCode::SerializationError
            | ErrorCode::InfrastructureError => ErrorSeverity::Error,

            ErrorCode::PreconditionFailed => ErrorSeverity::Critical,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::DuplicateElement
                | ErrorCode::NotificationError
                | ErrorCode::InfrastructureError
        )
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Duplicate element: {kind} {id} with sequence number {sequence_number} already exists")]
    DuplicateElement {
        kind: String,
        id: String,
        sequence_number: i64,
    },

    #[error("Nil element: {0}")]
    NilElement(String),

    #[error("Flavour mismatch: event flavour {actual} does not match feed flavour {expected}")]
    FlavourMismatch { expected: String, actual: String },

    #[error("Floating action: {0}")]
    FloatingAction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl DomainError {
    /// Get error code
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Precondition(_) => ErrorCode::PreconditionFailed,
            DomainError::Validation(_) => ErrorCode::ValidationError,
            DomainError::InvalidInput(_) => ErrorCode::InvalidInput,
            DomainError::DuplicateElement { .. } => ErrorCode::DuplicateElement,
            DomainError::NilElement(_) => ErrorCode::NilElement,
            DomainError::FlavourMismatch { .. } => ErrorCode::FlavourMismatch,
            DomainError::FloatingAction(_) => ErrorCode::FloatingAction,
            DomainError::NotFound(_) => ErrorCode::ElementNotFound,
            DomainError::Repository(_) => ErrorCode::RepositoryError,
            DomainError::Notification(_) => ErrorCode::NotificationError,
            DomainError::Infrastructure(_) => ErrorCode::InfrastructureError,
            DomainError::Serialization(_) => ErrorCode::SerializationError,
            DomainError::Deserialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }

    /// True when the state change was persisted but its notification was not
    /// acknowledged. Callers must not assume a rollback happened.
    pub fn is_committed(&self) -> bool {
        matches!(self, DomainError::Notification(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, DomainError::DuplicateElement { .. })
    }

    /// Prefix the message with the operation that failed, keeping the variant.
    pub fn context(self, operation: &str) -> Self {
        match self {
            DomainError::Precondition(msg) => {
                DomainError::Precondition(format!("{operation}: {msg}"))
            }
            DomainError::Validation(msg) => DomainError::Validation(format!("{operation}: {msg}")),
            DomainError::InvalidInput(msg) => {
                DomainError::InvalidInput(format!("{operation}: {msg}"))
            }
            DomainError::NilElement(msg) => DomainError::NilElement(format!("{operation}: {msg}")),
            DomainError::FloatingAction(msg) => {
                DomainError::FloatingAction(format!("{operation}: {msg}"))
            }
            DomainError::NotFound(msg) => DomainError::NotFound(format!("{operation}: {msg}")),
            DomainError::Repository(msg) => DomainError::Repository(format!("{operation}: {msg}")),
            DomainError::Notification(msg) => {
                DomainError::Notification(format!("{operation}: {msg}"))
            }
            DomainError::Infrastructure(msg) => {
                DomainError::Infrastructure(format!("{operation}: {msg}"))
            }
            DomainError::Serialization(msg) => {
                DomainError::Serialization(format!("{operation}: {msg}"))
            }
            DomainError::Deserialization(msg) => {
                DomainError::Deserialization(format!("{operation}: {msg}"))
            }
            structured @ (DomainError::DuplicateElement { .. }
            | DomainError::FlavourMismatch { .. }) => structured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id_blank() {
        assert!(ElementId::unassigned().is_blank());
        assert!(ElementId::from_string("  ").is_blank());
        assert!(!ElementId::new().is_blank());
    }

    #[test]
    fn test_element_id_serializes_as_plain_string() {
        let id = ElementId::from_string("item-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"item-1\"");
    }

    #[test]
    fn test_context_keeps_variant() {
        let err = DomainError::NilElement("nil feed item".to_string()).context("resolve item");
        assert_eq!(err.code(), ErrorCode::NilElement);
        assert!(err.to_string().contains("resolve item: nil feed item"));

        let dup = DomainError::DuplicateElement {
            kind: "item".to_string(),
            id: "a".to_string(),
            sequence_number: 3,
        };
        assert!(dup.clone().context("publish item").is_duplicate());
    }

    #[test]
    fn test_notification_errors_are_committed() {
        assert!(DomainError::Notification("lost".into()).is_committed());
        assert!(!DomainError::Repository("down".into()).is_committed());
    }

    #[test]
    fn test_format_with_code() {
        let err = DomainError::Validation("title is required".into());
        assert_eq!(err.format_with_code(), "[6001] Validation error: title is required");
        assert_eq!(err.severity(), ErrorSeverity::Info);
    }
}
