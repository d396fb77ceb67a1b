use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

/// Kind tag carried by every element, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Item,
    Nudge,
    Action,
    Message,
    Event,
    Feed,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Item => "item",
            ElementKind::Nudge => "nudge",
            ElementKind::Action => "action",
            ElementKind::Message => "message",
            ElementKind::Event => "event",
            ElementKind::Feed => "feed",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structural validation plus (de)serialization.
///
/// Every object that crosses the repository or notification boundary
/// implements this. Validation always runs before bytes leave or enter the
/// system; a failure aborts the enclosing operation.
pub trait Element: fmt::Debug + Send + Sync {
    fn kind(&self) -> ElementKind;

    fn element_id(&self) -> &str;

    /// Check the element against the fixed schema of its type.
    fn validate(&self) -> Result<(), DomainError>;

    /// Encode without validating. Prefer `validate_and_marshal`.
    fn marshal(&self) -> Result<Vec<u8>, DomainError>;

    fn validate_and_marshal(&self) -> Result<Vec<u8>, DomainError> {
        self.validate()?;
        self.marshal()
    }

    fn validate_and_unmarshal(bytes: &[u8]) -> Result<Self, DomainError>
    where
        Self: Sized + DeserializeOwned,
    {
        let element: Self = serde_json::from_slice(bytes).map_err(|e| {
            DomainError::Deserialization(format!(
                "unable to decode {}: {}",
                std::any::type_name::<Self>(),
                e
            ))
        })?;
        element.validate()?;
        Ok(element)
    }
}

macro_rules! impl_element {
    ($type:ty, $kind:expr) => {
        impl $crate::element::Element for $type {
            fn kind(&self) -> $crate::element::ElementKind {
                $kind
            }

            fn element_id(&self) -> &str {
                self.id.as_str()
            }

            fn validate(&self) -> Result<(), $crate::shared::DomainError> {
                self.check_schema()
            }

            fn marshal(&self) -> Result<Vec<u8>, $crate::shared::DomainError> {
                serde_json::to_vec(self).map_err(|e| {
                    $crate::shared::DomainError::Serialization(format!(
                        "unable to encode {} {}: {}",
                        $kind, self.id, e
                    ))
                })
            }
        }
    };
}

pub(crate) use impl_element;

pub(crate) fn require_text(value: &str, field: &str, kind: ElementKind) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{kind} {field} is required")));
    }
    Ok(())
}

pub(crate) fn require_sequence(sequence_number: i64, kind: ElementKind) -> Result<(), DomainError> {
    if sequence_number <= 0 {
        return Err(DomainError::Validation(format!(
            "{kind} sequence number must be positive, got {sequence_number}"
        )));
    }
    Ok(())
}
