use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::FromRow;

use crate::persistence::RepositoryErrorMapper;
use feedhub_domain::element::Element;
use feedhub_domain::shared::DomainError;

#[derive(FromRow)]
pub(super) struct DocumentRow {
    pub document: String,
}

impl DocumentRow {
    /// Decode the stored document, validating it on the way in.
    pub fn to_element<E>(self) -> Result<E, DomainError>
    where
        E: Element + DeserializeOwned,
    {
        E::validate_and_unmarshal(self.document.as_bytes())
            .map_err(|e| e.context("Decode stored document"))
    }
}

pub(super) fn to_document<E: Serialize>(element: &E, context: &str) -> Result<String, DomainError> {
    serde_json::to_string(element).map_err(|e| RepositoryErrorMapper::map_json_error(e, context))
}

pub(super) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(super) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
