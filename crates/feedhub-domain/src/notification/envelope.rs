use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::element::Element;
use crate::feed::{FeedScope, Flavour};
use crate::shared::{Attributes, DomainError};

/// Wire unit pushed to the notification bus.
///
/// `payload` holds the bytes of an element that already passed validation;
/// on the wire it is base64 encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub uid: String,
    pub flavour: Flavour,
    #[serde(serialize_with = "payload_to_base64", deserialize_with = "payload_from_base64")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub metadata: Attributes,
}

impl NotificationEnvelope {
    /// Validate and marshal `element` into a new envelope for `scope`.
    pub fn wrap(
        scope: &FeedScope,
        element: &dyn Element,
        metadata: Attributes,
    ) -> Result<Self, DomainError> {
        let payload = element.validate_and_marshal()?;
        Ok(Self {
            uid: scope.uid().to_string(),
            flavour: scope.flavour(),
            payload,
            metadata,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(self)
            .map_err(|e| DomainError::Serialization(format!("unable to encode envelope: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DomainError::Deserialization(format!("unable to decode envelope: {e}")))
    }

    /// Decode and validate the carried element.
    pub fn decode_payload<E>(&self) -> Result<E, DomainError>
    where
        E: Element + DeserializeOwned,
    {
        E::validate_and_unmarshal(&self.payload)
    }

    pub fn scope(&self) -> Result<FeedScope, DomainError> {
        FeedScope::new(self.uid.clone(), self.flavour)
    }
}

fn payload_to_base64<T, S>(payload: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(payload.as_ref()))
}

fn payload_from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}
