use serde::{Deserialize, Serialize};
use url::Url;

use super::value_objects::LinkType;
use crate::shared::{DomainError, ElementId};

/// Media attachment: an image, a document or a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default = "ElementId::new")]
    pub id: ElementId,
    pub url: String,
    pub link_type: LinkType,
}

impl Link {
    pub fn new(url: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            id: ElementId::new(),
            url: url.into(),
            link_type,
        }
    }

    pub fn png_image(url: impl Into<String>) -> Self {
        Self::new(url, LinkType::PngImage)
    }

    pub fn pdf_document(url: impl Into<String>) -> Self {
        Self::new(url, LinkType::PdfDocument)
    }

    pub fn youtube_video(url: impl Into<String>) -> Self {
        Self::new(url, LinkType::YoutubeVideo)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| DomainError::Validation(format!("invalid link url '{}': {}", self.url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DomainError::Validation(format!(
                "link url '{}' must use http or https",
                self.url
            )));
        }

        let path = parsed.path().to_ascii_lowercase();
        let ok = match self.link_type {
            LinkType::PngImage => path.ends_with(".png"),
            LinkType::PdfDocument => path.ends_with(".pdf"),
            LinkType::YoutubeVideo => parsed.host_str().map_or(false, |host| {
                host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
            }),
        };

        if !ok {
            return Err(DomainError::Validation(format!(
                "'{}' is not a valid {} link",
                self.url, self.link_type
            )));
        }
        Ok(())
    }

    /// Validate and additionally require a specific link type.
    pub fn validate_as(&self, expected: LinkType, field: &str) -> Result<(), DomainError> {
        if self.link_type != expected {
            return Err(DomainError::Validation(format!(
                "{field} must be a {expected} link, got {}",
                self.link_type
            )));
        }
        self.validate()
    }
}
