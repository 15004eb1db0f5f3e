use std::sync::OnceLock;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use thiserror::Error;

use crate::region::Region;

static DATA_URI: OnceLock<Option<Regex>> = OnceLock::new();

fn data_uri_pattern() -> Option<&'static Regex> {
    DATA_URI
        .get_or_init(|| Regex::new(r"^data:(image/[A-Za-z0-9.+-]+)(?:;[^,]*)?,(.*)$").ok())
        .as_ref()
}

/// Where the image to analyze comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Url(String),
    Embedded { mime: String, bytes: Vec<u8> },
}

impl ImageSource {
    /// Parses user input: `data:image/...;base64,` payloads become
    /// [`ImageSource::Embedded`], anything else is taken as a URL.
    pub fn parse(input: &str) -> Result<Self, DetectError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DetectError::MissingInput);
        }
        if !input.starts_with("data:image") {
            return Ok(Self::Url(input.to_string()));
        }

        let caps = data_uri_pattern()
            .and_then(|re| re.captures(input))
            .ok_or_else(|| DetectError::InvalidInput("malformed data uri".into()))?;
        let bytes = STANDARD
            .decode(caps[2].trim())
            .map_err(|e| DetectError::InvalidInput(format!("bad base64 payload: {e}")))?;
        if bytes.is_empty() {
            return Err(DetectError::MissingInput);
        }
        Ok(Self::Embedded {
            mime: caps[1].to_string(),
            bytes,
        })
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Url(url) => url.trim().is_empty(),
            Self::Embedded { bytes, .. } => bytes.is_empty(),
        }
    }

    /// The `image_url` value the detection and search APIs accept.
    pub fn to_image_url(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Embedded { mime, bytes } => format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
        }
    }

    /// Short form for logs; never dumps an embedded payload.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Embedded { bytes, .. } => format!("uploaded image (base64, {} bytes)", bytes.len()),
        }
    }
}

/// Which provider model a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Face,
    Object,
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("image reference required")]
    MissingInput,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("detection provider error: {0}")]
    Provider(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// A service that turns an image into provider regions for one model.
#[async_trait]
pub trait DetectionBackend: Send + Sync {
    async fn detect(&self, model: ModelKind, source: &ImageSource) -> Result<Vec<Region>, DetectError>;
}
