//! Fetching and decoding the source image, bounded by a fixed timeout.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;
use tracing::debug;

use seekbox_vision::{ImageSource, RenderSize};

pub const IMAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(7);

/// Shown to the user for every load failure, distinct from network errors of
/// the detection and search services.
pub const LOAD_FAILURE_MESSAGE: &str = "Could not load image. Please provide a direct image link.";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch image: {0}")]
    Fetch(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("image did not load within {0:?}")]
    TimedOut(Duration),
}

impl LoadError {
    pub fn user_message(&self) -> &'static str {
        LOAD_FAILURE_MESSAGE
    }
}

/// Retrieves raw image bytes for a URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// A decoded source image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub url: String,
    pub image: DynamicImage,
}

impl SourceImage {
    pub fn natural_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Size when drawn `width` pixels wide with the aspect ratio kept.
    pub fn rendered_size(&self, width: f64) -> RenderSize {
        let (w, h) = self.natural_size();
        if w == 0 {
            return RenderSize::new(width, 0.0);
        }
        RenderSize::new(width, width * h as f64 / w as f64)
    }
}

pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    timeout: Duration,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            timeout: IMAGE_LOAD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads and decodes `source`. Embedded payloads skip the fetcher.
    pub async fn load(&self, source: &ImageSource) -> Result<SourceImage, LoadError> {
        tokio::time::timeout(self.timeout, self.load_unbounded(source))
            .await
            .map_err(|_| LoadError::TimedOut(self.timeout))?
    }

    async fn load_unbounded(&self, source: &ImageSource) -> Result<SourceImage, LoadError> {
        let bytes = match source {
            ImageSource::Url(url) => self.fetcher.fetch(url).await?,
            ImageSource::Embedded { bytes, .. } => bytes.clone(),
        };
        debug!("decoding {} ({} bytes)", source.describe(), bytes.len());

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| LoadError::Decode(e.to_string()))?
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        Ok(SourceImage {
            url: source.to_image_url(),
            image,
        })
    }
}
