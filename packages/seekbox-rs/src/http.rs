//! HTTP implementations of the collaborator traits.
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use seekbox_vision::{
    DetectError, DetectedObject, DetectionBackend, ImageSource, MarginBox, ModelKind, ProviderBox,
    Region,
};

use crate::detection::ActorId;
use crate::entries::{CounterError, EntryCounter};
use crate::image_loader::{ImageFetcher, LoadError};
use crate::search::{ImageHost, SearchError, SearchRequest, SearchResults, UploadError, VisualSearch};

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    image_url: &'a str,
}

/// `POST /api/face-detect` response.
#[derive(Debug, Default, Deserialize)]
pub struct FaceDetectResponse {
    #[serde(default)]
    pub boxes: Vec<MarginBox>,
}

/// `POST /api/object-detect` response.
#[derive(Debug, Default, Deserialize)]
pub struct ObjectDetectResponse {
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: SearchResults,
}

#[derive(Debug, Serialize)]
struct EntryRequest<'a> {
    id: &'a str,
}

fn margin_region(b: MarginBox) -> Region {
    Region::from_box(ProviderBox {
        top_row: b.top_row,
        left_col: b.left_col,
        bottom_row: b.bottom_row,
        right_col: b.right_col,
    })
}

fn object_region(o: DetectedObject) -> Region {
    let b = o.bbox;
    Region::with_concept(
        ProviderBox {
            top_row: b.top_row,
            left_col: b.left_col,
            bottom_row: b.bottom_row,
            right_col: b.right_col,
        },
        o.name,
        o.confidence,
    )
}

/// Client for the detection, search and entry endpoints of the backend API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DetectionBackend for ApiClient {
    async fn detect(&self, model: ModelKind, source: &ImageSource) -> Result<Vec<Region>, DetectError> {
        let path = match model {
            ModelKind::Face => "/api/face-detect",
            ModelKind::Object => "/api/object-detect",
        };
        let image_url = source.to_image_url();
        debug!("POST {} for {}", path, source.describe());

        let response = self
            .http
            .post(self.url(path))
            .json(&DetectRequest { image_url: &image_url })
            .send()
            .await
            .map_err(|e| DetectError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| DetectError::Provider(e.to_string()))?;

        let regions = match model {
            ModelKind::Face => {
                let body: FaceDetectResponse = response
                    .json()
                    .await
                    .map_err(|e| DetectError::Provider(e.to_string()))?;
                body.boxes.into_iter().map(margin_region).collect()
            }
            ModelKind::Object => {
                let body: ObjectDetectResponse = response
                    .json()
                    .await
                    .map_err(|e| DetectError::Provider(e.to_string()))?;
                body.objects.into_iter().map(object_region).collect()
            }
        };
        Ok(regions)
    }
}

#[async_trait]
impl VisualSearch for ApiClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        if request.is_empty() {
            return Err(SearchError::MissingInput);
        }
        let body: SearchResponse = self
            .http
            .post(self.url("/api/search-image"))
            .json(request)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| SearchError::Provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| SearchError::Provider(e.to_string()))?;
        Ok(body.results)
    }
}

#[async_trait]
impl EntryCounter for ApiClient {
    async fn increment(&self, actor: &ActorId) -> Result<u64, CounterError> {
        self.http
            .put(self.url("/image"))
            .json(&EntryRequest { id: &actor.0 })
            .send()
            .await
            .map_err(|e| CounterError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| CounterError::Rejected(e.to_string()))?
            .json::<u64>()
            .await
            .map_err(|e| CounterError::Rejected(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

pub const IMGBB_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

/// imgbb-style host: multipart `image` field holding base64, key in the query.
#[derive(Debug, Clone)]
pub struct ImgbbHost {
    upload_url: String,
    api_key: Option<String>,
    http: Client,
}

impl ImgbbHost {
    pub fn new(upload_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            api_key,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbHost {
    async fn upload(&self, jpeg: &[u8]) -> Result<String, UploadError> {
        let key = self.api_key.as_deref().ok_or(UploadError::MissingKey)?;
        let form = reqwest::multipart::Form::new().text("image", STANDARD.encode(jpeg));

        let body: UploadResponse = self
            .http
            .post(&self.upload_url)
            .query(&[("key", key)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        match body {
            UploadResponse {
                success: true,
                data: Some(data),
            } => Ok(data.url),
            _ => Err(UploadError::Rejected),
        }
    }
}

/// Plain GET of the image bytes.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    http: Client,
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| LoadError::Fetch(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| LoadError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
