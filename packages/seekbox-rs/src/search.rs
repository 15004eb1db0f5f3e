//! Boundaries of the visual search and image hosting services.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The result panel never shows more than this many items.
pub const MAX_DISPLAYED_RESULTS: usize = 12;

/// Body of a search call. Reverse search when `image_url` is set, text search
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub image_url: Option<String>,
    pub query: Option<String>,
}

impl SearchRequest {
    pub fn reverse(image_url: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            query: None,
        }
    }

    pub fn text(query: impl Into<String>) -> Self {
        Self {
            image_url: None,
            query: Some(query.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.image_url) && blank(&self.query)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchHit {
    pub title: Option<String>,
    pub link: Option<String>,
    pub thumbnail: Option<String>,
    pub source: Option<String>,
}

/// Provider payload; reverse searches fill `visual_matches`, text searches
/// fill `images_results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    pub visual_matches: Option<Vec<SearchHit>>,
    pub images_results: Option<Vec<SearchHit>>,
}

impl SearchResults {
    pub fn match_count(&self) -> usize {
        self.visual_matches.as_ref().map_or(0, Vec::len)
    }

    pub fn has_matches(&self) -> bool {
        self.match_count() > 0
    }

    /// Visual matches when there are any, else image results, capped.
    pub fn display_items(&self) -> &[SearchHit] {
        let items = match (&self.visual_matches, &self.images_results) {
            (Some(matches), _) if !matches.is_empty() => matches.as_slice(),
            (_, Some(images)) => images.as_slice(),
            _ => &[],
        };
        &items[..items.len().min(MAX_DISPLAYED_RESULTS)]
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("image url or query required")]
    MissingInput,
    #[error("search failed: {0}")]
    Provider(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait VisualSearch: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, SearchError>;
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image host api key not configured")]
    MissingKey,
    #[error("image host rejected the upload")]
    Rejected,
    #[error("transport error: {0}")]
    Transport(String),
}

/// Temporary public hosting for cropped images.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads a JPEG and returns its public URL.
    async fn upload(&self, jpeg: &[u8]) -> Result<String, UploadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(n: usize) -> Vec<SearchHit> {
        (0..n)
            .map(|i| SearchHit {
                title: Some(format!("hit {i}")),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn request_serializes_camel_case() {
        let body = serde_json::to_value(SearchRequest::reverse("https://x/y.jpg")).unwrap();
        assert_eq!(body["imageUrl"], "https://x/y.jpg");
        assert!(body["query"].is_null());
        assert!(SearchRequest::text("  ").is_empty());
        assert!(!SearchRequest::text("cup").is_empty());
    }

    #[test]
    fn parses_partial_provider_payload() {
        let json = r#"{"visual_matches": [{"title": "A", "link": "https://a"}], "search_metadata": {"id": "x"}}"#;
        let results: SearchResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.match_count(), 1);
        assert!(results.images_results.is_none());
        assert_eq!(results.display_items()[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn display_prefers_visual_matches_and_caps() {
        let results = SearchResults {
            visual_matches: Some(hits(20)),
            images_results: Some(hits(3)),
        };
        assert_eq!(results.display_items().len(), MAX_DISPLAYED_RESULTS);

        let text = SearchResults {
            visual_matches: Some(vec![]),
            images_results: Some(hits(3)),
        };
        assert!(!text.has_matches());
        assert_eq!(text.display_items().len(), 3);

        assert!(SearchResults::default().display_items().is_empty());
    }
}
