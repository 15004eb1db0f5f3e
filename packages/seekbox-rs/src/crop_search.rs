//! Click-to-search: optional crop and upload, reverse search, and a single
//! uncropped retry when the crop finds nothing.
//!
//! Sessions are identified by a monotonically increasing [`SessionId`]. A new
//! click replaces the active session without cancelling the old one's network
//! calls; their results are dropped when they arrive.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use seekbox_vision::{ImageSource, RenderSize};

use crate::crop::{crop_jpeg, crop_rect, JPEG_QUALITY};
use crate::image_loader::{ImageLoader, SourceImage};
use crate::overlay::BoxClick;
use crate::search::{ImageHost, SearchRequest, SearchResults, VisualSearch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Search with only the clicked region.
    #[default]
    Crop,
    /// Always search with the whole image.
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SearchPhase {
    #[default]
    Idle,
    Cropping,
    Searching,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of the result panel for one click.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSession {
    pub id: SessionId,
    pub query: String,
    pub source_image_url: String,
    pub cropped_image_url: Option<String>,
    pub results: Option<SearchResults>,
    pub loading: bool,
    pub open: bool,
    pub phase: SearchPhase,
    pub started_at: DateTime<Utc>,
}

impl SearchSession {
    fn open(id: SessionId, query: String, source_image_url: String) -> Self {
        Self {
            id,
            query,
            source_image_url,
            cropped_image_url: None,
            results: None,
            loading: true,
            open: true,
            phase: SearchPhase::Idle,
            started_at: Utc::now(),
        }
    }
}

/// The image a click refers to and how to search it.
#[derive(Debug, Clone)]
pub struct SearchTarget {
    pub image: ImageSource,
    pub rendered: RenderSize,
    pub mode: SearchMode,
    /// Already decoded source; loaded on demand when absent.
    pub loaded: Option<Arc<SourceImage>>,
}

impl SearchTarget {
    pub fn new(image: ImageSource, rendered: RenderSize, mode: SearchMode) -> Self {
        Self {
            image,
            rendered,
            mode,
            loaded: None,
        }
    }

    pub fn with_loaded(mut self, loaded: Arc<SourceImage>) -> Self {
        self.loaded = Some(loaded);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Resolved(SearchResults),
    /// The search call errored; the panel was closed.
    Failed,
    /// A newer session took over before this one finished.
    Superseded,
}

pub struct CropSearchWorkflow {
    search: Arc<dyn VisualSearch>,
    host: Arc<dyn ImageHost>,
    loader: ImageLoader,
    jpeg_quality: u8,
    next_id: AtomicU64,
    active: Mutex<Option<SearchSession>>,
}

impl CropSearchWorkflow {
    pub fn new(search: Arc<dyn VisualSearch>, host: Arc<dyn ImageHost>, loader: ImageLoader) -> Self {
        Self {
            search,
            host,
            loader,
            jpeg_quality: JPEG_QUALITY,
            next_id: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Opens a session for `click` and runs it to completion.
    pub async fn on_click(&self, click: &BoxClick, target: &SearchTarget) -> SearchOutcome {
        let id = self.begin(click, target).await;
        self.execute(id, click, target).await
    }

    /// Opens a fresh session, replacing whatever was active.
    pub async fn begin(&self, click: &BoxClick, target: &SearchTarget) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let session = SearchSession::open(id, click.query(), target.image.to_image_url());
        info!(
            session = %id,
            "clicked {:?} box {} ({:?} mode)",
            click.kind,
            click.index,
            target.mode
        );
        *self.active.lock().await = Some(session);
        id
    }

    /// Crops (when asked), searches, and applies the results to session `id`
    /// if it is still the active one.
    pub async fn execute(&self, id: SessionId, click: &BoxClick, target: &SearchTarget) -> SearchOutcome {
        let source_url = target.image.to_image_url();

        let cropped = match target.mode {
            SearchMode::Crop => {
                self.update(id, |s| s.phase = SearchPhase::Cropping).await;
                match self.crop_and_upload(click, target).await {
                    Ok(url) => {
                        info!(session = %id, "using cropped image {}", url);
                        Some(url)
                    }
                    Err(e) => {
                        warn!(session = %id, "cropping failed, using full image: {:#}", e);
                        None
                    }
                }
            }
            SearchMode::Full => {
                debug!(session = %id, "crop mode disabled, using full image");
                None
            }
        };

        self.update(id, |s| {
            s.cropped_image_url = cropped.clone();
            s.phase = SearchPhase::Searching;
        })
        .await;

        let first_url = cropped.as_deref().unwrap_or(&source_url);
        let outcome = match self.search.search(&SearchRequest::reverse(first_url)).await {
            Ok(results) if cropped.is_some() && !results.has_matches() => {
                info!(session = %id, "no matches for cropped image, retrying with full image");
                self.search.search(&SearchRequest::reverse(&source_url)).await
            }
            other => other,
        };

        match outcome {
            Ok(results) => self.finish(id, Some(results)).await,
            Err(e) => {
                error!(session = %id, "search error: {}", e);
                self.finish(id, None).await
            }
        }
    }

    /// Closes the panel and forgets the active session.
    pub async fn close(&self) {
        if let Some(session) = self.active.lock().await.take() {
            debug!(session = %session.id, "search panel closed");
        }
    }

    /// Snapshot of the active session.
    pub async fn session(&self) -> Option<SearchSession> {
        self.active.lock().await.clone()
    }

    async fn crop_and_upload(&self, click: &BoxClick, target: &SearchTarget) -> Result<String> {
        let source = match &target.loaded {
            Some(loaded) => Arc::clone(loaded),
            None => Arc::new(self.loader.load(&target.image).await?),
        };
        let rect = crop_rect(&click.pixels, target.rendered, source.natural_size())?;
        let quality = self.jpeg_quality;
        let jpeg = tokio::task::spawn_blocking(move || crop_jpeg(&source.image, rect, quality)).await??;
        Ok(self.host.upload(&jpeg).await?)
    }

    async fn update(&self, id: SessionId, apply: impl FnOnce(&mut SearchSession)) {
        if let Some(session) = self.active.lock().await.as_mut().filter(|s| s.id == id) {
            apply(session);
        }
    }

    async fn finish(&self, id: SessionId, results: Option<SearchResults>) -> SearchOutcome {
        let mut active = self.active.lock().await;
        let Some(session) = active.as_mut().filter(|s| s.id == id) else {
            debug!(session = %id, "discarding results of superseded session");
            return SearchOutcome::Superseded;
        };

        session.loading = false;
        match results {
            Some(results) => {
                info!(
                    session = %id,
                    matches = results.match_count(),
                    elapsed_ms = (Utc::now() - session.started_at).num_milliseconds(),
                    "search resolved"
                );
                session.phase = SearchPhase::Resolved;
                session.results = Some(results.clone());
                SearchOutcome::Resolved(results)
            }
            None => {
                session.phase = SearchPhase::Failed;
                session.open = false;
                session.results = None;
                SearchOutcome::Failed
            }
        }
    }
}
