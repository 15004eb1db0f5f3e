//! # seekbox-rs
//!
//! Face and object detection overlays with click-to-search reverse image lookup.
//!
//! ## Features
//!
//! - **Detection**: faces, objects, or both concurrently, with confidence and keyword filtering
//! - **Normalization**: margin and corner-fraction boxes resolved to pixels for a rendered image
//! - **Crop search**: crop the clicked region, upload it, reverse-search it, and fall back to the
//!   full image when the crop finds nothing
//! - **Entry counting**: faces found for a signed-in user bump their entry count through a
//!   decoupled event listener
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use seekbox_rs::prelude::*;
//!
//! let api = Arc::new(ApiClient::new("http://localhost:3000"));
//! let orchestrator = DetectionOrchestrator::new(api.clone());
//! let source = ImageSource::parse("https://example.com/photo.jpg")?;
//! let result = orchestrator.detect(DetectionMode::Both, &source, None).await?;
//!
//! for b in render(&result, Some(RenderSize::new(500.0, 375.0))) {
//!     println!("{} at {:?}", b.label(), b.pixels);
//! }
//! ```

pub mod config;
pub mod crop;
pub mod crop_search;
pub mod detection;
pub mod entries;
pub mod http;
pub mod image_loader;
pub mod overlay;
pub mod search;

// Re-export commonly used types at the root level
pub use config::Config;
pub use crop::{crop_jpeg, crop_rect, CropError, CropRect, JPEG_QUALITY};
pub use crop_search::{
    CropSearchWorkflow, SearchMode, SearchOutcome, SearchPhase, SearchSession, SearchTarget, SessionId,
};
pub use detection::{
    event_channel, ActorId, DetectionEvent, DetectionMode, DetectionOrchestrator, DetectionResult,
    DetectionSummary, EventReceiver, EventSender,
};
pub use entries::{CounterError, EntryCounter, EntryCounterListener, ListenerReport};
pub use http::{ApiClient, HttpImageFetcher, ImgbbHost, IMGBB_UPLOAD_URL};
pub use image_loader::{
    ImageFetcher, ImageLoader, LoadError, SourceImage, IMAGE_LOAD_TIMEOUT, LOAD_FAILURE_MESSAGE,
};
pub use overlay::{find, render, BoxClick, RenderedBox, TargetKind};
pub use search::{
    ImageHost, SearchError, SearchHit, SearchRequest, SearchResults, UploadError, VisualSearch,
    MAX_DISPLAYED_RESULTS,
};
pub use seekbox_vision;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```ignore
/// use seekbox_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        event_channel, find, render, ActorId, ApiClient, BoxClick, Config, CropSearchWorkflow,
        DetectionEvent, DetectionMode, DetectionOrchestrator, DetectionResult, DetectionSummary,
        EntryCounter, EntryCounterListener, HttpImageFetcher, ImageFetcher, ImageHost, ImageLoader,
        ImgbbHost, LoadError, RenderedBox, SearchMode, SearchOutcome, SearchRequest, SearchResults,
        SearchSession, SearchTarget, SourceImage, TargetKind, VisualSearch,
    };
    pub use seekbox_vision::{
        DetectError, DetectionBackend, FilterPolicy, ImageSource, PixelBox, RawBox, RenderSize,
    };
}
