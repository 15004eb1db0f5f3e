pub mod engine;
pub mod filter;
pub mod normalize;
pub mod region;

pub use engine::{DetectError, DetectionBackend, ImageSource, ModelKind};
pub use filter::{
    filter_objects, map_faces, FilterOutcome, FilterPolicy, DEFAULT_BLOCKED_KEYWORDS,
    DEFAULT_MIN_CONFIDENCE,
};
pub use normalize::{normalize, normalize_box};
pub use region::{
    Concept, CornerBox, DetectedObject, MarginBox, PixelBox, ProviderBox, RawBox, Region,
    RegionData, RegionInfo, RenderSize,
};
