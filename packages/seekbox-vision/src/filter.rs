//! Confidence and keyword policy applied to raw provider regions.
use tracing::{debug, info};

use crate::region::{DetectedObject, MarginBox, Region};

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.75;

/// Human and body-part labels. Matched as lowercase substrings, so "arm" also
/// excludes "alarm".
pub const DEFAULT_BLOCKED_KEYWORDS: &[&str] = &[
    "human", "person", "people", "man", "woman", "boy", "girl", "face", "head", "hair", "eye",
    "nose", "mouth", "ear", "lip", "forehead", "cheek", "chin", "neck", "shoulder", "arm", "hand",
    "finger", "leg", "foot", "body", "skin", "portrait", "selfie", "facial", "profile",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FilterPolicy {
    pub min_confidence: f64,
    pub blocked_keywords: Vec<String>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            blocked_keywords: DEFAULT_BLOCKED_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl FilterPolicy {
    pub fn is_blocked(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.blocked_keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && name.contains(&keyword.to_lowercase()))
    }
}

/// Filtered objects plus the counts the provider handler reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub objects: Vec<DetectedObject>,
    pub kept: usize,
    pub filtered: usize,
}

fn round_confidence(confidence: f64) -> f64 {
    (confidence * 10_000.0).round() / 10_000.0
}

/// Keeps regions whose top concept clears the threshold and is not blocked.
///
/// Regions with no concepts are dropped without counting as filtered. Lower
/// ranked concepts are never consulted.
pub fn filter_objects(regions: &[Region], policy: &FilterPolicy) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for region in regions {
        let Some(concept) = region.top_concept() else {
            continue;
        };

        let confident = concept.value >= policy.min_confidence;
        if !confident || policy.is_blocked(&concept.name) {
            outcome.filtered += 1;
            continue;
        }

        debug!(
            "kept {} ({}%)",
            concept.name,
            (concept.value * 100.0).round()
        );
        outcome.objects.push(DetectedObject {
            name: concept.name.clone(),
            confidence: round_confidence(concept.value),
            bbox: region.bounding_box().into(),
        });
    }

    outcome.kept = outcome.objects.len();
    info!(
        kept = outcome.kept,
        filtered = outcome.filtered,
        "object regions filtered at {:.0}%+ confidence",
        policy.min_confidence * 100.0
    );
    outcome
}

/// Faces are trusted as-is.
pub fn map_faces(regions: &[Region]) -> Vec<MarginBox> {
    regions.iter().map(|r| r.bounding_box().into()).collect()
}
