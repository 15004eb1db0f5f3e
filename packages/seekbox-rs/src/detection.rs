//! Runs face and/or object detection for one image and merges the results.
//!
//! The orchestrator never touches account state directly. When faces are found
//! for a known actor it emits a [`DetectionEvent`]; the
//! [`EntryCounterListener`](crate::entries::EntryCounterListener) turns that
//! into a counter increment.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use seekbox_vision::{
    filter_objects, map_faces, DetectError, DetectedObject, DetectionBackend, FilterPolicy,
    ImageSource, MarginBox, ModelKind,
};

/// Which detections a request asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    Faces,
    Objects,
    #[default]
    Both,
}

impl DetectionMode {
    pub fn includes_faces(self) -> bool {
        matches!(self, Self::Faces | Self::Both)
    }

    pub fn includes_objects(self) -> bool {
        matches!(self, Self::Objects | Self::Both)
    }
}

/// Identity of the signed-in user whose entry counter is bumped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Merged output for one image. Replaced wholesale by the next request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub faces: Vec<MarginBox>,
    pub objects: Vec<DetectedObject>,
}

impl DetectionResult {
    pub fn summary(&self) -> DetectionSummary {
        DetectionSummary {
            faces: self.faces.len(),
            objects: self.objects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.objects.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectionSummary {
    pub faces: usize,
    pub objects: usize,
}

impl fmt::Display for DetectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn plural(n: usize, word: &str) -> String {
            format!("{n} {word}{}", if n == 1 { "" } else { "s" })
        }
        match (self.faces, self.objects) {
            (0, 0) => f.write_str("nothing detected"),
            (faces, 0) => f.write_str(&plural(faces, "face")),
            (0, objects) => f.write_str(&plural(objects, "object")),
            (faces, objects) => write!(f, "{} • {}", plural(faces, "face"), plural(objects, "object")),
        }
    }
}

/// Side-channel notifications raised by a completed detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionEvent {
    FacesDetected { actor: ActorId, faces: usize },
}

pub type EventSender = mpsc::UnboundedSender<DetectionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DetectionEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub struct DetectionOrchestrator {
    backend: Arc<dyn DetectionBackend>,
    policy: FilterPolicy,
    events: Option<EventSender>,
}

impl DetectionOrchestrator {
    pub fn new(backend: Arc<dyn DetectionBackend>) -> Self {
        Self {
            backend,
            policy: FilterPolicy::default(),
            events: None,
        }
    }

    pub fn with_policy(mut self, policy: FilterPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Detects according to `mode`.
    ///
    /// In [`DetectionMode::Both`] the two provider calls run concurrently and a
    /// failure of either fails the whole request.
    pub async fn detect(
        &self,
        mode: DetectionMode,
        source: &ImageSource,
        actor: Option<&ActorId>,
    ) -> Result<DetectionResult, DetectError> {
        if source.is_empty() {
            return Err(DetectError::MissingInput);
        }
        info!("detecting {:?} in {}", mode, source.describe());

        let result = match mode {
            DetectionMode::Faces => DetectionResult {
                faces: self.detect_faces(source).await?,
                objects: Vec::new(),
            },
            DetectionMode::Objects => DetectionResult {
                faces: Vec::new(),
                objects: self.detect_objects(source).await?,
            },
            DetectionMode::Both => {
                let (faces, objects) =
                    tokio::try_join!(self.detect_faces(source), self.detect_objects(source))?;
                DetectionResult { faces, objects }
            }
        };

        info!(
            faces = result.faces.len(),
            objects = result.objects.len(),
            "detection finished"
        );

        if mode.includes_faces() && !result.faces.is_empty() {
            if let Some(actor) = actor {
                self.notify(DetectionEvent::FacesDetected {
                    actor: actor.clone(),
                    faces: result.faces.len(),
                });
            }
        }

        Ok(result)
    }

    async fn detect_faces(&self, source: &ImageSource) -> Result<Vec<MarginBox>, DetectError> {
        let regions = self.backend.detect(ModelKind::Face, source).await?;
        Ok(map_faces(&regions))
    }

    async fn detect_objects(&self, source: &ImageSource) -> Result<Vec<DetectedObject>, DetectError> {
        let regions = self.backend.detect(ModelKind::Object, source).await?;
        Ok(filter_objects(&regions, &self.policy).objects)
    }

    fn notify(&self, event: DetectionEvent) {
        match &self.events {
            Some(tx) => {
                if tx.send(event).is_err() {
                    warn!("detection event dropped: no listener");
                }
            }
            None => debug!("no event sink configured, skipping {:?}", event),
        }
    }
}
