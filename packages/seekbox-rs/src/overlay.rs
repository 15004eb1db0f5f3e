//! Clickable boxes drawn over the rendered image.
use serde::{Deserialize, Serialize};

use seekbox_vision::{normalize, PixelBox, RawBox, RenderSize};

use crate::detection::DetectionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Face,
    Object,
}

/// One overlay box, numbered per kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBox {
    pub kind: TargetKind,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub pixels: PixelBox,
}

impl RenderedBox {
    pub fn label(&self) -> String {
        match self.kind {
            TargetKind::Face => format!("Face {}", self.index + 1),
            TargetKind::Object => format!(
                "{} {}%",
                self.name.as_deref().unwrap_or("object"),
                (self.confidence.unwrap_or_default() * 100.0).round()
            ),
        }
    }

    pub fn click(&self) -> BoxClick {
        BoxClick {
            kind: self.kind,
            index: self.index,
            object_name: self.name.clone(),
            pixels: self.pixels,
        }
    }
}

/// A user click on an overlay box; starts a search session.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxClick {
    pub kind: TargetKind,
    pub index: usize,
    pub object_name: Option<String>,
    pub pixels: PixelBox,
}

impl BoxClick {
    pub fn query(&self) -> String {
        match self.kind {
            TargetKind::Face => "Similar Face".to_string(),
            TargetKind::Object => self.object_name.clone().unwrap_or_default(),
        }
    }
}

/// Faces first, then objects. Empty until `size` is known.
pub fn render(result: &DetectionResult, size: Option<RenderSize>) -> Vec<RenderedBox> {
    let face_boxes: Vec<RawBox> = result.faces.iter().copied().map(RawBox::Margin).collect();
    let object_boxes: Vec<RawBox> = result.objects.iter().map(|o| RawBox::Corner(o.bbox)).collect();

    let faces = normalize(&face_boxes, size)
        .into_iter()
        .enumerate()
        .map(|(index, pixels)| RenderedBox {
            kind: TargetKind::Face,
            index,
            name: None,
            confidence: None,
            pixels,
        });

    let objects = normalize(&object_boxes, size)
        .into_iter()
        .zip(&result.objects)
        .enumerate()
        .map(|(index, (pixels, object))| RenderedBox {
            kind: TargetKind::Object,
            index,
            name: Some(object.name.clone()),
            confidence: Some(object.confidence),
            pixels,
        });

    faces.chain(objects).collect()
}

/// Finds the `index`-th box of `kind`.
pub fn find(boxes: &[RenderedBox], kind: TargetKind, index: usize) -> Option<&RenderedBox> {
    boxes.iter().find(|b| b.kind == kind && b.index == index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seekbox_vision::{CornerBox, DetectedObject, MarginBox};

    fn result() -> DetectionResult {
        DetectionResult {
            faces: vec![MarginBox {
                top_row: 0.1,
                left_col: 0.2,
                bottom_row: 0.1,
                right_col: 0.2,
            }],
            objects: vec![DetectedObject {
                name: "bicycle".into(),
                confidence: 0.9132,
                bbox: CornerBox {
                    top_row: 0.5,
                    left_col: 0.0,
                    bottom_row: 1.0,
                    right_col: 0.5,
                },
            }],
        }
    }

    #[test]
    fn renders_faces_then_objects() {
        let boxes = render(&result(), Some(RenderSize::new(500.0, 400.0)));
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].label(), "Face 1");
        assert_eq!(boxes[0].pixels.left, 100.0);
        assert_eq!(boxes[1].label(), "bicycle 91%");
        assert_eq!(boxes[1].pixels.top, 200.0);
        assert_eq!(boxes[1].pixels.width, 250.0);
    }

    #[test]
    fn nothing_before_the_image_renders() {
        assert!(render(&result(), None).is_empty());
    }

    #[test]
    fn clicks_carry_query_and_pixels() {
        let boxes = render(&result(), Some(RenderSize::new(500.0, 400.0)));
        let face = find(&boxes, TargetKind::Face, 0).unwrap().click();
        assert_eq!(face.query(), "Similar Face");
        let object = find(&boxes, TargetKind::Object, 0).unwrap().click();
        assert_eq!(object.query(), "bicycle");
        assert_eq!(object.pixels, boxes[1].pixels);
        assert!(find(&boxes, TargetKind::Object, 1).is_none());
    }
}
