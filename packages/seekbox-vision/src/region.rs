use serde::{Deserialize, Deserializer, Serialize};

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Bounding box exactly as the vision provider reports it.
///
/// Absent or null edges read as `0.0` so a partial payload never fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBox {
    #[serde(default, deserialize_with = "zero_if_null")]
    pub top_row: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub left_col: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub bottom_row: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub right_col: f64,
}

/// One ranked label attached to a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    #[serde(alias = "confidence", default)]
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionInfo {
    #[serde(default)]
    pub bounding_box: Option<ProviderBox>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionData {
    #[serde(default)]
    pub concepts_list: Vec<Concept>,
}

/// A single detected area, ordered concepts first-is-best.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(default)]
    pub region_info: Option<RegionInfo>,
    #[serde(default)]
    pub data: Option<RegionData>,
}

impl Region {
    /// A region with a box and no concepts, the shape face models return.
    pub fn from_box(bounding_box: ProviderBox) -> Self {
        Self {
            region_info: Some(RegionInfo {
                bounding_box: Some(bounding_box),
            }),
            data: None,
        }
    }

    pub fn with_concept(bounding_box: ProviderBox, name: impl Into<String>, value: f64) -> Self {
        Self {
            region_info: Some(RegionInfo {
                bounding_box: Some(bounding_box),
            }),
            data: Some(RegionData {
                concepts_list: vec![Concept {
                    name: name.into(),
                    value,
                }],
            }),
        }
    }

    pub fn bounding_box(&self) -> ProviderBox {
        self.region_info
            .as_ref()
            .and_then(|info| info.bounding_box)
            .unwrap_or_default()
    }

    pub fn concepts(&self) -> &[Concept] {
        self.data
            .as_ref()
            .map(|data| data.concepts_list.as_slice())
            .unwrap_or(&[])
    }

    pub fn top_concept(&self) -> Option<&Concept> {
        self.concepts().first()
    }
}

/// Margin encoding: `bottom_row` and `right_col` measure inward from the far edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginBox {
    pub top_row: f64,
    pub left_col: f64,
    pub bottom_row: f64,
    pub right_col: f64,
}

/// Corner-fraction encoding: both corners as fractions of the image size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerBox {
    pub top_row: f64,
    pub left_col: f64,
    pub bottom_row: f64,
    pub right_col: f64,
}

impl From<ProviderBox> for MarginBox {
    fn from(b: ProviderBox) -> Self {
        Self {
            top_row: b.top_row,
            left_col: b.left_col,
            bottom_row: b.bottom_row,
            right_col: b.right_col,
        }
    }
}

impl From<ProviderBox> for CornerBox {
    fn from(b: ProviderBox) -> Self {
        Self {
            top_row: b.top_row,
            left_col: b.left_col,
            bottom_row: b.bottom_row,
            right_col: b.right_col,
        }
    }
}

/// Upstream geometry tagged with its encoding. Only the normalizer looks inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawBox {
    Margin(MarginBox),
    Corner(CornerBox),
}

/// Resolved rectangle in pixels of the rendered image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// On-screen size of the image the boxes are drawn over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSize {
    pub width: f64,
    pub height: f64,
}

impl RenderSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// False until both dimensions are known and positive.
    pub fn is_renderable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// An object that survived filtering. Serializes flat, matching the detection API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(flatten)]
    pub bbox: CornerBox,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_box_defaults_missing_and_null_edges() {
        let b: ProviderBox = serde_json::from_str(r#"{"topRow": 0.25, "rightCol": null}"#).unwrap();
        assert_eq!(b.top_row, 0.25);
        assert_eq!(b.left_col, 0.0);
        assert_eq!(b.right_col, 0.0);
    }

    #[test]
    fn region_without_info_has_zero_box() {
        let region: Region = serde_json::from_str("{}").unwrap();
        assert_eq!(region.bounding_box(), ProviderBox::default());
        assert!(region.top_concept().is_none());
    }

    #[test]
    fn region_parses_provider_payload() {
        let json = r#"{
            "regionInfo": {"boundingBox": {"topRow": 0.1, "leftCol": 0.2, "bottomRow": 0.5, "rightCol": 0.6}},
            "data": {"conceptsList": [{"name": "Cup", "value": 0.93}, {"name": "Mug", "value": 0.4}]}
        }"#;
        let region: Region = serde_json::from_str(json).unwrap();
        assert_eq!(region.bounding_box().right_col, 0.6);
        assert_eq!(region.top_concept().map(|c| c.name.as_str()), Some("Cup"));
        assert_eq!(region.concepts().len(), 2);
    }

    #[test]
    fn detected_object_uses_flat_wire_shape() {
        let json = r#"{"name": "bottle", "confidence": 0.8, "top_row": 0.1, "left_col": 0.2}"#;
        let obj: DetectedObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.bbox.top_row, 0.1);
        assert_eq!(obj.bbox.bottom_row, 0.0);

        let back = serde_json::to_value(&obj).unwrap();
        assert_eq!(back["right_col"], 0.0);
        assert_eq!(back["name"], "bottle");
    }

    #[test]
    fn render_size_needs_positive_dimensions() {
        assert!(RenderSize::new(500.0, 400.0).is_renderable());
        assert!(!RenderSize::new(0.0, 400.0).is_renderable());
        assert!(!RenderSize::new(500.0, f64::NAN).is_renderable());
    }
}
