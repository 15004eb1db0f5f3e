//! Converts both upstream box encodings into [`PixelBox`]es for one rendered image.
use crate::region::{MarginBox, PixelBox, RawBox, RenderSize};

/// Normalizes every box against `size`.
///
/// An unknown or zero-sized render yields no boxes: the image simply is not
/// drawable yet.
pub fn normalize(boxes: &[RawBox], size: Option<RenderSize>) -> Vec<PixelBox> {
    match size {
        Some(size) if size.is_renderable() => boxes.iter().map(|b| normalize_box(b, size)).collect(),
        _ => Vec::new(),
    }
}

/// Normalizes a single box. `size` must be renderable.
pub fn normalize_box(raw: &RawBox, size: RenderSize) -> PixelBox {
    let (w, h) = (size.width, size.height);
    match raw {
        RawBox::Margin(b) => {
            let left = b.left_col * w;
            let top = b.top_row * h;
            clamp(left, top, w - left - b.right_col * w, h - top - b.bottom_row * h, size)
        }
        RawBox::Corner(b) => clamp(
            b.left_col * w,
            b.top_row * h,
            (b.right_col - b.left_col) * w,
            (b.bottom_row - b.top_row) * h,
            size,
        ),
    }
}

fn bounded(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max.max(0.0))
    }
}

fn clamp(left: f64, top: f64, width: f64, height: f64, size: RenderSize) -> PixelBox {
    let left = bounded(left, size.width);
    let top = bounded(top, size.height);
    PixelBox {
        left,
        top,
        width: bounded(width, size.width - left),
        height: bounded(height, size.height - top),
    }
}

impl PixelBox {
    /// Re-expresses the rectangle as margins, so normalizing the result is a no-op.
    pub fn to_margin(&self, size: RenderSize) -> MarginBox {
        MarginBox {
            top_row: self.top / size.height,
            left_col: self.left / size.width,
            bottom_row: (size.height - self.top - self.height) / size.height,
            right_col: (size.width - self.left - self.width) / size.width,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::CornerBox;

    const EPS: f64 = 1e-9;

    fn assert_box(actual: PixelBox, expected: PixelBox) {
        assert!(
            (actual.left - expected.left).abs() < EPS
                && (actual.top - expected.top).abs() < EPS
                && (actual.width - expected.width).abs() < EPS
                && (actual.height - expected.height).abs() < EPS,
            "{actual:?} != {expected:?}"
        );
    }

    fn px(left: f64, top: f64, width: f64, height: f64) -> PixelBox {
        PixelBox {
            left,
            top,
            width,
            height,
        }
    }

    #[test]
    fn margin_form() {
        let raw = RawBox::Margin(MarginBox {
            top_row: 0.1,
            left_col: 0.2,
            bottom_row: 0.1,
            right_col: 0.2,
        });
        let out = normalize(&[raw], Some(RenderSize::new(500.0, 400.0)));
        assert_eq!(out.len(), 1);
        assert_box(out[0], px(100.0, 40.0, 300.0, 320.0));
    }

    #[test]
    fn corner_form() {
        let raw = RawBox::Corner(CornerBox {
            top_row: 0.1,
            left_col: 0.2,
            bottom_row: 0.5,
            right_col: 0.6,
        });
        let out = normalize(&[raw], Some(RenderSize::new(500.0, 400.0)));
        assert_box(out[0], px(100.0, 40.0, 200.0, 160.0));
    }

    #[test]
    fn unknown_size_yields_nothing() {
        let raw = RawBox::Corner(CornerBox::default());
        assert!(normalize(&[raw], None).is_empty());
        assert!(normalize(&[raw], Some(RenderSize::new(0.0, 300.0))).is_empty());
    }

    #[test]
    fn results_are_clamped_to_the_image() {
        let size = RenderSize::new(200.0, 100.0);
        let overhang = RawBox::Corner(CornerBox {
            top_row: -0.2,
            left_col: 0.9,
            bottom_row: 1.5,
            right_col: 1.4,
        });
        assert_box(normalize_box(&overhang, size), px(180.0, 0.0, 20.0, 100.0));

        let inverted = RawBox::Corner(CornerBox {
            top_row: 0.6,
            left_col: 0.6,
            bottom_row: 0.2,
            right_col: 0.2,
        });
        let b = normalize_box(&inverted, size);
        assert_eq!(b.width, 0.0);
        assert_eq!(b.height, 0.0);

        let outside = RawBox::Margin(MarginBox {
            top_row: 2.0,
            left_col: 2.0,
            bottom_row: 0.0,
            right_col: 0.0,
        });
        assert_box(normalize_box(&outside, size), px(200.0, 100.0, 0.0, 0.0));
    }

    #[test]
    fn zero_margins_cover_the_whole_image() {
        let size = RenderSize::new(640.0, 480.0);
        let b = normalize_box(&RawBox::Margin(MarginBox::default()), size);
        assert_box(b, px(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn renormalizing_a_pixel_box_is_a_no_op() {
        let size = RenderSize::new(500.0, 375.0);
        for original in [px(100.0, 40.0, 300.0, 320.0 - 25.0), px(0.0, 0.0, 500.0, 375.0), px(12.5, 7.25, 3.0, 1.0)] {
            let again = normalize_box(&RawBox::Margin(original.to_margin(size)), size);
            assert_box(again, original);
        }
    }

    #[test]
    fn deterministic() {
        let raw = [
            RawBox::Margin(MarginBox {
                top_row: 0.3,
                left_col: 0.1,
                bottom_row: 0.2,
                right_col: 0.4,
            }),
            RawBox::Corner(CornerBox {
                top_row: 0.05,
                left_col: 0.15,
                bottom_row: 0.55,
                right_col: 0.35,
            }),
        ];
        let size = Some(RenderSize::new(321.0, 123.0));
        assert_eq!(normalize(&raw, size), normalize(&raw, size));
    }
}
