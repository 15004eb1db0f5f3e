use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder};
use thiserror::Error;

use seekbox_vision::{PixelBox, RenderSize};

pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error, PartialEq)]
pub enum CropError {
    #[error("crop region is empty")]
    EmptyRegion,
    #[error("rendered size is unknown")]
    NotRendered,
    #[error("failed to encode crop: {0}")]
    Encode(String),
}

/// Crop rectangle in the source image's own pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a box drawn over the rendered image onto the natural image, clamped to
/// its bounds.
pub fn crop_rect(pixels: &PixelBox, rendered: RenderSize, natural: (u32, u32)) -> Result<CropRect, CropError> {
    if !rendered.is_renderable() {
        return Err(CropError::NotRendered);
    }
    let (nat_w, nat_h) = natural;
    let sx = nat_w as f64 / rendered.width;
    let sy = nat_h as f64 / rendered.height;

    let x = (pixels.left.max(0.0) * sx).floor().min(nat_w as f64) as u32;
    let y = (pixels.top.max(0.0) * sy).floor().min(nat_h as f64) as u32;
    let width = (pixels.width.max(0.0) * sx).round().min((nat_w - x) as f64) as u32;
    let height = (pixels.height.max(0.0) * sy).round().min((nat_h - y) as f64) as u32;

    if width == 0 || height == 0 {
        return Err(CropError::EmptyRegion);
    }
    Ok(CropRect { x, y, width, height })
}

/// Cuts `rect` out of `image` and encodes it as JPEG.
pub fn crop_jpeg(image: &DynamicImage, rect: CropRect, quality: u8) -> Result<Vec<u8>, CropError> {
    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height).to_rgb8();
    let (width, height) = cropped.dimensions();
    if width == 0 || height == 0 {
        return Err(CropError::EmptyRegion);
    }

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(cropped.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| CropError::Encode(e.to_string()))?;
    Ok(buffer)
}
