use crate::types::{EngineError, Result};
use image::GenericImageView;

/// Pixel dimensions of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// A decoded stamp image, ready to embed as an Image XObject
#[derive(Debug, Clone, PartialEq)]
pub struct StampImage {
    pub size: ImageSize,
    /// 8-bit RGB samples, row-major
    pub rgb: Vec<u8>,
    /// 8-bit alpha samples, present only for images with an alpha channel
    pub alpha: Option<Vec<u8>>,
}

impl StampImage {
    /// Decode PNG, JPEG or any other format the `image` crate recognizes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| EngineError::AppearanceRender(format!("cannot decode stamp image: {}", e)))?;

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(EngineError::AppearanceRender(
                "stamp image has no pixels".to_string(),
            ));
        }

        let alpha = if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            Some(rgba.pixels().map(|p| p.0[3]).collect())
        } else {
            None
        };

        log::debug!(
            "Decoded stamp image {}x{} (alpha: {})",
            width,
            height,
            alpha.is_some()
        );

        Ok(Self {
            size: ImageSize { width, height },
            rgb: img.to_rgb8().into_raw(),
            alpha,
        })
    }
}
