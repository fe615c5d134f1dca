//! CPU-side decoded image payloads.
//!
//! Decoding happens during the concurrent load phase, before any GPU resource
//! exists. The GPU upload lives in [`crate::scene::texture`].

use anyhow::{Context as _, Result, bail};
use image::{ImageFormat, Rgb32FImage, RgbaImage};

/// A decoded static image, ready for upload as a color texture.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub image: RgbaImage,
    /// Upload as an sRGB texture format when set.
    pub srgb: bool,
    pub aspect: f32,
}

impl DecodedImage {
    pub fn decode(bytes: &[u8], srgb: bool, flip_y: bool, label: &str) -> Result<Self> {
        let mut img = image::load_from_memory(bytes)
            .with_context(|| format!("failed to decode image `{label}`"))?;
        if flip_y {
            img = img.flipv();
        }
        Ok(Self::from_rgba(img.to_rgba8(), srgb))
    }

    pub fn from_rgba(image: RgbaImage, srgb: bool) -> Self {
        let aspect = image.width() as f32 / image.height().max(1) as f32;
        Self {
            image,
            srgb,
            aspect,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// An equirectangular Radiance HDR environment map decoded to linear Rgb32F.
#[derive(Clone, Debug)]
pub struct EnvironmentMap {
    pub image: Rgb32FImage,
    pub aspect: f32,
}

impl EnvironmentMap {
    pub fn decode(bytes: &[u8], label: &str) -> Result<Self> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)
            .with_context(|| format!("failed to decode environment map `{label}`"))?;
        let image = img.to_rgb32f();
        if image.width() == 0 || image.height() == 0 {
            bail!("environment map `{label}` has zero size");
        }
        let aspect = image.width() as f32 / image.height() as f32;
        Ok(Self { image, aspect })
    }

    /// Mean radiance over the whole map. The viewer tints the ambient light
    /// with this so the room picks up the environment's overall hue.
    pub fn average_radiance(&self) -> [f32; 3] {
        let mut sum = [0.0f64; 3];
        for pixel in self.image.pixels() {
            sum[0] += pixel.0[0] as f64;
            sum[1] += pixel.0[1] as f64;
            sum[2] += pixel.0[2] as f64;
        }
        let count = (self.image.width() as f64 * self.image.height() as f64).max(1.0);
        [
            (sum[0] / count) as f32,
            (sum[1] / count) as f32,
            (sum[2] / count) as f32,
        ]
    }
}
