use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

use super::scale::scale_to_viewport;
use super::{FrameFetch, FrameSource, Viewport};

/// A single decoded picture, rescaled on every fetch.
pub struct StillImage {
    image: RgbaImage,
}

impl StillImage {
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgba8();
        Ok(Self { image })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl FrameSource for StillImage {
    fn fetch(&mut self, _index: usize, viewport: Viewport) -> Result<FrameFetch> {
        Ok(FrameFetch::Ready(scale_to_viewport(&self.image, viewport)))
    }

    fn total_frames(&self) -> usize {
        1
    }

    fn is_complete(&self) -> bool {
        true
    }
}
