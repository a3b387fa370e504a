use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::{PositionedFrame, Viewport};
use crate::frame::FrameBuffer;

/// Largest size with the source aspect ratio that fits in `viewport`.
pub fn fit_dimensions(src_width: u32, src_height: u32, viewport: Viewport) -> (u32, u32) {
    if src_width == 0 || src_height == 0 || viewport.is_empty() {
        return (0, 0);
    }
    let (src_w, src_h) = (u64::from(src_width), u64::from(src_height));
    let (view_w, view_h) = (viewport.width as u64, viewport.height as u64);
    let (width, height) = if view_w * src_h <= view_h * src_w {
        (view_w, src_h * view_w / src_w)
    } else {
        (src_w * view_h / src_h, view_h)
    };
    let width = width.clamp(1, u64::from(u32::MAX)) as u32;
    let height = height.clamp(1, u64::from(u32::MAX)) as u32;
    (width, height)
}

pub fn scale_to_viewport(image: &RgbaImage, viewport: Viewport) -> PositionedFrame {
    let (width, height) = fit_dimensions(image.width(), image.height(), viewport);
    if width == 0 || height == 0 {
        return PositionedFrame {
            frame: FrameBuffer::empty(),
            offset_x: 0,
        };
    }
    let scaled = if (width, height) == image.dimensions() {
        image.clone()
    } else {
        imageops::resize(image, width, height, FilterType::Triangle)
    };
    PositionedFrame {
        frame: FrameBuffer::from_image(scaled),
        offset_x: viewport.width.saturating_sub(width as usize) / 2,
    }
}

pub fn decode_scaled(path: &Path, viewport: Viewport) -> Result<PositionedFrame> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgba8();
    Ok(scale_to_viewport(&image, viewport))
}
