//! Frame sources: where decoded, viewport-sized frames come from.

mod directory;
mod extract;
mod scale;
mod still;

use anyhow::Result;

use crate::frame::FrameBuffer;

pub use directory::{frame_file_name, frame_path, is_frame_file_name, DirectoryFrameSource};
pub use extract::{
    count_frame_files, default_frames_dir, parse_frame_rate, probe_frame_rate, ExtractionJob,
    ExtractionProgress,
};
pub use scale::{decode_scaled, fit_dimensions, scale_to_viewport};
pub use still::StillImage;

/// Drawable area measured in pixels (one pixel = two terminal columns, one row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Video playback keeps one spare column pair and one spare row.
    pub fn for_video(cols: u16, rows: u16) -> Self {
        Self {
            width: (usize::from(cols) / 2).saturating_sub(1),
            height: usize::from(rows).saturating_sub(1),
        }
    }

    /// Still images use nearly the whole screen.
    pub fn for_still(cols: u16, rows: u16) -> Self {
        Self {
            width: usize::from(cols) / 2,
            height: usize::from(rows) * 99 / 100,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A frame plus the horizontal offset (in pixels) that centers it in the viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedFrame {
    pub frame: FrameBuffer,
    pub offset_x: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameFetch {
    Ready(PositionedFrame),
    /// The frame has not been produced yet; ask again later.
    Pending,
}

pub trait FrameSource {
    /// Fetch frame `index` (1-based) scaled to fit `viewport`.
    fn fetch(&mut self, index: usize, viewport: Viewport) -> Result<FrameFetch>;

    /// Total frame count, `0` while still unknown.
    fn total_frames(&self) -> usize;

    /// Whether the total is final and no more frames will appear.
    fn is_complete(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_viewport_reserves_margin() {
        assert_eq!(Viewport::for_video(80, 24), Viewport::new(39, 23));
        assert!(Viewport::for_video(1, 1).is_empty());
    }

    #[test]
    fn still_viewport_uses_most_rows() {
        assert_eq!(Viewport::for_still(80, 100), Viewport::new(40, 99));
        assert_eq!(Viewport::for_still(81, 24), Viewport::new(40, 23));
    }
}
