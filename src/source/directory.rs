use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use super::extract::ExtractionProgress;
use super::scale::decode_scaled;
use super::{FrameFetch, FrameSource, Viewport};
use crate::log_debug;

/// ffmpeg output pattern matching `frame_file_name`.
pub(crate) const FRAME_PATTERN: &str = "frame%08d.png";

pub fn frame_file_name(index: usize) -> String {
    format!("frame{index:08}.png")
}

/// Whether `name` looks like an extracted frame (`frame*.png`).
pub fn is_frame_file_name(name: &str) -> bool {
    name.starts_with("frame") && name.ends_with(".png")
}

pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(frame_file_name(index))
}

/// Numbered PNG frames in a directory that an extraction job may still be filling.
pub struct DirectoryFrameSource {
    dir: PathBuf,
    progress: Arc<ExtractionProgress>,
}

impl DirectoryFrameSource {
    pub fn new(dir: impl Into<PathBuf>, progress: Arc<ExtractionProgress>) -> Self {
        Self {
            dir: dir.into(),
            progress,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSource for DirectoryFrameSource {
    fn fetch(&mut self, index: usize, viewport: Viewport) -> Result<FrameFetch> {
        let path = frame_path(&self.dir, index);
        // Read completion before probing the file so a frame written just before
        // completion is never mistaken for a missing one.
        let complete = self.progress.is_complete();
        if !path.is_file() {
            return Ok(FrameFetch::Pending);
        }
        match decode_scaled(&path, viewport) {
            Ok(positioned) => Ok(FrameFetch::Ready(positioned)),
            // ffmpeg may still be writing this file.
            Err(err) if !complete => {
                log_debug(&format!("frame {index} not decodable yet: {err:#}"));
                Ok(FrameFetch::Pending)
            }
            Err(err) => Err(err),
        }
    }

    fn total_frames(&self) -> usize {
        self.progress.total_frames()
    }

    fn is_complete(&self) -> bool {
        self.progress.is_complete()
    }
}
