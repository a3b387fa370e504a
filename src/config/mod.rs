//! Command-line parsing and validation helpers.

mod validation;

use clap::Parser;
use std::path::PathBuf;

/// Frame rate used when `ffprobe` cannot tell us one.
pub const DEFAULT_FPS: f64 = 30.0;
pub const MAX_FPS: f64 = 240.0;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

/// CLI options for pixterm. Validated values keep the spawned ffmpeg/ffprobe safe.
#[derive(Debug, Parser, Clone)]
#[command(
    about = "pixterm: play videos and show images as colored blocks in the terminal",
    author,
    version
)]
pub struct AppConfig {
    /// Video or image file to show
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Target frames per second (defaults to the rate reported by ffprobe)
    #[arg(long)]
    pub fps: Option<f64>,

    /// Directory for extracted frames (defaults to ./frames-<timestamp>)
    #[arg(long = "frames-dir", value_name = "DIR")]
    pub frames_dir: Option<PathBuf>,

    /// Keep extracted frames on exit
    #[arg(long = "keep-frames", env = "PIXTERM_KEEP_FRAMES", default_value_t = false)]
    pub keep_frames: bool,

    /// Treat the input as a still image regardless of its extension
    #[arg(long = "image", default_value_t = false)]
    pub image: bool,

    /// ffmpeg binary used to extract frames
    #[arg(long = "ffmpeg-cmd", env = "PIXTERM_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg_cmd: String,

    /// ffprobe binary used to read the frame rate
    #[arg(long = "ffprobe-cmd", env = "PIXTERM_FFPROBE", default_value = "ffprobe")]
    pub ffprobe_cmd: String,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "PIXTERM_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "PIXTERM_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Allow logging file names and paths (debug log only)
    #[arg(
        long = "log-content",
        env = "PIXTERM_LOG_CONTENT",
        default_value_t = false
    )]
    pub log_content: bool,

    /// Enable per-frame timing logs
    #[arg(long)]
    pub log_timings: bool,
}

impl AppConfig {
    pub fn logging_enabled(&self) -> bool {
        (self.logs || self.log_timings) && !self.no_logs
    }

    /// Still-image mode: forced with `--image`, otherwise chosen by extension.
    pub fn is_image(&self) -> bool {
        if self.image {
            return true;
        }
        self.input
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Short name for titles: the file name without directories.
    pub fn display_name(&self) -> String {
        self.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Image".to_string())
    }
}
