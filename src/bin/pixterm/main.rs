//! pixterm entrypoint: plays a video (or shows an image) as truecolor blocks.
//!
//! # Architecture
//!
//! - Extraction worker: ffmpeg writes numbered PNG frames into a directory
//! - Input thread: reads raw stdin and sends decoded key commands
//! - Main thread: the playback loop, which owns all playback state

mod input;
mod video;

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use pixterm::config::AppConfig;
use pixterm::keys::KeyCommand;
use pixterm::playback::{show_still, Player};
use pixterm::source::{DirectoryFrameSource, ExtractionJob, StillImage};
use pixterm::terminal::{StdoutSink, TerminalSink};
use pixterm::terminal_restore::install_terminal_panic_hook;
use pixterm::{init_logging, init_tracing, log_debug, log_debug_content, log_file_path};

use crate::input::spawn_input_thread;
use crate::video::{resolve_fps, FramesDir};

/// Max pending key commands before the input thread blocks.
const INPUT_CHANNEL_CAPACITY: usize = 64;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);
    install_terminal_panic_hook();
    log_debug("=== pixterm started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));
    log_debug_content(&format!("input: {}", config.input.display()));

    let (tx, rx) = bounded(INPUT_CHANNEL_CAPACITY);
    let result = if config.is_image() {
        run_image(&config, tx, rx)
    } else {
        run_video(&config, tx, rx)
    };
    if let Err(err) = &result {
        log_debug(&format!("pixterm failed: {err:#}"));
    }
    log_debug("=== pixterm exiting ===");
    result
}

fn run_image(config: &AppConfig, tx: Sender<KeyCommand>, rx: Receiver<KeyCommand>) -> Result<()> {
    // Decode before touching the terminal so a bad file fails on a normal screen.
    let image = StillImage::open(&config.input)?;
    let mut sink = StdoutSink::new();
    sink.on_enter()?;
    let _input = spawn_input_thread(tx);
    let shown = show_still(image, &mut sink, &rx, &config.display_name());
    let exited = sink.on_exit();
    shown.and(exited)
}

fn run_video(config: &AppConfig, tx: Sender<KeyCommand>, rx: Receiver<KeyCommand>) -> Result<()> {
    let fps = resolve_fps(config);
    let frames = FramesDir::prepare(config)?;
    let played = play_video(config, &frames, fps, tx, rx);
    if !config.keep_frames {
        if let Err(err) = frames.cleanup() {
            log_debug(&format!("frame cleanup failed: {err:#}"));
        }
    }
    played
}

fn play_video(
    config: &AppConfig,
    frames: &FramesDir,
    fps: f64,
    tx: Sender<KeyCommand>,
    rx: Receiver<KeyCommand>,
) -> Result<()> {
    let job = ExtractionJob::spawn(&config.ffmpeg_cmd, &config.input, frames.path())?;
    let source = DirectoryFrameSource::new(frames.path(), job.progress());
    let mut sink = StdoutSink::new();
    sink.on_enter()?;
    let _input = spawn_input_thread(tx);

    let mut player = Player::new(source, sink, rx, fps);
    let played = player.run();
    let exited = player.sink_mut().on_exit();
    // Stops a still-running ffmpeg before the frames directory is removed.
    drop(job);
    played.and(exited)
}
