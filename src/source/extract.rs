//! Background frame extraction with `ffmpeg`, plus frame-rate probing with `ffprobe`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};

use super::directory::{is_frame_file_name, FRAME_PATTERN};
use crate::log_debug;

const EXTRACTION_POLL: Duration = Duration::from_millis(50);

/// Extraction status shared between the worker thread and the frame source.
#[derive(Debug, Default)]
pub struct ExtractionProgress {
    total: AtomicUsize,
    complete: AtomicBool,
}

impl ExtractionProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress for frames that already exist on disk.
    pub fn completed(total: usize) -> Self {
        let progress = Self::new();
        progress.finish(total);
        progress
    }

    pub fn finish(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.complete.store(true, Ordering::SeqCst);
    }

    pub fn total_frames(&self) -> usize {
        if self.is_complete() {
            self.total.load(Ordering::SeqCst)
        } else {
            0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::SeqCst)
    }
}

pub struct ExtractionJob {
    progress: Arc<ExtractionProgress>,
    cancel: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ExtractionJob {
    /// Start `ffmpeg -i <input> <dir>/frame%08d.png` on a worker thread.
    ///
    /// The total is published once ffmpeg exits; a failed run publishes whatever
    /// frames it managed to write. Dropping the job kills a still-running ffmpeg.
    pub fn spawn(ffmpeg_cmd: &str, input: &Path, dir: &Path) -> Result<Self> {
        let mut child = Command::new(ffmpeg_cmd)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-nostdin")
            .arg("-i")
            .arg(input)
            .arg(dir.join(FRAME_PATTERN))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {ffmpeg_cmd}"))?;

        let progress = Arc::new(ExtractionProgress::new());
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_progress = Arc::clone(&progress);
        let worker_cancel = Arc::clone(&cancel);
        let dir = dir.to_path_buf();
        let handle = thread::Builder::new()
            .name("pixterm-extract".to_owned())
            .spawn(move || {
                let started = Instant::now();
                loop {
                    if worker_cancel.load(Ordering::SeqCst) {
                        let _ = child.kill();
                        let _ = child.wait();
                        log_debug("extraction cancelled");
                        break;
                    }
                    match child.try_wait() {
                        Ok(Some(status)) => {
                            if !status.success() {
                                log_debug(&format!("ffmpeg exited with {status}"));
                            }
                            break;
                        }
                        Ok(None) => thread::sleep(EXTRACTION_POLL),
                        Err(err) => {
                            log_debug(&format!("ffmpeg wait failed: {err}"));
                            break;
                        }
                    }
                }
                let total = count_frame_files(&dir).unwrap_or_else(|err| {
                    log_debug(&format!("failed to count frames: {err:#}"));
                    0
                });
                log_debug(&format!(
                    "extraction finished: {total} frames in {} ms",
                    started.elapsed().as_millis()
                ));
                tracing::info!(target: "pixterm::extract", total, "extraction finished");
                worker_progress.finish(total);
            })
            .context("failed to spawn extraction thread")?;

        Ok(Self {
            progress,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn progress(&self) -> Arc<ExtractionProgress> {
        Arc::clone(&self.progress)
    }
}

impl Drop for ExtractionJob {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Count `frame*.png` files in `dir`.
pub fn count_frame_files(dir: &Path) -> Result<usize> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    let mut count = 0;
    for entry in entries {
        let name = entry?.file_name();
        if is_frame_file_name(&name.to_string_lossy()) {
            count += 1;
        }
    }
    Ok(count)
}

/// Parse an `r_frame_rate` value such as `30000/1001` or `25`.
pub fn parse_frame_rate(text: &str) -> Option<f64> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let rate = match line.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => line.parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Ask `ffprobe` for the first video stream's frame rate.
pub fn probe_frame_rate(ffprobe_cmd: &str, input: &Path) -> Result<f64> {
    let output = Command::new(ffprobe_cmd)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            "-show_entries",
            "stream=r_frame_rate",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run {ffprobe_cmd}"))?;
    if !output.status.success() {
        bail!("{ffprobe_cmd} exited with {}", output.status);
    }
    let text = String::from_utf8_lossy(&output.stdout);
    parse_frame_rate(&text).ok_or_else(|| anyhow!("unrecognized frame rate {:?}", text.trim()))
}

pub fn default_frames_dir(base: &Path, unix_millis: u128) -> PathBuf {
    base.join(format!("frames-{unix_millis}"))
}
