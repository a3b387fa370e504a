//! Adaptive frame pacing driven by the measured cost of writing escape output.
//!
//! Terminal write time scales with output length, so each render is reduced to a
//! per-character cost. The recent average of those costs predicts how long the
//! next write takes, and the inter-frame delay shrinks when rendering is expensive.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept for the running average.
pub const SAMPLE_WINDOW_CAPACITY: usize = 10;

/// Outputs shorter than this are too small to time reliably.
pub const MIN_SAMPLE_OUTPUT_LEN: usize = 256;

/// Upper bound on any wait so pause/seek stay responsive.
pub const MAX_FRAME_DELAY: Duration = Duration::from_millis(100);

const DELAY_SHRINK: f64 = 1.25;

/// Fixed-capacity ring of per-character render costs (seconds per character).
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    samples: VecDeque<f64>,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(SAMPLE_WINDOW_CAPACITY),
        }
    }

    /// Negative or non-finite samples are dropped.
    pub fn record(&mut self, sample: f64) {
        if !sample.is_finite() || sample < 0.0 {
            return;
        }
        if self.samples.len() == SAMPLE_WINDOW_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

/// `min(100ms, max(1000 / fps, estimated_cost) / 1.25)`.
///
/// A non-positive or non-finite fps contributes no minimum frame time.
pub fn frame_delay(target_fps: f64, estimated_cost: Duration) -> Duration {
    let frame_time = if target_fps.is_finite() && target_fps > 0.0 {
        1.0 / target_fps
    } else {
        0.0
    };
    let base = frame_time.max(estimated_cost.as_secs_f64());
    let delay = base / DELAY_SHRINK;
    if delay >= MAX_FRAME_DELAY.as_secs_f64() {
        MAX_FRAME_DELAY
    } else {
        Duration::from_secs_f64(delay.max(0.0))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PacingScheduler {
    window: SampleWindow,
}

impl PacingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Record how long writing `output_len` characters took. Returns whether a sample was kept.
    pub fn record_render(&mut self, elapsed: Duration, output_len: usize) -> bool {
        if output_len < MIN_SAMPLE_OUTPUT_LEN {
            return false;
        }
        self.window
            .record(elapsed.as_secs_f64() / output_len as f64);
        true
    }

    /// Predicted write time for an output of `output_len` characters.
    pub fn estimated_cost(&self, output_len: usize) -> Duration {
        match self.window.average() {
            Some(per_char) => Duration::from_secs_f64(per_char * output_len as f64),
            None => Duration::ZERO,
        }
    }

    /// Deadline for starting the next frame.
    ///
    /// The estimate uses the output just produced rather than the next frame's, so it
    /// trails actual cost by one frame.
    pub fn next_deadline(&self, render_start: Instant, target_fps: f64, output_len: usize) -> Instant {
        let delay = frame_delay(target_fps, self.estimated_cost(output_len));
        tracing::debug!(
            target: "pixterm::pacing",
            output_len,
            samples = self.window.len(),
            delay_us = delay.as_micros() as u64,
            "frame deadline"
        );
        render_start + delay
    }
}

/// Instantaneous frames-per-second from the gap between completed frames.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    last_frame_at: Instant,
}

impl FpsMeter {
    pub fn new(now: Instant) -> Self {
        Self { last_frame_at: now }
    }

    /// Mark a completed frame and return the rate since the previous one, floored to 0.1.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let gap = now.saturating_duration_since(self.last_frame_at);
        self.last_frame_at = now;
        fps_from_gap(gap)
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_frame_at = now;
    }
}

pub fn fps_from_gap(gap: Duration) -> f64 {
    let millis = gap.as_micros() as f64 / 1000.0;
    if millis <= 0.0 {
        return 0.0;
    }
    ((1000.0 / millis) * 10.0).floor() / 10.0
}

pub fn format_fps(fps: f64) -> String {
    format!("{fps:.1}fps")
}
