//! The playback loop: fetch, overlay, diff, write, then wait for the pacing deadline
//! while applying key commands.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::diff::render_frame_stats;
use crate::frame::FrameBuffer;
use crate::help::format_help_panel;
use crate::keys::KeyCommand;
use crate::overlay::compose_overlay;
use crate::pacing::{format_fps, FpsMeter, PacingScheduler};
use crate::source::{FrameFetch, FrameSource, Viewport};
use crate::terminal::TerminalSink;
use crate::title::{waiting_title, TitleState, TITLE_FINISHED, TITLE_HELP, TITLE_PAUSED};
use crate::{log_debug, log_timing};

use super::state::{PlaybackState, Transition};

/// Poll interval while paused, in help, or after the video finished.
pub const IDLE_POLL: Duration = Duration::from_millis(5);
/// Retry interval while the next frame has not been extracted yet.
pub const PENDING_POLL: Duration = Duration::from_millis(50);

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A frame was written; the next one should start at `deadline`.
    Rendered { deadline: Instant, output_len: usize },
    /// Nothing was drawn; check again after the given interval.
    Idle(Duration),
    Exit,
}

pub struct Player<S, T> {
    source: S,
    sink: T,
    commands: Receiver<KeyCommand>,
    state: PlaybackState,
    title: TitleState,
    pacing: PacingScheduler,
    fps_meter: FpsMeter,
    last_frame: FrameBuffer,
    last_size: Option<(u16, u16)>,
}

impl<S: FrameSource, T: TerminalSink> Player<S, T> {
    pub fn new(source: S, sink: T, commands: Receiver<KeyCommand>, target_fps: f64) -> Self {
        Self {
            source,
            sink,
            commands,
            state: PlaybackState::new(target_fps),
            title: TitleState::new(),
            pacing: PacingScheduler::new(),
            fps_meter: FpsMeter::new(Instant::now()),
            last_frame: FrameBuffer::empty(),
            last_size: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut T {
        &mut self.sink
    }

    pub fn pacing(&self) -> &PacingScheduler {
        &self.pacing
    }

    /// Hand back the sink so the caller can run its exit hook.
    pub fn into_sink(self) -> T {
        self.sink
    }

    /// Play until the user quits. Errors from the frame source end playback.
    pub fn run(&mut self) -> Result<()> {
        log_debug(&format!(
            "playback started at {:.3} fps",
            self.state.target_fps
        ));
        loop {
            self.drain_commands()?;
            let wait_until = match self.step()? {
                Step::Exit => break,
                Step::Rendered { deadline, .. } => deadline,
                Step::Idle(interval) => Instant::now() + interval,
            };
            self.wait_until(wait_until)?;
            if self.state.exiting {
                break;
            }
        }
        log_debug(&format!(
            "playback stopped at frame {}",
            self.state.current_frame
        ));
        Ok(())
    }

    /// Apply one command and perform the screen work its transition asks for.
    pub fn handle_command(&mut self, command: KeyCommand) -> Result<Transition> {
        let transition = self.state.apply(command);
        match transition {
            Transition::Ignored | Transition::Exit => {}
            Transition::Paused => self.set_title(TITLE_PAUSED)?,
            Transition::Resumed => self.fps_meter.reset(Instant::now()),
            Transition::Seeked { frame } => {
                tracing::debug!(target: "pixterm::player", frame, "seek");
            }
            Transition::ClearScreen | Transition::CloseHelp => self.clear_screen()?,
            Transition::ShowHelp => self.draw_help()?,
        }
        Ok(transition)
    }

    /// One loop iteration: at most one frame is written.
    pub fn step(&mut self) -> Result<Step> {
        if self.state.exiting {
            return Ok(Step::Exit);
        }
        let (cols, rows) = self.sink.size()?;
        self.sync_size(cols, rows)?;
        self.sync_total();

        if self.state.help_open {
            return Ok(Step::Idle(IDLE_POLL));
        }
        if self.finished() && !self.state.refresh_pending {
            self.set_title(TITLE_FINISHED)?;
            return Ok(Step::Idle(IDLE_POLL));
        }
        if !self.state.wants_frame() {
            return Ok(Step::Idle(IDLE_POLL));
        }

        let viewport = Viewport::for_video(cols, rows);
        if viewport.is_empty() {
            return Ok(Step::Idle(PENDING_POLL));
        }

        let frame_start = Instant::now();
        let index = self.state.current_frame;
        let positioned = match self.source.fetch(index, viewport)? {
            FrameFetch::Ready(positioned) => positioned,
            FrameFetch::Pending => return self.frame_pending(index),
        };

        let overlaid = compose_overlay(&positioned.frame, index, self.state.total_frames);
        if !self.last_frame.is_empty() && !self.last_frame.same_dimensions(&overlaid) {
            self.sink.clear()?;
            self.state.force_full_redraw = true;
        }
        let empty = FrameBuffer::empty();
        let previous = if self.state.force_full_redraw {
            &empty
        } else {
            &self.last_frame
        };
        let rendered = render_frame_stats(&overlaid, previous, positioned.offset_x);
        // Samples measure terminal output only; decode and diff time stay out of them.
        let write_start = Instant::now();
        self.sink.write(&rendered.output)?;
        self.sink.flush()?;
        let elapsed = write_start.elapsed();
        let output_len = rendered.output.len();

        if !self.state.paused {
            let fps = self.fps_meter.tick(Instant::now());
            self.set_title(&format_fps(fps))?;
            self.state.advance();
        }
        let sampled = self.pacing.record_render(elapsed, output_len);
        log_timing(&format!(
            "frame {index}: {} changed px, {output_len} chars in {}us{}",
            rendered.changed_pixels,
            elapsed.as_micros(),
            if sampled { "" } else { " (not sampled)" }
        ));
        tracing::debug!(
            target: "pixterm::player",
            frame = index,
            changed_pixels = rendered.changed_pixels,
            output_len,
            elapsed_us = elapsed.as_micros() as u64,
            "frame rendered"
        );

        self.state.frame_rendered();
        self.last_frame = overlaid;
        let deadline = self
            .pacing
            .next_deadline(frame_start, self.state.target_fps, output_len);
        Ok(Step::Rendered {
            deadline,
            output_len,
        })
    }

    fn frame_pending(&mut self, index: usize) -> Result<Step> {
        if self.source.is_complete() {
            self.sync_total();
            if !self.state.total_known() || index > self.state.total_frames {
                self.state.current_frame = self.state.total_frames.max(1);
                self.state.ended = true;
                self.state.refresh_pending = false;
                return Ok(Step::Idle(IDLE_POLL));
            }
        }
        self.set_title(&waiting_title(index, unix_millis()))?;
        Ok(Step::Idle(PENDING_POLL))
    }

    /// Extraction finished and the last frame is on screen (or there were no frames at all).
    fn finished(&self) -> bool {
        self.source.is_complete() && (!self.state.total_known() || self.state.ended)
    }

    fn sync_total(&mut self) {
        let total = self.source.total_frames();
        if total == self.state.total_frames {
            return;
        }
        self.state.total_frames = total;
        // Playback already ran past the real end while the total was unknown.
        if total > 0 && self.state.current_frame > total {
            self.state.current_frame = total;
            self.state.ended = true;
        }
        log_debug(&format!("total frames known: {total}"));
    }

    fn sync_size(&mut self, cols: u16, rows: u16) -> Result<()> {
        let size = Some((cols, rows));
        if self.last_size == size {
            return Ok(());
        }
        let resized = self.last_size.is_some();
        self.last_size = size;
        if !resized {
            return Ok(());
        }
        log_debug(&format!("terminal resized to {cols}x{rows}"));
        if self.state.help_open {
            self.draw_help()
        } else {
            self.state.refresh_pending = true;
            self.clear_screen()
        }
    }

    fn clear_screen(&mut self) -> Result<()> {
        self.sink.clear()?;
        self.sink.flush()?;
        self.last_frame = FrameBuffer::empty();
        self.state.force_full_redraw = true;
        Ok(())
    }

    fn draw_help(&mut self) -> Result<()> {
        let (cols, rows) = self.sink.size()?;
        self.sink.clear()?;
        self.sink.write(&format_help_panel(cols, rows))?;
        self.set_title(TITLE_HELP)?;
        self.sink.flush()?;
        self.last_frame = FrameBuffer::empty();
        Ok(())
    }

    fn set_title(&mut self, text: &str) -> Result<()> {
        if self.title.set(text).is_some() {
            self.sink.set_title(text)?;
        }
        Ok(())
    }

    fn drain_commands(&mut self) -> Result<()> {
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command)?;
            if self.state.exiting {
                break;
            }
        }
        Ok(())
    }

    /// Block on the command channel until `deadline`, applying commands as they arrive.
    fn wait_until(&mut self, deadline: Instant) -> Result<()> {
        loop {
            let now = Instant::now();
            if now >= deadline || self.state.exiting {
                return Ok(());
            }
            match self.commands.recv_timeout(deadline - now) {
                Ok(command) => {
                    self.handle_command(command)?;
                }
                Err(RecvTimeoutError::Timeout) => return Ok(()),
                Err(RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    return Ok(());
                }
            }
        }
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::source::PositionedFrame;
    use crate::terminal::RecordingSink;
    use crossbeam_channel::{bounded, Sender};

    /// Solid frames whose color encodes the frame index; frames past `available` are pending.
    struct FakeSource {
        available: usize,
        complete: bool,
        fetched: Vec<usize>,
        fail_at: Option<usize>,
    }

    impl FakeSource {
        fn complete(total: usize) -> Self {
            Self {
                available: total,
                complete: true,
                fetched: Vec::new(),
                fail_at: None,
            }
        }

        fn growing(available: usize) -> Self {
            Self {
                available,
                complete: false,
                fetched: Vec::new(),
                fail_at: None,
            }
        }
    }

    impl FrameSource for FakeSource {
        fn fetch(&mut self, index: usize, viewport: Viewport) -> Result<FrameFetch> {
            if self.fail_at == Some(index) {
                anyhow::bail!("corrupt frame {index}");
            }
            if index > self.available {
                return Ok(FrameFetch::Pending);
            }
            self.fetched.push(index);
            let shade = (index * 10).min(255) as u8;
            Ok(FrameFetch::Ready(PositionedFrame {
                frame: FrameBuffer::filled(
                    viewport.width.min(4),
                    viewport.height.min(3),
                    Rgb::new(shade, 0, 0),
                ),
                offset_x: 0,
            }))
        }

        fn total_frames(&self) -> usize {
            if self.complete {
                self.available
            } else {
                0
            }
        }

        fn is_complete(&self) -> bool {
            self.complete
        }
    }

    fn player(source: FakeSource) -> (Player<FakeSource, RecordingSink>, Sender<KeyCommand>) {
        let (tx, rx) = bounded(16);
        let player = Player::new(source, RecordingSink::new(20, 6), rx, 1000.0);
        (player, tx)
    }

    fn render(player: &mut Player<FakeSource, RecordingSink>) -> usize {
        match player.step().expect("step") {
            Step::Rendered { output_len, .. } => output_len,
            other => panic!("expected a rendered frame, got {other:?}"),
        }
    }

    #[test]
    fn plays_frames_in_order_and_finishes_on_last() {
        let (mut player, _tx) = player(FakeSource::complete(3));
        for _ in 0..3 {
            render(&mut player);
        }
        assert_eq!(player.source.fetched, vec![1, 2, 3]);
        assert!(player.state().ended);
        assert_eq!(player.state().current_frame, 3);
        assert_eq!(player.step().expect("step"), Step::Idle(IDLE_POLL));
        assert_eq!(player.sink().titles.last().map(String::as_str), Some(TITLE_FINISHED));
    }

    #[test]
    fn unchanged_frame_after_refresh_writes_no_blocks() {
        let (mut player, _tx) = player(FakeSource::complete(5));
        render(&mut player);
        player.handle_command(KeyCommand::TogglePause).expect("pause");
        player.sink_mut().take_output();
        player.handle_command(KeyCommand::SeekBackward(10)).expect("seek");
        // Frame 1 again with the same progress bar: nothing changed.
        render(&mut player);
        let output = player.sink_mut().take_output();
        assert!(output.starts_with("\x1b[H"));
        assert!(!output.contains("\x1b[48;2;10;0;0m"));
    }

    #[test]
    fn pause_stops_advancing_and_sets_title() {
        let (mut player, _tx) = player(FakeSource::complete(10));
        render(&mut player);
        player.handle_command(KeyCommand::TogglePause).expect("pause");
        assert_eq!(player.sink().titles.last().map(String::as_str), Some(TITLE_PAUSED));
        // The pause requests one refresh of the current frame.
        render(&mut player);
        assert_eq!(player.state().current_frame, 2);
        assert_eq!(player.step().expect("step"), Step::Idle(IDLE_POLL));
        assert_eq!(player.source.fetched, vec![1, 2]);
    }

    #[test]
    fn seek_while_paused_renders_once_without_unpausing() {
        let (mut player, _tx) = player(FakeSource::complete(50));
        render(&mut player);
        player.handle_command(KeyCommand::TogglePause).expect("pause");
        render(&mut player);
        player
            .handle_command(KeyCommand::SeekForward(10))
            .expect("seek");
        render(&mut player);
        assert!(player.state().paused);
        assert_eq!(player.source.fetched.last(), Some(&12));
        assert_eq!(player.step().expect("step"), Step::Idle(IDLE_POLL));
    }

    #[test]
    fn pending_frame_sets_waiting_title() {
        let (mut player, _tx) = player(FakeSource::growing(1));
        render(&mut player);
        assert_eq!(player.step().expect("step"), Step::Idle(PENDING_POLL));
        let title = player.sink().titles.last().cloned().unwrap_or_default();
        assert!(title.starts_with("Waiting for frame 00000002"));
        assert_eq!(player.state().current_frame, 2);
    }

    #[test]
    fn extraction_finishing_with_no_frame_ends_playback() {
        let (mut player, _tx) = player(FakeSource::growing(2));
        render(&mut player);
        render(&mut player);
        player.source.complete = true;
        assert_eq!(player.step().expect("step"), Step::Idle(IDLE_POLL));
        assert!(player.state().ended);
        assert_eq!(player.state().current_frame, 2);
    }

    #[test]
    fn empty_video_finishes_immediately() {
        let (mut player, _tx) = player(FakeSource::complete(0));
        assert_eq!(player.step().expect("step"), Step::Idle(IDLE_POLL));
        assert_eq!(player.sink().titles.last().map(String::as_str), Some(TITLE_FINISHED));
        assert!(player.sink().output.is_empty());
    }

    #[test]
    fn help_draws_panel_and_blocks_rendering() {
        let (mut player, _tx) = player(FakeSource::complete(10));
        render(&mut player);
        player.sink_mut().take_output();
        assert_eq!(
            player.handle_command(KeyCommand::ToggleHelp).expect("help"),
            Transition::ShowHelp
        );
        assert!(player.sink().output.contains("Keyboard Actions"));
        assert_eq!(player.sink().titles.last().map(String::as_str), Some(TITLE_HELP));
        assert_eq!(player.step().expect("step"), Step::Idle(IDLE_POLL));

        player.handle_command(KeyCommand::Quit).expect("close help");
        assert!(!player.state().exiting);
        let before = player.sink().clears;
        render(&mut player);
        assert_eq!(player.sink().clears, before);
        assert!(player.state().current_frame > 2);
    }

    #[test]
    fn force_refresh_redraws_every_pixel() {
        let (mut player, _tx) = player(FakeSource::complete(10));
        render(&mut player);
        player.handle_command(KeyCommand::TogglePause).expect("pause");
        render(&mut player);
        player.sink_mut().take_output();
        // Same frame again: a plain diff would be nearly empty.
        player.handle_command(KeyCommand::ForceRefresh).expect("refresh");
        render(&mut player);
        let output = player.sink_mut().take_output();
        assert_eq!(output.matches("  \x1b[0m").count(), 4 * 3);
    }

    #[test]
    fn resize_clears_and_redraws() {
        let (mut player, _tx) = player(FakeSource::complete(10));
        render(&mut player);
        let clears = player.sink().clears;
        player.sink_mut().size = (30, 8);
        render(&mut player);
        assert_eq!(player.sink().clears, clears + 1);
    }

    /// Full-viewport frames that take a while to decode.
    struct SlowSource {
        decode_time: Duration,
    }

    impl FrameSource for SlowSource {
        fn fetch(&mut self, index: usize, viewport: Viewport) -> Result<FrameFetch> {
            std::thread::sleep(self.decode_time);
            let mut frame = FrameBuffer::filled(viewport.width, viewport.height, Rgb::BLACK);
            for y in 0..viewport.height {
                for x in 0..viewport.width {
                    frame.set_pixel(x, y, Rgb::new((x * 7) as u8, (y * 11) as u8, index as u8));
                }
            }
            Ok(FrameFetch::Ready(PositionedFrame { frame, offset_x: 0 }))
        }

        fn total_frames(&self) -> usize {
            100
        }

        fn is_complete(&self) -> bool {
            true
        }
    }

    #[test]
    fn write_cost_sample_excludes_decode_time() {
        let (_tx, rx) = bounded(1);
        let source = SlowSource {
            decode_time: Duration::from_millis(30),
        };
        let mut player = Player::new(source, RecordingSink::new(40, 10), rx, 30.0);
        let Step::Rendered { output_len, .. } = player.step().expect("step") else {
            panic!("expected a frame");
        };
        assert!(output_len >= crate::pacing::MIN_SAMPLE_OUTPUT_LEN);
        assert_eq!(player.pacing().window().len(), 1);
        let estimate = player.pacing().estimated_cost(output_len);
        assert!(
            estimate < Duration::from_millis(5),
            "write cost estimate {estimate:?} includes decode time"
        );
    }

    #[test]
    fn decode_error_propagates() {
        let mut source = FakeSource::complete(3);
        source.fail_at = Some(2);
        let (mut player, _tx) = player(source);
        render(&mut player);
        assert!(player.step().is_err());
    }

    #[test]
    fn deadline_is_within_frame_budget() {
        let (mut player, _tx) = player(FakeSource::complete(3));
        let start = Instant::now();
        let Step::Rendered { deadline, .. } = player.step().expect("step") else {
            panic!("expected a frame");
        };
        assert!(deadline <= Instant::now() + Duration::from_millis(100));
        assert!(deadline >= start);
    }

    #[test]
    fn run_returns_on_quit() {
        let (mut player, tx) = player(FakeSource::complete(1_000));
        tx.send(KeyCommand::Quit).expect("send");
        player.run().expect("run");
        assert!(player.state().exiting);
    }

    #[test]
    fn run_applies_commands_during_wait() {
        let (mut player, tx) = player(FakeSource::complete(3));
        let sender = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            let _ = tx.send(KeyCommand::Quit);
        });
        player.run().expect("run");
        sender.join().expect("join");
        assert!(player.state().ended);
        assert!(player.state().exiting);
    }
}
