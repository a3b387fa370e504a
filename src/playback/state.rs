//! Playback state machine: pure transitions from key commands.
//!
//! The player owns the only `PlaybackState` and applies commands between renders,
//! so a command always takes effect from the next frame on.

use crate::keys::KeyCommand;

/// What the player has to do on screen after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Exit,
    Paused,
    Resumed,
    Seeked { frame: usize },
    ClearScreen,
    ShowHelp,
    CloseHelp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// 1-based index of the next frame to show.
    pub current_frame: usize,
    /// `0` while the total is still unknown (extraction in progress).
    pub total_frames: usize,
    pub paused: bool,
    pub help_open: bool,
    /// Pause intent remembered while the help menu forces a pause.
    pub resume_after_help: bool,
    /// Diff the next frame against an empty screen.
    pub force_full_redraw: bool,
    /// Render one frame even though playback is paused.
    pub refresh_pending: bool,
    /// The last frame was shown and playback reached the end.
    pub ended: bool,
    pub exiting: bool,
    pub target_fps: f64,
}

impl PlaybackState {
    pub fn new(target_fps: f64) -> Self {
        Self {
            current_frame: 1,
            total_frames: 0,
            paused: false,
            help_open: false,
            resume_after_help: true,
            force_full_redraw: false,
            refresh_pending: false,
            ended: false,
            exiting: false,
            target_fps,
        }
    }

    pub fn total_known(&self) -> bool {
        self.total_frames > 0
    }

    pub fn apply(&mut self, command: KeyCommand) -> Transition {
        match command {
            KeyCommand::Quit if self.help_open => self.close_help(),
            KeyCommand::Quit => {
                self.paused = true;
                self.exiting = true;
                Transition::Exit
            }
            KeyCommand::ToggleHelp if self.help_open => self.close_help(),
            KeyCommand::ToggleHelp => self.open_help(),
            _ if self.help_open => Transition::Ignored,
            KeyCommand::TogglePause => {
                self.paused = !self.paused;
                self.refresh_pending = true;
                if self.paused {
                    Transition::Paused
                } else {
                    Transition::Resumed
                }
            }
            KeyCommand::SeekForward(step) => self.seek_to(self.current_frame.saturating_add(step)),
            KeyCommand::SeekBackward(step) => self.seek_to(self.current_frame.saturating_sub(step)),
            KeyCommand::ForceRefresh => {
                self.force_full_redraw = true;
                self.refresh_pending = true;
                Transition::ClearScreen
            }
            KeyCommand::Unknown => Transition::Ignored,
        }
    }

    fn open_help(&mut self) -> Transition {
        self.help_open = true;
        self.resume_after_help = !self.paused;
        self.paused = true;
        Transition::ShowHelp
    }

    fn close_help(&mut self) -> Transition {
        self.help_open = false;
        self.paused = !self.resume_after_help;
        self.force_full_redraw = true;
        self.refresh_pending = true;
        Transition::CloseHelp
    }

    fn seek_to(&mut self, target: usize) -> Transition {
        let mut frame = target.max(1);
        if self.total_known() {
            frame = frame.min(self.total_frames);
        }
        self.current_frame = frame;
        self.ended = false;
        if self.paused {
            self.refresh_pending = true;
        }
        Transition::Seeked { frame }
    }

    /// Move past a frame that was just shown. Stops on the last frame once the total is known.
    pub fn advance(&mut self) {
        if self.total_known() && self.current_frame >= self.total_frames {
            self.current_frame = self.total_frames;
            self.ended = true;
        } else {
            self.current_frame += 1;
        }
    }

    /// Clear the one-shot redraw requests after a frame was written.
    pub fn frame_rendered(&mut self) {
        self.force_full_redraw = false;
        self.refresh_pending = false;
    }

    /// Whether the player should produce a frame this iteration.
    pub fn wants_frame(&self) -> bool {
        if self.exiting || self.help_open {
            return false;
        }
        if self.refresh_pending {
            return true;
        }
        !self.paused && !self.ended
    }
}
