//! Terminal sink: where rendered escape output, titles, and lifecycle changes go.

use std::io::{self, BufWriter, Stdout, Write};

use anyhow::{Context, Result};
use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{size as terminal_size, Clear, ClearType},
};

use crate::terminal_restore::TerminalRestoreGuard;
use crate::title::title_sequence;

const STDOUT_BUFFER_BYTES: usize = 1 << 17;
const FALLBACK_SIZE: (u16, u16) = (80, 24);

pub trait TerminalSink {
    /// Write escape-coded output verbatim.
    fn write(&mut self, text: &str) -> Result<()>;

    /// Set the window title; escape sequences are stripped from `text`.
    fn set_title(&mut self, text: &str) -> Result<()> {
        self.write(&title_sequence(text))
    }

    fn clear(&mut self) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Current size as `(cols, rows)`.
    fn size(&self) -> Result<(u16, u16)>;

    /// Called once before the first frame.
    fn on_enter(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once when playback ends, whatever the reason.
    fn on_exit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Process stdout in raw mode on the alternate screen.
pub struct StdoutSink {
    out: BufWriter<Stdout>,
    guard: TerminalRestoreGuard,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            out: BufWriter::with_capacity(STDOUT_BUFFER_BYTES, io::stdout()),
            guard: TerminalRestoreGuard::new(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSink for StdoutSink {
    fn write(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .context("stdout write failed")
    }

    fn clear(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0)).context("stdout clear failed")
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().context("stdout flush failed")
    }

    fn size(&self) -> Result<(u16, u16)> {
        match terminal_size() {
            Ok((0, _)) | Ok((_, 0)) => Ok(FALLBACK_SIZE),
            Ok(size) => Ok(size),
            Err(err) => Err(err).context("failed to query terminal size"),
        }
    }

    fn on_enter(&mut self) -> Result<()> {
        self.guard
            .enter_alt_screen(&mut self.out)
            .context("failed to enter alternate screen")?;
        self.guard
            .hide_cursor(&mut self.out)
            .context("failed to hide cursor")?;
        self.guard
            .enable_raw_mode()
            .context("failed to enable raw mode")?;
        self.clear()?;
        self.flush()
    }

    fn on_exit(&mut self) -> Result<()> {
        let flushed = self.flush();
        self.guard.restore();
        flushed
    }
}

/// In-memory sink that records everything written; used by tests and dry runs.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    pub output: String,
    pub titles: Vec<String>,
    pub clears: usize,
    pub size: (u16, u16),
    pub entered: bool,
    pub exited: bool,
}

impl RecordingSink {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            output: String::new(),
            titles: Vec::new(),
            clears: 0,
            size: (cols, rows),
            entered: false,
            exited: false,
        }
    }

    /// Drain what was written since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

impl TerminalSink for RecordingSink {
    fn write(&mut self, text: &str) -> Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn set_title(&mut self, text: &str) -> Result<()> {
        self.titles.push(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        Ok(self.size)
    }

    fn on_enter(&mut self) -> Result<()> {
        self.entered = true;
        Ok(())
    }

    fn on_exit(&mut self) -> Result<()> {
        self.exited = true;
        Ok(())
    }
}
