//! Puts the terminal back the way we found it, whatever ends the process.
//!
//! Each mode pixterm switches on is recorded in one bitmask, so a restore
//! undoes exactly what was changed and a second restore is a no-op.

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::{
    io::{self, Write},
    panic,
    sync::{
        atomic::{AtomicU8, Ordering},
        Once,
    },
};

const RAW_MODE: u8 = 1;
const ALT_SCREEN: u8 = 1 << 1;
const CURSOR_HIDDEN: u8 = 1 << 2;

static ACTIVE_MODES: AtomicU8 = AtomicU8::new(0);
static PANIC_HOOK: Once = Once::new();

fn mark_active(mode: u8) {
    ACTIVE_MODES.fetch_or(mode, Ordering::SeqCst);
}

#[cfg(test)]
fn is_active(mode: u8) -> bool {
    ACTIVE_MODES.load(Ordering::SeqCst) & mode != 0
}

/// Owns the terminal modes for the lifetime of playback; dropping it restores them.
pub struct TerminalRestoreGuard {
    _private: (),
}

impl TerminalRestoreGuard {
    pub fn new() -> Self {
        install_terminal_panic_hook();
        Self { _private: () }
    }

    pub fn enable_raw_mode(&self) -> io::Result<()> {
        enable_raw_mode()?;
        mark_active(RAW_MODE);
        Ok(())
    }

    pub fn enter_alt_screen(&self, out: &mut impl Write) -> io::Result<()> {
        execute!(out, EnterAlternateScreen)?;
        mark_active(ALT_SCREEN);
        Ok(())
    }

    pub fn hide_cursor(&self, out: &mut impl Write) -> io::Result<()> {
        execute!(out, Hide)?;
        mark_active(CURSOR_HIDDEN);
        Ok(())
    }

    pub fn restore(&self) {
        restore_terminal();
    }
}

impl Default for TerminalRestoreGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalRestoreGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Leave raw mode, the alternate screen, and the hidden cursor, in reverse order of entry.
pub fn restore_terminal() {
    let modes = ACTIVE_MODES.swap(0, Ordering::SeqCst);
    if modes == 0 {
        return;
    }
    if modes & RAW_MODE != 0 {
        let _ = disable_raw_mode();
    }
    let mut out = io::stdout();
    if modes & CURSOR_HIDDEN != 0 {
        let _ = execute!(out, Show);
    }
    if modes & ALT_SCREEN != 0 {
        let _ = execute!(out, LeaveAlternateScreen);
    }
    let _ = out.flush();
}

/// Restore the screen before the default hook prints, so the panic message is readable.
pub fn install_terminal_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal();
            crate::log_panic(info);
            default_hook(info);
        }));
    });
}
