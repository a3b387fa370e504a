//! Help panel listing the playback keys, centered on screen.

use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

/// Key binding shown in the help panel.
pub struct Shortcut {
    pub key: &'static str,
    pub description: &'static str,
}

pub const SHORTCUTS: &[Shortcut] = &[
    Shortcut {
        key: "Escape",
        description: "Exit",
    },
    Shortcut {
        key: "Space",
        description: "Pause / Resume",
    },
    Shortcut {
        key: "Right Arrow",
        description: "Skip 10 frames forward",
    },
    Shortcut {
        key: "Left Arrow",
        description: "Skip 10 frames backward",
    },
    Shortcut {
        key: "F1",
        description: "Show / Hide this menu",
    },
    Shortcut {
        key: "F5",
        description: "Refresh screen",
    },
];

pub const HELP_TITLE: &str = "Keyboard Actions";

/// Display width ignoring escape sequences.
fn visible_width(text: &str) -> usize {
    let stripped = strip_ansi_escapes::strip_str(text);
    UnicodeWidthStr::width(stripped.as_str())
}

/// `text` centered in `width` columns; with `pad_after` the result fills the whole width.
pub fn centered_text(text: &str, width: usize, pad_after: bool) -> String {
    let visible = visible_width(text);
    let before = width.saturating_sub(visible) / 2;
    let mut out = " ".repeat(before);
    out.push_str(text);
    if pad_after {
        out.push_str(&" ".repeat(width.saturating_sub(before + visible)));
    }
    out
}

/// Panel lines: title, blank line, then one `key : description` row per shortcut.
pub fn help_lines() -> Vec<String> {
    let key_width = SHORTCUTS
        .iter()
        .map(|shortcut| UnicodeWidthStr::width(shortcut.key))
        .max()
        .unwrap_or(0)
        + 2;
    let rows: Vec<String> = SHORTCUTS
        .iter()
        .map(|shortcut| {
            format!(
                "{}: {}",
                centered_text(shortcut.key, key_width, true),
                shortcut.description
            )
        })
        .collect();
    let panel_width = rows.iter().map(|row| visible_width(row)).max().unwrap_or(0);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(centered_text(HELP_TITLE, panel_width, false));
    lines.push(String::new());
    lines.extend(rows);
    lines
}

pub fn help_panel_height() -> usize {
    SHORTCUTS.len() + 2
}

/// The panel placed in the middle of a `cols` x `rows` screen with absolute cursor moves.
pub fn format_help_panel(cols: u16, rows: u16) -> String {
    let lines = help_lines();
    let panel_width = lines.iter().map(|line| visible_width(line)).max().unwrap_or(0);
    let left = usize::from(cols).saturating_sub(panel_width) / 2 + 1;
    let top = usize::from(rows).saturating_sub(help_panel_height()) / 2 + 1;

    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        let _ = write!(out, "\x1b[{};{}H{}", top + idx, left, line);
    }
    out
}
