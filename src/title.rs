//! Window title reporting; writes are skipped when the text has not changed.

pub const TITLE_PAUSED: &str = "Paused";
pub const TITLE_HELP: &str = "Help";
pub const TITLE_FINISHED: &str = "Video finished";

const WAITING_DOT_PERIOD_MS: u128 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleState {
    current: String,
}

impl TitleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Record `text` and return the escape sequence to emit, or `None` when unchanged.
    pub fn set(&mut self, text: &str) -> Option<String> {
        if self.current == text {
            return None;
        }
        self.current.clear();
        self.current.push_str(text);
        Some(title_sequence(text))
    }
}

/// OSC 0: set icon name and window title.
pub fn title_sequence(text: &str) -> String {
    let clean: String = text.chars().filter(|c| !c.is_control()).collect();
    format!("\x1b]0;{clean}\x07")
}

/// "Waiting for frame 00000042" plus zero to three dots cycling every half second.
pub fn waiting_title(frame: usize, now_ms: u128) -> String {
    let dots = ((now_ms / WAITING_DOT_PERIOD_MS) % 4) as usize;
    format!("Waiting for frame {frame:08}{}", ".".repeat(dots))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_idempotent() {
        let mut title = TitleState::new();
        assert_eq!(title.set("Paused"), Some("\x1b]0;Paused\x07".to_string()));
        assert_eq!(title.set("Paused"), None);
        assert_eq!(title.current(), "Paused");
        assert!(title.set("24.0fps").is_some());
        assert_eq!(title.current(), "24.0fps");
    }

    #[test]
    fn title_sequence_strips_control_characters() {
        assert_eq!(title_sequence("a\x07b\x1bc"), "\x1b]0;abc\x07");
    }

    #[test]
    fn waiting_title_cycles_dots() {
        assert_eq!(waiting_title(42, 0), "Waiting for frame 00000042");
        assert_eq!(waiting_title(42, 500), "Waiting for frame 00000042.");
        assert_eq!(waiting_title(42, 1_999), "Waiting for frame 00000042...");
        assert_eq!(waiting_title(42, 2_000), "Waiting for frame 00000042");
    }
}
