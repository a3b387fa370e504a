//! Raw terminal input decoding into player commands.
//!
//! Stdin is read in raw mode, so keys arrive as bytes: Escape and Space are single
//! bytes, arrows are `ESC [ C` / `ESC O C` (optionally with `1;5`-style parameters),
//! F1 is `ESC O P`, and F5 is `ESC [ 1 5 ~`.

const ESC: u8 = 0x1b;
const SPACE: u8 = b' ';
const MAX_CSI_LEN: usize = 32;

/// Frames skipped by one arrow press.
pub const SEEK_STEP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Quit,
    TogglePause,
    SeekForward(usize),
    SeekBackward(usize),
    ForceRefresh,
    ToggleHelp,
    Unknown,
}

#[inline]
fn is_csi_final(byte: u8) -> bool {
    (0x40..=0x7e).contains(&byte)
}

/// Decode one escape sequence starting at `start` (which must hold ESC).
/// Returns the command and the index just past the sequence.
fn parse_escape(bytes: &[u8], start: usize) -> (KeyCommand, usize) {
    let Some(&intro) = bytes.get(start + 1) else {
        return (KeyCommand::Quit, start + 1);
    };
    match intro {
        b'O' => {
            let Some(&last) = bytes.get(start + 2) else {
                return (KeyCommand::Unknown, bytes.len());
            };
            let command = match last {
                b'C' => KeyCommand::SeekForward(SEEK_STEP),
                b'D' => KeyCommand::SeekBackward(SEEK_STEP),
                b'P' => KeyCommand::ToggleHelp,
                _ => KeyCommand::Unknown,
            };
            (command, start + 3)
        }
        b'[' => {
            let params_start = start + 2;
            let mut idx = params_start;
            while idx < bytes.len() && idx - start <= MAX_CSI_LEN {
                let byte = bytes[idx];
                if is_csi_final(byte) {
                    let params = &bytes[params_start..idx];
                    return (csi_command(params, byte), idx + 1);
                }
                if !(byte.is_ascii_digit() || byte == b';') {
                    return (KeyCommand::Unknown, idx + 1);
                }
                idx += 1;
            }
            (KeyCommand::Unknown, idx.min(bytes.len()).max(start + 2))
        }
        // ESC followed by an ordinary key: the Escape press itself, then that key.
        _ => (KeyCommand::Quit, start + 1),
    }
}

fn csi_command(params: &[u8], final_byte: u8) -> KeyCommand {
    let first_param = params.split(|&b| b == b';').next().unwrap_or_default();
    match final_byte {
        b'C' => KeyCommand::SeekForward(SEEK_STEP),
        b'D' => KeyCommand::SeekBackward(SEEK_STEP),
        b'~' if first_param == b"15" => KeyCommand::ForceRefresh,
        // Some terminals report F1 as `CSI 1 1 ~` or `CSI P`.
        b'~' if first_param == b"11" => KeyCommand::ToggleHelp,
        b'P' if params.is_empty() => KeyCommand::ToggleHelp,
        _ => KeyCommand::Unknown,
    }
}

fn parse_one(bytes: &[u8], start: usize) -> (KeyCommand, usize) {
    match bytes[start] {
        ESC => parse_escape(bytes, start),
        SPACE => (KeyCommand::TogglePause, start + 1),
        _ => (KeyCommand::Unknown, start + 1),
    }
}

/// Decode a chunk that holds exactly one key press. Anything else is `Unknown`.
pub fn decode_key(bytes: &[u8]) -> KeyCommand {
    if bytes.is_empty() {
        return KeyCommand::Unknown;
    }
    match parse_one(bytes, 0) {
        (command, end) if end == bytes.len() => command,
        _ => KeyCommand::Unknown,
    }
}

/// An escape sequence that could still become a key once more bytes arrive.
fn is_partial_escape(rest: &[u8]) -> bool {
    match rest {
        [ESC] | [ESC, b'O'] => true,
        [ESC, b'[', params @ ..] => {
            params.len() < MAX_CSI_LEN
                && params.iter().all(|&b| b.is_ascii_digit() || b == b';')
        }
        _ => false,
    }
}

/// Decode keys from `bytes`, optionally stopping at a trailing partial escape.
/// Returns the commands and how many bytes were consumed.
fn decode_from(bytes: &[u8], hold_partial: bool) -> (Vec<KeyCommand>, usize) {
    let mut commands = Vec::new();
    let mut idx = 0;
    while idx < bytes.len() {
        if hold_partial && is_partial_escape(&bytes[idx..]) {
            break;
        }
        let (command, next) = parse_one(bytes, idx);
        if command != KeyCommand::Unknown {
            commands.push(command);
        }
        idx = next.max(idx + 1);
    }
    (commands, idx)
}

/// Decode every key in a chunk; bursts from key repeat can hold several sequences.
/// Unrecognized bytes are dropped.
pub fn decode_keys(bytes: &[u8]) -> Vec<KeyCommand> {
    decode_from(bytes, false).0
}

/// Stateful decoder for a byte stream whose escape sequences may be split across reads.
///
/// A trailing partial sequence (a lone ESC included) is held back until the next
/// `feed` completes it or the caller stops waiting and calls `flush_pending`.
#[derive(Debug, Default)]
pub struct InputDecoder {
    pending: Vec<u8>,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyCommand> {
        self.pending.extend_from_slice(bytes);
        let (commands, consumed) = decode_from(&self.pending, true);
        self.pending.drain(..consumed);
        commands
    }

    /// Give up on the held bytes: a lone ESC becomes `Quit`, partial sequences are dropped.
    pub fn flush_pending(&mut self) -> Vec<KeyCommand> {
        let commands = decode_keys(&self.pending);
        self.pending.clear();
        commands
    }
}
