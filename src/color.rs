//! Color blocks so every pixel becomes one two-column cell with a truecolor background.

use std::fmt::Write;

/// Reset sequence appended after every block.
pub const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from wide integers, clamping each channel into 0..=255.
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        Self {
            r: r.clamp(0, 255) as u8,
            g: g.clamp(0, 255) as u8,
            b: b.clamp(0, 255) as u8,
        }
    }

    pub fn invert(self) -> Self {
        Self {
            r: 255 - self.r,
            g: 255 - self.g,
            b: 255 - self.b,
        }
    }

    /// Scale every channel by `amount`.
    ///
    /// `1.0` keeps the color and `0.5` halves it. Channels saturate at 0 and 255.
    pub fn darken(self, amount: f32) -> Self {
        let scale = |channel: u8| (f32::from(channel) * amount).round() as i32;
        Self::clamped(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Escape-coded block: background set to `rgb`, two spaces, then reset.
#[cfg(test)]
pub(crate) fn color_block(rgb: Rgb) -> String {
    let mut out = String::with_capacity(32);
    push_color_block(&mut out, rgb);
    out
}

/// Append one block to `out` without allocating.
pub fn push_color_block(out: &mut String, rgb: Rgb) {
    let _ = write!(out, "\x1b[48;2;{};{};{}m  {RESET}", rgb.r, rgb.g, rgb.b);
}
