//! Frame-to-frame diff rendering so only changed pixels reach the terminal.
//!
//! Each run of changed pixels starts with an absolute column escape (`CSI n G`), so
//! skipped pixels keep whatever the terminal already shows. Diffing never changes
//! the final picture: the output applied on top of `previous` always yields `current`.

use std::fmt::Write;

use crate::color::push_color_block;
use crate::frame::FrameBuffer;

/// Cursor to row 1, column 1.
pub const CURSOR_HOME: &str = "\x1b[H";

/// Terminal columns used by one pixel block.
pub const BLOCK_WIDTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub output: String,
    pub changed_pixels: usize,
}

/// 1-based terminal column where pixel `x` starts.
#[inline]
pub fn block_column(offset_x: usize, x: usize) -> usize {
    (offset_x + x) * BLOCK_WIDTH + 1
}

pub fn render_frame(current: &FrameBuffer, previous: &FrameBuffer, offset_x: usize) -> String {
    render_frame_stats(current, previous, offset_x).output
}

pub fn render_frame_stats(
    current: &FrameBuffer,
    previous: &FrameBuffer,
    offset_x: usize,
) -> RenderedFrame {
    let full = previous.is_empty() || !previous.same_dimensions(current);
    let mut output = String::from(CURSOR_HOME);
    let mut changed_pixels = 0;

    for y in 0..current.height() {
        let mut in_run = false;
        for x in 0..current.width() {
            let pixel = current.pixel(x, y);
            if !full && previous.pixel(x, y) == pixel {
                in_run = false;
                continue;
            }
            if !in_run {
                let _ = write!(output, "\x1b[{}G", block_column(offset_x, x));
                in_run = true;
            }
            push_color_block(&mut output, pixel);
            changed_pixels += 1;
        }
        if y + 1 < current.height() {
            output.push('\n');
        }
    }

    RenderedFrame {
        output,
        changed_pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use proptest::prelude::*;

    /// Minimal terminal: understands exactly the sequences the renderer emits.
    struct TerminalModel {
        cells: Vec<Vec<Option<Rgb>>>,
        row: usize,
        col: usize,
    }

    impl TerminalModel {
        fn new(cols: usize, rows: usize) -> Self {
            Self {
                cells: vec![vec![None; cols]; rows],
                row: 0,
                col: 0,
            }
        }

        fn apply(&mut self, output: &str) {
            let bytes = output.as_bytes();
            let mut idx = 0;
            let mut background = None;
            while idx < bytes.len() {
                match bytes[idx] {
                    0x1b => {
                        assert_eq!(bytes[idx + 1], b'[');
                        let start = idx + 2;
                        let mut end = start;
                        while !(0x40..=0x7e).contains(&bytes[end]) {
                            end += 1;
                        }
                        let params = &output[start..end];
                        match bytes[end] {
                            b'H' => {
                                self.row = 0;
                                self.col = 0;
                            }
                            b'G' => self.col = params.parse::<usize>().expect("column") - 1,
                            b'm' if params == "0" => background = None,
                            b'm' => {
                                let parts: Vec<u8> = params
                                    .split(';')
                                    .skip(2)
                                    .map(|p| p.parse().expect("channel"))
                                    .collect();
                                background = Some(Rgb::new(parts[0], parts[1], parts[2]));
                            }
                            other => panic!("unexpected final byte {other}"),
                        }
                        idx = end + 1;
                    }
                    b'\n' => {
                        self.row += 1;
                        idx += 1;
                    }
                    b' ' => {
                        self.cells[self.row][self.col] = background;
                        self.col += 1;
                        idx += 1;
                    }
                    other => panic!("unexpected byte {other}"),
                }
            }
        }

        fn pixel(&self, offset_x: usize, x: usize, y: usize) -> Option<Rgb> {
            let col = block_column(offset_x, x) - 1;
            let left = self.cells[y][col];
            assert_eq!(left, self.cells[y][col + 1], "half-painted block");
            left
        }
    }

    fn frame_from(width: usize, height: usize, pixels: &[(u8, u8, u8)]) -> FrameBuffer {
        let mut frame = FrameBuffer::filled(width, height, Rgb::BLACK);
        for (i, (r, g, b)) in pixels.iter().enumerate() {
            frame.set_pixel(i % width, i / width, Rgb::new(*r, *g, *b));
        }
        frame
    }

    fn assert_matches(model: &TerminalModel, frame: &FrameBuffer, offset_x: usize) {
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                assert_eq!(model.pixel(offset_x, x, y), Some(frame.pixel(x, y)));
            }
        }
    }

    #[test]
    fn single_changed_pixel_emits_one_block_at_its_column() {
        let previous = FrameBuffer::filled(4, 2, Rgb::BLACK);
        let mut current = previous.clone();
        current.set_pixel(2, 0, Rgb::new(255, 0, 0));

        let rendered = render_frame_stats(&current, &previous, 0);
        assert_eq!(rendered.changed_pixels, 1);
        assert_eq!(
            rendered.output,
            "\x1b[H\x1b[5G\x1b[48;2;255;0;0m  \x1b[0m\n"
        );
    }

    #[test]
    fn identical_frames_emit_no_blocks() {
        let frame = FrameBuffer::filled(3, 3, Rgb::new(1, 2, 3));
        let rendered = render_frame_stats(&frame, &frame, 4);
        assert_eq!(rendered.changed_pixels, 0);
        assert_eq!(rendered.output, "\x1b[H\n\n");
    }

    #[test]
    fn empty_previous_redraws_every_pixel() {
        let frame = FrameBuffer::filled(3, 2, Rgb::WHITE);
        let rendered = render_frame_stats(&frame, &FrameBuffer::empty(), 0);
        assert_eq!(rendered.changed_pixels, 6);
        assert_eq!(rendered.output.matches("G").count(), 2);
    }

    #[test]
    fn mismatched_previous_dimensions_redraw_everything() {
        let previous = FrameBuffer::filled(2, 2, Rgb::WHITE);
        let current = FrameBuffer::filled(3, 2, Rgb::WHITE);
        assert_eq!(render_frame_stats(&current, &previous, 0).changed_pixels, 6);
    }

    #[test]
    fn runs_share_a_single_column_escape() {
        let previous = FrameBuffer::filled(5, 1, Rgb::BLACK);
        let current = frame_from(5, 1, &[(0, 0, 0), (9, 9, 9), (9, 9, 9), (0, 0, 0), (9, 9, 9)]);
        let output = render_frame(&current, &previous, 1);
        assert!(output.starts_with("\x1b[H\x1b[5G"));
        assert!(output.contains("\x1b[11G"));
        assert_eq!(output.matches('G').count(), 2);
    }

    #[test]
    fn offset_shifts_columns() {
        let current = FrameBuffer::filled(1, 1, Rgb::WHITE);
        let output = render_frame(&current, &FrameBuffer::empty(), 3);
        assert!(output.starts_with("\x1b[H\x1b[7G"));
    }

    proptest! {
        #[test]
        fn diff_output_reproduces_current_frame(
            width in 1usize..6,
            height in 1usize..5,
            offset_x in 0usize..3,
            seed_prev in proptest::collection::vec((0u8..3, 0u8..3, 0u8..3), 30),
            seed_next in proptest::collection::vec((0u8..3, 0u8..3, 0u8..3), 30),
        ) {
            let previous = frame_from(width, height, &seed_prev[..width * height]);
            let current = frame_from(width, height, &seed_next[..width * height]);
            let cols = (offset_x + width) * BLOCK_WIDTH + 1;

            let mut model = TerminalModel::new(cols, height);
            model.apply(&render_frame(&previous, &FrameBuffer::empty(), offset_x));
            assert_matches(&model, &previous, offset_x);

            model.apply(&render_frame(&current, &previous, offset_x));
            assert_matches(&model, &current, offset_x);
        }
    }
}
