//! Status-row dimming and progress bar stamped onto a copy of each frame.

use crate::frame::FrameBuffer;

/// Brightness kept on the status row behind the progress bar.
pub const STATUS_ROW_DIM: f32 = 0.75;

/// Column where the progress bar stops; `0` while the total is unknown.
pub fn progress_column(current_frame: usize, total_frames: usize, width: usize) -> usize {
    if total_frames == 0 {
        return 0;
    }
    let column = (current_frame as u128 * width as u128) / total_frames as u128;
    column.min(width as u128) as usize
}

/// Returns the display copy of `frame`. Frames shorter than two rows come back unchanged.
pub fn compose_overlay(frame: &FrameBuffer, current_frame: usize, total_frames: usize) -> FrameBuffer {
    let mut out = frame.clone();
    let height = out.height();
    if height < 2 {
        return out;
    }

    out.map_row(height - 2, |_, pixel| pixel.darken(STATUS_ROW_DIM));

    let progress = progress_column(current_frame, total_frames, out.width());
    out.map_row(height - 1, |x, pixel| {
        if x < progress {
            pixel.invert()
        } else {
            pixel
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn single_row_frames_are_untouched() {
        let frame = FrameBuffer::filled(5, 1, Rgb::new(200, 200, 200));
        assert_eq!(compose_overlay(&frame, 3, 4), frame);
        let empty = FrameBuffer::empty();
        assert_eq!(compose_overlay(&empty, 1, 1), empty);
    }

    #[test]
    fn status_row_is_dimmed_and_progress_inverted() {
        let frame = FrameBuffer::filled(4, 3, Rgb::new(200, 100, 0));
        let out = compose_overlay(&frame, 1, 2);

        for x in 0..4 {
            assert_eq!(out.pixel(x, 0), Rgb::new(200, 100, 0));
            assert_eq!(out.pixel(x, 1), Rgb::new(150, 75, 0));
        }
        assert_eq!(out.pixel(0, 2), Rgb::new(55, 155, 255));
        assert_eq!(out.pixel(1, 2), Rgb::new(55, 155, 255));
        assert_eq!(out.pixel(2, 2), Rgb::new(200, 100, 0));
        assert_eq!(out.pixel(3, 2), Rgb::new(200, 100, 0));
    }

    #[test]
    fn input_frame_is_not_mutated() {
        let frame = FrameBuffer::filled(2, 2, Rgb::WHITE);
        let _ = compose_overlay(&frame, 2, 2);
        assert_eq!(frame, FrameBuffer::filled(2, 2, Rgb::WHITE));
    }

    #[test]
    fn unknown_total_shows_no_progress() {
        assert_eq!(progress_column(10, 0, 80), 0);
        let frame = FrameBuffer::filled(3, 2, Rgb::BLACK);
        let out = compose_overlay(&frame, 5, 0);
        for x in 0..3 {
            assert_eq!(out.pixel(x, 1), Rgb::BLACK);
        }
    }

    #[test]
    fn progress_reaches_full_width_at_last_frame() {
        assert_eq!(progress_column(500, 500, 80), 80);
        assert_eq!(progress_column(100, 500, 80), 16);
        assert_eq!(progress_column(600, 500, 80), 80);
    }

    #[test]
    fn progress_is_monotonic() {
        let total = 37;
        let width = 23;
        let mut last = 0;
        for current in 1..=total {
            let column = progress_column(current, total, width);
            assert!(column >= last);
            last = column;
        }
        assert_eq!(last, width);
    }
}
