//! Still-image mode: draw one picture, redraw it on resize, leave on any key.

use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::diff::render_frame;
use crate::frame::FrameBuffer;
use crate::keys::KeyCommand;
use crate::log_debug;
use crate::source::{FrameFetch, FrameSource, StillImage, Viewport};
use crate::terminal::TerminalSink;

const RESIZE_POLL: Duration = Duration::from_millis(100);

/// Title shown while an image is on screen, with the size it is drawn at.
pub fn still_title(name: &str, width: usize, height: usize) -> String {
    format!("{name} @ {width}x{height}px")
}

/// Full redraw of `image` scaled to the current terminal size.
/// Returns the drawn size in pixels.
pub fn draw_still<T: TerminalSink>(image: &mut StillImage, sink: &mut T) -> Result<(usize, usize)> {
    let (cols, rows) = sink.size()?;
    sink.clear()?;
    let viewport = Viewport::for_still(cols, rows);
    let mut drawn = (0, 0);
    if !viewport.is_empty() {
        if let FrameFetch::Ready(positioned) = image.fetch(1, viewport)? {
            let frame = &positioned.frame;
            let output = render_frame(frame, &FrameBuffer::empty(), positioned.offset_x);
            sink.write(&output)?;
            drawn = (frame.width(), frame.height());
        }
    }
    sink.flush()?;
    Ok(drawn)
}

fn redraw_with_title<T: TerminalSink>(
    image: &mut StillImage,
    sink: &mut T,
    name: &str,
) -> Result<()> {
    let (width, height) = draw_still(image, sink)?;
    sink.set_title(&still_title(name, width, height))
}

/// Show the image until any key arrives (or input closes).
pub fn show_still<T: TerminalSink>(
    mut image: StillImage,
    sink: &mut T,
    commands: &Receiver<KeyCommand>,
    name: &str,
) -> Result<()> {
    let (width, height) = image.dimensions();
    log_debug(&format!("image decoded at {width}x{height}"));
    redraw_with_title(&mut image, sink, name)?;
    let mut size = sink.size()?;
    loop {
        match commands.recv_timeout(RESIZE_POLL) {
            Ok(_) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
            Err(RecvTimeoutError::Timeout) => {
                let current = sink.size()?;
                if current != size {
                    log_debug(&format!("image redraw at {}x{}", current.0, current.1));
                    size = current;
                    redraw_with_title(&mut image, sink, name)?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::RecordingSink;
    use crossbeam_channel::bounded;
    use image::{Rgba, RgbaImage};

    fn red_image() -> StillImage {
        StillImage::from_image(RgbaImage::from_pixel(4, 2, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn title_names_file_and_size() {
        assert_eq!(still_title("cat.png", 640, 480), "cat.png @ 640x480px");
    }

    #[test]
    fn draw_still_writes_every_pixel() {
        let mut sink = RecordingSink::new(8, 200);
        let mut image = red_image();
        assert_eq!(draw_still(&mut image, &mut sink).expect("draw"), (4, 2));
        assert_eq!(sink.clears, 1);
        assert_eq!(sink.output.matches("\x1b[48;2;255;0;0m").count(), 4 * 2);
    }

    #[test]
    fn show_still_returns_on_any_key() {
        let (tx, rx) = bounded(1);
        tx.send(KeyCommand::Unknown).expect("send");
        let mut sink = RecordingSink::new(20, 10);
        show_still(red_image(), &mut sink, &rx, "red.png").expect("show");
        // 20x10 cells fit a 10x9 pixel area; the 2:1 image is drawn at 10x5.
        assert_eq!(sink.titles, vec!["red.png @ 10x5px".to_string()]);
        assert!(sink.output.starts_with("\x1b[H"));
    }

    #[test]
    fn show_still_returns_when_input_closes() {
        let (tx, rx) = bounded::<KeyCommand>(1);
        drop(tx);
        let mut sink = RecordingSink::new(20, 10);
        assert!(show_still(red_image(), &mut sink, &rx, "red.png").is_ok());
    }
}
