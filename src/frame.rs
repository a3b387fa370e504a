//! Row-major RGBA pixel grid handed from frame sources to the renderer.

use image::RgbaImage;

use crate::color::Rgb;

const CHANNELS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for _ in 0..width * height {
            data.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// The "nothing on screen" frame; diffing against it redraws everything.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn same_dimensions(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) * CHANNELS
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let idx = self.offset(x, y);
        Rgb::new(self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    /// Overwrite the color channels of one pixel; alpha is left alone.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        let idx = self.offset(x, y);
        self.data[idx] = color.r;
        self.data[idx + 1] = color.g;
        self.data[idx + 2] = color.b;
    }

    pub fn map_row(&mut self, y: usize, mut f: impl FnMut(usize, Rgb) -> Rgb) {
        for x in 0..self.width {
            let next = f(x, self.pixel(x, y));
            self.set_pixel(x, y, next);
        }
    }
}
