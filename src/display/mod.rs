//! Monochrome display support: a pixel buffer, the stripe bit-packer that turns it into SysEx,
//! and a lock-protected wrapper for drawing from one thread while another flushes.

mod shared;
mod stripe;

pub use shared::*;
pub use stripe::*;

use crate::util::Array2d;

/// A monochrome pixel buffer. `true` is a lit pixel.
///
/// Reads outside the buffer return `false` and writes outside it are ignored, so a bitmap smaller
/// than the display just leaves the rest dark.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Bitmap {
    pixels: Array2d<bool>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: Array2d::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels.get(x, y).unwrap_or(false)
    }

    /// Returns false if the position is outside the bitmap
    pub fn set(&mut self, x: usize, y: usize, lit: bool) -> bool {
        self.pixels.set(x, y, lit).is_some()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    pub fn fill(&mut self, lit: bool) {
        self.pixels.fill(lit);
    }

    pub fn lit_count(&self) -> usize {
        let mut count = 0;
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.get(x, y) {
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(feature = "embedded-graphics")]
impl embedded_graphics::geometry::OriginDimensions for Bitmap {
    fn size(&self) -> embedded_graphics::geometry::Size {
        embedded_graphics::geometry::Size::new(self.width() as u32, self.height() as u32)
    }
}

#[cfg(feature = "embedded-graphics")]
impl embedded_graphics::draw_target::DrawTarget for Bitmap {
    type Color = embedded_graphics::pixelcolor::BinaryColor;
    type Error = std::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        for embedded_graphics::Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            self.set(point.x as usize, point.y as usize, color.is_on());
        }
        Ok(())
    }
}
