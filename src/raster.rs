use std::io::{Read, Write};

use image::{Rgb, RgbImage};
use itertools::{Itertools, MinMaxResult};

use crate::conditional_paralell::WorkerPool;
use crate::contrast::{self, LuminanceRange};
use crate::error::{DecodeError, EncodeError};
use crate::pixel::{Channel, PixelBuffer, PixelColor};
use crate::ppm::{self, Header};

/// A decoded P6 image. The only way to obtain one is [`RasterImage::decode`].
///
/// `Clone` copies the whole pixel buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    height: u32,
    width: u32,
    max_brightness: u32,
    pixels: PixelBuffer,
    luminance: LuminanceRange,
}

impl RasterImage {
    pub(crate) fn new(header: Header, pixels: PixelBuffer) -> RasterImage {
        RasterImage {
            height: header.height,
            width: header.width,
            max_brightness: header.max_brightness,
            pixels,
            luminance: LuminanceRange::EMPTY,
        }
    }

    pub fn decode<R: Read>(input: R) -> Result<RasterImage, DecodeError> {
        ppm::decode(input)
    }

    pub fn encode<W: Write>(&self, output: W) -> Result<(), EncodeError> {
        ppm::encode(self, output)
    }

    /// Stretches luma over `[0, 1]` in place using up to `threads` workers.
    pub fn improve_contrast(&mut self, threads: usize) -> &mut RasterImage {
        self.luminance = contrast::improve_contrast(&mut self.pixels, self.luminance, threads);
        return self;
    }

    /// Like [`RasterImage::improve_contrast`] but on a pool the caller keeps.
    pub fn improve_contrast_in(&mut self, pool: &WorkerPool) -> &mut RasterImage {
        self.luminance = contrast::improve_contrast_in(&mut self.pixels, self.luminance, pool);
        return self;
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn max_brightness(&self) -> u32 {
        self.max_brightness
    }

    pub fn pixels(&self) -> &[PixelColor] {
        &self.pixels
    }

    /// Lowest luma used by the last contrast pass; `1.0` before any pass.
    pub fn min_y(&self) -> Channel {
        self.luminance.min
    }

    /// Highest luma used by the last contrast pass; `-1.0` before any pass.
    pub fn max_y(&self) -> Channel {
        self.luminance.max
    }

    /// Luma extremes of the pixels as they are now, `None` when there are none.
    pub fn luminance_range(&self) -> Option<(Channel, Channel)> {
        match self
            .pixels
            .iter()
            .map(PixelColor::luminance)
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(y) => Some((y, y)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        }
    }

    /// Copies into an `image` buffer, with `width` columns and `height` rows.
    pub fn to_rgb_image(&self) -> RgbImage {
        let width = self.width as usize;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb(self.pixels[y as usize * width + x as usize].to_rgb8())
        })
    }
}
