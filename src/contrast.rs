use tracing::debug;

use crate::conditional_paralell::{prelude::*, WorkerPool};
use crate::pixel::{Channel, PixelColor};

/// Smallest and largest luma seen so far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LuminanceRange {
    pub min: Channel,
    pub max: Channel,
}

impl Default for LuminanceRange {
    fn default() -> Self {
        LuminanceRange::EMPTY
    }
}

impl LuminanceRange {
    /// Inverted bounds, replaced by the first real luma folded in.
    pub const EMPTY: LuminanceRange = LuminanceRange { min: 1.0, max: -1.0 };

    pub fn include(self, y: Channel) -> LuminanceRange {
        LuminanceRange {
            min: self.min.min(y),
            max: self.max.max(y),
        }
    }

    pub fn merge(self, other: LuminanceRange) -> LuminanceRange {
        LuminanceRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    /// Linear map of `y` from `[min, max]` onto `[0, 1]`. A degenerate range
    /// leaves `y` untouched.
    pub fn stretch(&self, y: Channel) -> Channel {
        if self.is_degenerate() {
            return y;
        }
        (y - self.min) / (self.max - self.min)
    }
}

fn chunk_len(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1)).max(1)
}

/// First pass: moves every pixel to YCbCr and reduces the luma extremes.
///
/// The buffer is cut into one contiguous chunk per worker. Each worker folds
/// a private range and the partial ranges are merged once all are done.
pub fn luminance_extremes(pixels: &mut [PixelColor], workers: usize) -> LuminanceRange {
    let partials: Vec<LuminanceRange> = pixels
        .par_chunks_mut(chunk_len(pixels.len(), workers))
        .map(|chunk| {
            chunk.iter_mut().fold(LuminanceRange::EMPTY, |range, pixel| {
                range.include(pixel.to_ycbcr().y)
            })
        })
        .collect();

    partials
        .into_iter()
        .fold(LuminanceRange::EMPTY, LuminanceRange::merge)
}

/// Second pass: stretches every pixel's luma over `range` and returns it to RGB.
pub fn stretch_luminance(pixels: &mut [PixelColor], range: LuminanceRange, workers: usize) {
    pixels
        .par_chunks_mut(chunk_len(pixels.len(), workers))
        .for_each(|chunk| {
            for pixel in chunk.iter_mut() {
                let mut ycbcr = pixel.ycbcr();
                ycbcr.y = range.stretch(ycbcr.y);
                *pixel = PixelColor::YCbCr(ycbcr);
                pixel.to_rgb();
            }
        });
}

/// Runs both passes on a pool sized by `threads` (0 for the platform default).
///
/// `bounds` is the range accumulated by earlier runs; the returned range is
/// `bounds` widened by this buffer's extremes and is the one used to stretch.
pub fn improve_contrast(
    pixels: &mut [PixelColor],
    bounds: LuminanceRange,
    threads: usize,
) -> LuminanceRange {
    improve_contrast_in(pixels, bounds, &WorkerPool::new(threads))
}

/// Same as [`improve_contrast`] on an existing pool, so repeated passes do
/// not pay for spawning workers.
pub fn improve_contrast_in(
    pixels: &mut [PixelColor],
    bounds: LuminanceRange,
    pool: &WorkerPool,
) -> LuminanceRange {
    pool.install(|workers| {
        let range = bounds.merge(luminance_extremes(pixels, workers));
        debug!(workers, min_y = range.min, max_y = range.max, "luminance range");
        stretch_luminance(pixels, range, workers);
        range
    })
}
