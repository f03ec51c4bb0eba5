//! Linear contrast stretch for binary (P6) pixmaps.
//!
//! ```no_run
//! use std::fs::File;
//! use ppm_contrast::RasterImage;
//!
//! let mut image = RasterImage::decode(File::open("in.ppm")?)?;
//! image.improve_contrast(0);
//! image.encode(File::create("out.ppm")?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod conditional_paralell;
pub mod config;
pub mod contrast;
pub mod error;
pub mod pixel;
pub mod ppm;
pub mod raster;

pub use conditional_paralell::WorkerPool;
pub use config::RunConfig;
pub use error::{ConfigError, DecodeError, EncodeError, FormatError};
pub use pixel::PixelColor;
pub use raster::RasterImage;

use std::io::{Read, Write};

pub fn decode<R: Read>(input: R) -> Result<RasterImage, DecodeError> {
    ppm::decode(input)
}

/// Never fails. `thread_hint` of 0 uses the platform default.
pub fn improve_contrast(image: &mut RasterImage, thread_hint: usize) {
    image.improve_contrast(thread_hint);
}

pub fn encode<W: Write>(image: &RasterImage, output: W) -> Result<(), EncodeError> {
    ppm::encode(image, output)
}
