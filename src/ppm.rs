//! Streaming reader and writer for binary (P6) pixmaps.
//!
//! The header is `P6\n` followed by three unsigned decimal fields, each ended
//! by a single separator byte: height, width, max brightness. The field order
//! is height first on both the read and the write side. Pixel triples follow
//! in row-major order and the file ends with one trailing byte, normally `\n`.

use std::io::{BufReader, BufWriter, Read, Write};

use tracing::{debug, warn};

use crate::error::{DecodeError, EncodeError, FormatError, HeaderField, Stage};
use crate::pixel::{PixelColor, SAMPLES_PER_PIXEL};
use crate::raster::RasterImage;

pub const MAGIC: &[u8; 3] = b"P6\n";
pub const MAX_BRIGHTNESS_LIMIT: u32 = 255;
const TRAILER: u8 = b'\n';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub height: u32,
    pub width: u32,
    pub max_brightness: u32,
}

impl Header {
    pub fn pixel_count(&self) -> Option<usize> {
        (self.height as usize).checked_mul(self.width as usize)
    }
}

/// Decodes a whole P6 image from `input`.
///
/// Nothing is handed back unless every header field, every pixel and the
/// trailing byte were read. Bytes left after the trailing byte only produce
/// a warning.
pub fn decode<R: Read>(input: R) -> Result<RasterImage, DecodeError> {
    let mut reader = BufReader::new(input);

    let header = read_header(&mut reader)?;
    debug!(
        height = header.height,
        width = header.width,
        max_brightness = header.max_brightness,
        "decoded ppm header"
    );

    let pixels = read_pixels(&mut reader, &header)?;
    read_byte(&mut reader, Stage::TrailingByte)?;

    if !at_end(&mut reader).map_err(DecodeError::Io)? {
        warn!("Pixels were read, but end of file not reached");
    }

    Ok(RasterImage::new(header, pixels))
}

/// Writes `image` as a P6 file and flushes `output`.
pub fn encode<W: Write>(image: &RasterImage, output: W) -> Result<(), EncodeError> {
    let mut writer = BufWriter::new(output);

    writer.write_all(MAGIC)?;
    write!(
        writer,
        "{} {}\n{}\n",
        image.height(),
        image.width(),
        image.max_brightness()
    )?;
    for pixel in image.pixels() {
        writer.write_all(&pixel.to_rgb8())?;
    }
    writer.write_all(&[TRAILER])?;

    writer.flush()?;
    Ok(())
}

pub fn read_header<R: Read>(reader: &mut R) -> Result<Header, DecodeError> {
    let mut magic = [0u8; 3];
    reader
        .read_exact(&mut magic)
        .map_err(|e| DecodeError::from_read(Stage::Magic, e))?;
    if &magic != MAGIC {
        return Err(FormatError::BadMagic { found: magic }.into());
    }

    let height = read_field(reader, HeaderField::Height)?;
    let width = read_field(reader, HeaderField::Width)?;
    let max_brightness = read_field(reader, HeaderField::MaxBrightness)?;
    if max_brightness > MAX_BRIGHTNESS_LIMIT {
        return Err(FormatError::UnsupportedBrightness { max_brightness }.into());
    }

    Ok(Header {
        height,
        width,
        max_brightness,
    })
}

fn read_pixels<R: Read>(reader: &mut R, header: &Header) -> Result<Vec<PixelColor>, DecodeError> {
    let allocation = || DecodeError::Allocation {
        height: header.height,
        width: header.width,
    };
    let count = header.pixel_count().ok_or_else(allocation)?;

    let mut pixels = Vec::new();
    pixels.try_reserve_exact(count).map_err(|_| allocation())?;

    let mut triple = [0u8; SAMPLES_PER_PIXEL];
    for _ in 0..count {
        reader
            .read_exact(&mut triple)
            .map_err(|e| DecodeError::from_read(Stage::PixelData, e))?;
        let [r, g, b] = triple;
        pixels.push(PixelColor::from_rgb8(r, g, b));
    }
    return Ok(pixels);
}

/// Reads decimal digits up to and including the first non-digit byte, which
/// is consumed as the separator.
fn read_field<R: Read>(reader: &mut R, field: HeaderField) -> Result<u32, DecodeError> {
    let stage = Stage::Header(field);
    let mut value: u32 = 0;
    let mut digits = 0;
    loop {
        let byte = read_byte(reader, stage)?;
        if !byte.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((byte - b'0') as u32))
            .ok_or(FormatError::FieldOverflow { field })?;
        digits += 1;
    }
    if digits == 0 {
        return Err(FormatError::MissingField { field }.into());
    }
    Ok(value)
}

fn read_byte<R: Read>(reader: &mut R, stage: Stage) -> Result<u8, DecodeError> {
    let mut buf = [0u8; 1];
    reader
        .read_exact(&mut buf)
        .map_err(|e| DecodeError::from_read(stage, e))?;
    Ok(buf[0])
}

fn at_end<R: Read>(reader: &mut R) -> std::io::Result<bool> {
    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(n) => return Ok(n == 0),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    fn ppm(header: &str, samples: &[u8], trailer: &[u8]) -> Vec<u8> {
        let mut bytes = header.as_bytes().to_vec();
        bytes.extend_from_slice(samples);
        bytes.extend_from_slice(trailer);
        bytes
    }

    fn encode_to_vec(image: &RasterImage) -> Vec<u8> {
        let mut out = Vec::new();
        encode(image, &mut out).unwrap();
        out
    }

    #[test]
    fn decodes_header_in_height_width_order() {
        let input = ppm("P6\n2 3\n255\n", &[7u8; 18], b"\n");
        let image = decode(Cursor::new(input)).unwrap();

        assert_eq!(image.height(), 2);
        assert_eq!(image.width(), 3);
        assert_eq!(image.max_brightness(), 255);
        assert_eq!(image.pixels().len(), 6);
    }

    #[test]
    fn pixels_keep_stream_order() {
        let samples = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let input = ppm("P6\n2 2\n255\n", &samples, b"\n");
        let image = decode(Cursor::new(input)).unwrap();

        let decoded: Vec<u8> = image.pixels().iter().flat_map(|p| p.to_rgb8()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn any_non_digit_separates_fields() {
        let input = ppm("P6\n1\t1 255\r", &[9, 8, 7], b"\n");
        let image = decode(Cursor::new(input)).unwrap();
        assert_eq!((image.height(), image.width()), (1, 1));
        assert_eq!(image.pixels()[0].to_rgb8(), [9, 8, 7]);
    }

    #[test]
    fn every_sample_value_round_trips() {
        let samples: Vec<u8> = (0..=255u8).flat_map(|s| [s, s, s]).collect();
        let input = ppm("P6\n16 16\n255\n", &samples, b"\n");
        let image = decode(Cursor::new(input.clone())).unwrap();
        assert_eq!(encode_to_vec(&image), input);
    }

    #[test]
    fn rejects_other_magic_numbers() {
        for magic in ["P3\n", "P6 ", "p6\n", "GIF"] {
            let input = ppm(&format!("{}1 1\n255\n", magic), &[0, 0, 0], b"\n");
            match decode(Cursor::new(input)) {
                Err(DecodeError::Format(FormatError::BadMagic { found })) => {
                    assert_eq!(&found, magic.as_bytes())
                }
                other => panic!("expected bad magic for {:?}, got {:?}", magic, other),
            }
        }
    }

    #[test]
    fn rejects_brightness_over_255() {
        let input = ppm("P6\n1 1\n65535\n", &[0; 6], b"\n");
        match decode(Cursor::new(input)) {
            Err(DecodeError::Format(FormatError::UnsupportedBrightness { max_brightness })) => {
                assert_eq!(max_brightness, 65535)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_missing_and_oversized_fields() {
        let input = ppm("P6\n1  1\n255\n", &[0; 3], b"\n");
        assert!(matches!(
            decode(Cursor::new(input)),
            Err(DecodeError::Format(FormatError::MissingField { field: HeaderField::Width }))
        ));

        let input = ppm("P6\n99999999999 1\n255\n", &[0; 3], b"\n");
        assert!(matches!(
            decode(Cursor::new(input)),
            Err(DecodeError::Format(FormatError::FieldOverflow { field: HeaderField::Height }))
        ));
    }

    #[test]
    fn truncation_is_reported_per_stage() {
        let cases: [(&[u8], Stage); 5] = [
            (b"P6", Stage::Magic),
            (b"P6\n12", Stage::Header(HeaderField::Height)),
            (b"P6\n1 1\n25", Stage::Header(HeaderField::MaxBrightness)),
            (b"P6\n1 2\n255\n\x00\x00\x00\xff", Stage::PixelData),
            (b"P6\n1 1\n255\n\x00\x00\x00", Stage::TrailingByte),
        ];
        for (input, expected) in cases {
            match decode(Cursor::new(input)) {
                Err(DecodeError::Truncated { stage }) => assert_eq!(stage, expected),
                other => panic!("expected truncation at {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn huge_dimensions_fail_allocation() {
        let input = ppm("P6\n4294967295 4294967295\n255\n", &[], b"");
        assert!(matches!(
            decode(Cursor::new(input)),
            Err(DecodeError::Allocation { height: 4294967295, width: 4294967295 })
        ));
    }

    #[test]
    fn trailing_garbage_is_not_an_error() {
        let input = ppm("P6\n1 1\n255\n", &[1, 2, 3], b"\nextra bytes");
        let (result, log) = decode_logged(&input);
        assert_eq!(result.unwrap().pixels()[0].to_rgb8(), [1, 2, 3]);
        assert!(log.contains("WARN"), "{}", log);
        assert!(log.contains("end of file not reached"), "{}", log);
    }

    #[test]
    fn clean_end_of_file_logs_no_warning() {
        let input = ppm("P6\n1 1\n255\n", &[1, 2, 3], b"\n");
        let (result, log) = decode_logged(&input);
        assert!(result.is_ok());
        assert!(!log.contains("WARN"), "{}", log);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Decodes with a subscriber installed and returns what it printed.
    fn decode_logged(input: &[u8]) -> (Result<RasterImage, DecodeError>, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || decode(Cursor::new(input)));
        let log = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (result, log)
    }

    #[test]
    fn end_of_input_probe() {
        assert!(at_end(&mut Cursor::new(b"")).unwrap());
        assert!(!at_end(&mut Cursor::new(b"x")).unwrap());
    }

    #[test]
    fn empty_image() {
        let input = ppm("P6\n0 5\n255\n", &[], b"\n");
        let image = decode(Cursor::new(input.clone())).unwrap();
        assert!(image.pixels().is_empty());
        assert_eq!(encode_to_vec(&image), input);
    }

    #[test]
    fn encode_writes_canonical_header() {
        let input = ppm("P6\n1\t2\t200 ", &[0, 0, 0, 255, 255, 255], b"\r");
        let image = decode(Cursor::new(input)).unwrap();
        assert_eq!(
            encode_to_vec(&image),
            ppm("P6\n1 2\n200\n", &[0, 0, 0, 255, 255, 255], b"\n")
        );
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let input = ppm("P6\n1 1\n255\n", &[1, 2, 3], b"\n");
        let image = decode(Cursor::new(input)).unwrap();
        assert!(matches!(encode(&image, FailingWriter), Err(EncodeError::Io(_))));
    }
}
