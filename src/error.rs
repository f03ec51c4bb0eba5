use std::path::PathBuf;

use thiserror::Error;

/// Which part of the stream was being read when input ran out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Magic,
    Header(HeaderField),
    PixelData,
    TrailingByte,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderField {
    Height,
    Width,
    MaxBrightness,
}

impl std::fmt::Display for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderField::Height => write!(f, "height"),
            HeaderField::Width => write!(f, "width"),
            HeaderField::MaxBrightness => write!(f, "max brightness"),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Magic => write!(f, "magic number"),
            Stage::Header(field) => write!(f, "{} field", field),
            Stage::PixelData => write!(f, "pixel data"),
            Stage::TrailingByte => write!(f, "trailing byte"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Bad magic number {found:?}, not a P6 ppm file")]
    BadMagic { found: [u8; 3] },

    #[error("Header {field} has no digits")]
    MissingField { field: HeaderField },

    #[error("Header {field} does not fit in 32 bits")]
    FieldOverflow { field: HeaderField },

    #[error("Max brightness {max_brightness} > 255 not supported")]
    UnsupportedBrightness { max_brightness: u32 },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Wrong file format: {0}")]
    Format(#[from] FormatError),

    #[error("Premature end of file while reading {stage}")]
    Truncated { stage: Stage },

    #[error("File read error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Cannot allocate {height}x{width} pixels")]
    Allocation { height: u32, width: u32 },
}

impl DecodeError {
    /// Maps a failed read at `stage`, keeping short reads apart from device errors.
    pub(crate) fn from_read(stage: Stage, err: std::io::Error) -> DecodeError {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => DecodeError::Truncated { stage },
            _ => DecodeError::Io(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("File write error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_format_error_messages() {
        let error = FormatError::UnsupportedBrightness { max_brightness: 65535 };
        assert_eq!(error.to_string(), "Max brightness 65535 > 255 not supported");

        let error = FormatError::MissingField { field: HeaderField::Width };
        assert_eq!(error.to_string(), "Header width has no digits");

        let error = FormatError::BadMagic { found: *b"P3\n" };
        assert_eq!(error.to_string(), "Bad magic number [80, 51, 10], not a P6 ppm file");
    }

    #[test]
    fn test_decode_error_messages() {
        let error = DecodeError::Truncated { stage: Stage::PixelData };
        assert_eq!(error.to_string(), "Premature end of file while reading pixel data");

        let error = DecodeError::Truncated { stage: Stage::Header(HeaderField::MaxBrightness) };
        assert_eq!(error.to_string(), "Premature end of file while reading max brightness field");

        let error = DecodeError::Allocation { height: 3, width: 4 };
        assert_eq!(error.to_string(), "Cannot allocate 3x4 pixels");

        let error: DecodeError = FormatError::FieldOverflow { field: HeaderField::Height }.into();
        assert_eq!(error.to_string(), "Wrong file format: Header height does not fit in 32 bits");
    }

    #[test]
    fn test_short_read_is_truncation() {
        let error = DecodeError::from_read(Stage::Magic, Error::from(ErrorKind::UnexpectedEof));
        assert!(matches!(error, DecodeError::Truncated { stage: Stage::Magic }));

        let error = DecodeError::from_read(Stage::Magic, Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(error, DecodeError::Io(_)));
    }
}
