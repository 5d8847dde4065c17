// error.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
use std::fmt;
use std::io;

/// Errors encountered while decoding
#[derive(Debug)]
pub enum DecodeError {
    /// Input file could not be opened.
    OpenFailed(io::Error),
    /// A wrapped I/O error while reading.
    ReadFailed(io::Error),
    /// Header stamp is not `GIF87a` or `GIF89a`.
    NotGifFile,
    /// Screen descriptor missing or not yet read.
    NoScreenDesc,
    /// Image descriptor missing or not yet read.
    NoImageDesc,
    /// Neither a global nor a local color map exists for an image.
    NoColorMap,
    /// Unrecognized record separator byte.
    WrongRecordType(u8),
    /// Image larger than allowed, or more pixels requested than remain.
    DataTooBig,
    /// Allocation of an image buffer failed.
    NotEnoughMemory,
    /// Session is not in a state where this read is allowed.
    NotReadable,
    /// Compressed LZW data is invalid or corrupt.
    ImageDefect,
    /// Input ended before the structure being read was complete.
    EofTooSoon,
    /// Graphic control extension has invalid length.
    MalformedGraphicControl,
}

/// Errors encountered while encoding
#[derive(Debug)]
pub enum EncodeError {
    /// Output file could not be created.
    OpenFailed(io::Error),
    /// A wrapped I/O error while writing.
    WriteFailed(io::Error),
    /// Screen descriptor was already written.
    HasScreenDesc,
    /// An image is still open (pixels outstanding).
    HasImageDesc,
    /// Neither a global nor a local color map exists for an image.
    NoColorMap,
    /// Pixel data does not fit the image dimensions.
    DataTooBig,
    /// Output could not be flushed on close.
    CloseFailed(io::Error),
    /// Screen descriptor must be written first.
    NoScreenDesc,
    /// No image descriptor has been written.
    NoImageDesc,
    /// Pixel index outside of the effective color map.
    InvalidColorIndex,
    /// Merged color map would exceed 256 entries.
    TooManyColors,
}

/// Look up a stable message for a numeric error code.
///
/// Codes 1-14 are encoding errors, 101-114 are decoding errors.
pub fn error_string(code: u16) -> Option<&'static str> {
    Some(match code {
        1 => "Failed to open given file",
        2 => "Failed to write to given file",
        3 => "Screen descriptor has already been set",
        4 => "Image descriptor is still active",
        5 => "Neither global nor local color map",
        6 => "Number of pixels bigger than width * height",
        7 => "Failed to allocate required memory",
        8 => "Write failed (disk full?)",
        9 => "Failed to close given file",
        10 => "Given file was not opened for write",
        11 => "Screen descriptor has not been written",
        12 => "No image descriptor was written",
        13 => "Pixel index outside of color map",
        14 => "Too many colors for one color map",
        101 => "Failed to open given file",
        102 => "Failed to read from given file",
        103 => "Data is not in GIF format",
        104 => "No screen descriptor detected",
        105 => "No image descriptor detected",
        106 => "Neither global nor local color map",
        107 => "Wrong record type detected",
        108 => "Number of pixels bigger than width * height",
        109 => "Failed to allocate required memory",
        110 => "Failed to close given file",
        111 => "Given file was not opened for read",
        112 => "Image is defective, decoding aborted",
        113 => "Image EOF detected before image complete",
        114 => "Graphic control extension has wrong length",
        _ => return None,
    })
}

impl DecodeError {
    /// Get the numeric error code
    pub fn code(&self) -> u16 {
        use DecodeError::*;
        match self {
            OpenFailed(_) => 101,
            ReadFailed(_) => 102,
            NotGifFile => 103,
            NoScreenDesc => 104,
            NoImageDesc => 105,
            NoColorMap => 106,
            WrongRecordType(_) => 107,
            DataTooBig => 108,
            NotEnoughMemory => 109,
            NotReadable => 111,
            ImageDefect => 112,
            EofTooSoon => 113,
            MalformedGraphicControl => 114,
        }
    }
}

impl EncodeError {
    /// Get the numeric error code
    pub fn code(&self) -> u16 {
        use EncodeError::*;
        match self {
            OpenFailed(_) => 1,
            WriteFailed(_) => 2,
            HasScreenDesc => 3,
            HasImageDesc => 4,
            NoColorMap => 5,
            DataTooBig => 6,
            CloseFailed(_) => 9,
            NoScreenDesc => 11,
            NoImageDesc => 12,
            InvalidColorIndex => 13,
            TooManyColors => 14,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let msg = error_string(self.code()).unwrap_or("Unknown error");
        match self {
            DecodeError::OpenFailed(err) | DecodeError::ReadFailed(err) => {
                write!(fmt, "{msg}: {err}")
            }
            DecodeError::WrongRecordType(b) => {
                write!(fmt, "{msg}: 0x{b:02X}")
            }
            _ => write!(fmt, "{msg}"),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let msg = error_string(self.code()).unwrap_or("Unknown error");
        match self {
            EncodeError::OpenFailed(err)
            | EncodeError::WriteFailed(err)
            | EncodeError::CloseFailed(err) => write!(fmt, "{msg}: {err}"),
            _ => write!(fmt, "{msg}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::OpenFailed(err) | DecodeError::ReadFailed(err) => {
                Some(err)
            }
            _ => None,
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::OpenFailed(err)
            | EncodeError::WriteFailed(err)
            | EncodeError::CloseFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::EofTooSoon,
            _ => DecodeError::ReadFailed(err),
        }
    }
}

impl From<io::Error> for EncodeError {
    fn from(err: io::Error) -> Self {
        EncodeError::WriteFailed(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_code_has_message() {
        let dec = [
            DecodeError::NotGifFile,
            DecodeError::WrongRecordType(0x42),
            DecodeError::ImageDefect,
            DecodeError::EofTooSoon,
            DecodeError::MalformedGraphicControl,
        ];
        for e in dec.iter() {
            assert!(error_string(e.code()).is_some());
            assert!(e.code() > 100);
        }
        let enc = [
            EncodeError::HasScreenDesc,
            EncodeError::NoColorMap,
            EncodeError::TooManyColors,
            EncodeError::InvalidColorIndex,
        ];
        for e in enc.iter() {
            assert!(error_string(e.code()).is_some());
            assert!(e.code() < 100);
        }
        assert_eq!(error_string(0), None);
        assert_eq!(error_string(200), None);
    }

    #[test]
    fn unexpected_eof() {
        let e = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(DecodeError::from(e), DecodeError::EofTooSoon));
        let e = io::Error::new(io::ErrorKind::Other, "bad");
        assert!(matches!(DecodeError::from(e), DecodeError::ReadFailed(_)));
    }

    #[test]
    fn display() {
        let e = DecodeError::WrongRecordType(0x42);
        assert_eq!(e.to_string(), "Wrong record type detected: 0x42");
        assert_eq!(
            EncodeError::TooManyColors.to_string(),
            "Too many colors for one color map"
        );
    }
}
