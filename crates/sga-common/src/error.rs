//! Error types for sga-common.

use thiserror::Error;

/// Common error type for SGA binary primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// UTF-16 decoding error.
    #[error("UTF-16 error: {0}")]
    Utf16(#[from] std::string::FromUtf16Error),

    /// Fixed-width field text contained a non-ASCII byte.
    #[error("non-ASCII byte {byte:#04x} at position {position}")]
    NonAscii { byte: u8, position: usize },

    /// Text does not fit in its fixed-width field.
    #[error("text of {len} bytes does not fit in a {width}-byte field")]
    TextTooLong { len: usize, width: usize },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
