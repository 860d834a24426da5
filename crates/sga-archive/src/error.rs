//! Error types for the SGA archive crate.

use thiserror::Error;

use crate::checksum::ChecksumKind;
use crate::version::Version;

/// Errors that can occur when working with SGA archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] sga_common::Error),

    /// The stream does not start with `_ARCHIVE`.
    #[error("invalid archive magic: expected '_ARCHIVE', got {actual:?}")]
    BadMagic { actual: Vec<u8> },

    /// No codec is registered for this version pair.
    #[error("unsupported archive version {received} (known: {known:?})")]
    UnsupportedVersion {
        received: Version,
        known: Vec<Version>,
    },

    /// A field required to hold a fixed sentinel held something else.
    #[error("reserved field {field}: expected {expected}, got {actual}")]
    ReservedField {
        field: &'static str,
        expected: u32,
        actual: u32,
    },

    /// A name could not be resolved or is not valid text.
    #[error("invalid name for {context}: {reason}")]
    InvalidName { context: String, reason: String },

    /// Index ranges overlap, are inverted, or point outside their table.
    #[error("structural error: {0}")]
    Structural(String),

    /// A read came up short against a declared length.
    #[error("truncated {what}: expected {expected}, got {actual}")]
    TruncatedData {
        what: &'static str,
        expected: u64,
        actual: u64,
    },

    /// Decompressed length disagrees with the declared length.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// A stored MD5 digest does not match the recomputed one.
    #[error("{kind} checksum mismatch: expected {expected:02x?}, got {actual:02x?}")]
    ChecksumMismatch {
        kind: ChecksumKind,
        expected: [u8; 16],
        actual: [u8; 16],
    },

    /// This version carries no MD5 checksums to validate.
    #[error("archive version {0} carries no checksums")]
    ChecksumsUnsupported(Version),

    /// Unknown storage type code.
    #[error("invalid storage type: {0}")]
    InvalidStorageType(u32),

    /// Unknown verification type code.
    #[error("invalid verification type: {0}")]
    InvalidVerificationType(u8),

    /// The file has no cached bytes to transform.
    #[error("file not materialized: {0}")]
    NotMaterialized(String),

    /// A value does not fit the on-disk width of its field.
    #[error("value {value} does not fit field {field}")]
    FieldOverflow { field: &'static str, value: u64 },

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Compression error.
    #[error("compression error: {0}")]
    Compression(String),

    /// File not found.
    #[error("file not found: {0}")]
    FileNotFound(String),
}

/// Result type for SGA archive operations.
pub type Result<T> = std::result::Result<T, Error>;
