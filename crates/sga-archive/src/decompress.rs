//! zlib helpers for file payloads.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::io::MAX_PREALLOC;
use crate::{Error, Result};

/// Inflate `data`, which must expand to exactly `expected_size` bytes.
///
/// The decoder is capped one byte past the declared size so an oversized
/// stream is reported without inflating all of it. The declared size only
/// bounds the output; it is not reserved up front.
pub fn inflate_sized(data: &[u8], expected_size: u64) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size.min(MAX_PREALLOC) as usize);

    ZlibDecoder::new(data)
        .take(expected_size.saturating_add(1))
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    if output.len() as u64 != expected_size {
        return Err(Error::SizeMismatch {
            expected: expected_size,
            actual: output.len() as u64,
        });
    }
    Ok(output)
}

/// Deflate `data` into a zlib stream.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| Error::Compression(e.to_string()))
}
