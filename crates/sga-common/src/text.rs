//! Fixed-width text fields.
//!
//! SGA headers store names in fixed-size buffers padded with NUL: drive
//! aliases as single-byte ASCII, the archive name as UTF-16LE.

use crate::{Error, Result};

/// Decode a NUL-padded ASCII buffer, stopping at the first NUL.
pub fn decode_ascii(bytes: &[u8]) -> Result<&str> {
    let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    let text = &bytes[..end];
    if let Some(position) = text.iter().position(|b| !b.is_ascii()) {
        return Err(Error::NonAscii {
            byte: text[position],
            position,
        });
    }
    std::str::from_utf8(text).map_err(Error::Utf8)
}

/// Encode `text` as ASCII into a NUL-padded buffer of exactly `width` bytes.
pub fn encode_ascii(text: &str, width: usize) -> Result<Vec<u8>> {
    if let Some(position) = text.bytes().position(|b| !b.is_ascii()) {
        return Err(Error::NonAscii {
            byte: text.as_bytes()[position],
            position,
        });
    }
    if text.len() > width {
        return Err(Error::TextTooLong {
            len: text.len(),
            width,
        });
    }
    let mut out = vec![0u8; width];
    out[..text.len()].copy_from_slice(text.as_bytes());
    Ok(out)
}

/// Decode a NUL-padded UTF-16LE buffer, stopping at the first NUL code unit.
pub fn decode_utf16_le(bytes: &[u8]) -> Result<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16(&units).map_err(Error::Utf16)
}

/// Encode `text` as UTF-16LE into a NUL-padded buffer of exactly `width` bytes.
pub fn encode_utf16_le(text: &str, width: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(width);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    if out.len() > width {
        return Err(Error::TextTooLong {
            len: out.len(),
            width,
        });
    }
    out.resize(width, 0);
    Ok(out)
}
