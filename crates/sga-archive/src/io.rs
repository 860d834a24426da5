//! Stream helpers shared by the decoder and the file store.

use std::io::{self, Read};

use crate::{Error, Result};

/// Fill `buf` completely, reporting a short read as `TruncatedData`.
pub(crate) fn read_exact_checked<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    what: &'static str,
) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }

    if filled < buf.len() {
        return Err(Error::TruncatedData {
            what,
            expected: buf.len() as u64,
            actual: filled as u64,
        });
    }
    Ok(())
}

/// Upper bound on buffer space reserved from a length read off disk.
pub(crate) const MAX_PREALLOC: u64 = 1 << 20;

/// Read exactly `len` bytes into a new buffer.
///
/// The buffer grows as bytes arrive, so a corrupt length cannot force a
/// large allocation on a short stream.
pub(crate) fn read_vec_checked<R: Read + ?Sized>(
    reader: &mut R,
    len: u64,
    what: &'static str,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC) as usize);
    reader.take(len).read_to_end(&mut buf)?;

    if (buf.len() as u64) < len {
        return Err(Error::TruncatedData {
            what,
            expected: len,
            actual: buf.len() as u64,
        });
    }
    Ok(buf)
}
