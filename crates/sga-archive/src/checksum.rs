//! Salted MD5 validation for v2 and v5 archives.
//!
//! Both digests start with a fixed 36-byte salt and cover bytes from the
//! start of the ToC: the file digest runs to the end of the stream, the
//! header digest covers only the ToC itself. Input is streamed in
//! fixed-size chunks so large archives are never loaded whole.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use md5::{Digest, Md5};
use tracing::debug;

use crate::header::{ArchiveHeader, Md5Checksums};
use crate::version::Version;
use crate::{Error, Result};

/// Salt mixed into the file digest.
pub const FILE_MD5_EIGEN: &[u8; 36] = b"E01519D6-2DB7-4640-AF54-0A23319C56C3";

/// Salt mixed into the header digest.
pub const HEADER_MD5_EIGEN: &[u8; 36] = b"DFC9AF62-FC1B-4180-BC27-11CCE87D3EFF";

const CHUNK_SIZE: usize = 64 * 1024;

/// Which stored digest a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    File,
    Header,
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Header => f.write_str("header"),
        }
    }
}

/// Salted MD5 of `len` bytes at `start`, or of everything from `start` to
/// the end of the stream when `len` is `None`.
fn salted_digest<R: Read + Seek + ?Sized>(
    reader: &mut R,
    eigen: &[u8],
    start: u64,
    len: Option<u64>,
) -> Result<[u8; 16]> {
    reader.seek(SeekFrom::Start(start))?;

    let mut hasher = Md5::new();
    hasher.update(eigen);

    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut remaining = len;
    let mut hashed = 0u64;
    loop {
        let want = match remaining {
            Some(0) => break,
            Some(left) => chunk.len().min(usize::try_from(left).unwrap_or(usize::MAX)),
            None => chunk.len(),
        };
        let n = match reader.read(&mut chunk[..want]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        };
        if n == 0 {
            if let Some(left) = remaining {
                return Err(Error::TruncatedData {
                    what: "checksum region",
                    expected: hashed + left,
                    actual: hashed,
                });
            }
            break;
        }
        hasher.update(&chunk[..n]);
        hashed += n as u64;
        remaining = remaining.map(|left| left - n as u64);
    }

    let mut out = [0u8; 16];
    out.copy_from_slice(&hasher.finalize());
    Ok(out)
}

/// Compute both digests for an archive that starts at `base` in `reader`.
pub fn compute_at<R: Read + Seek + ?Sized>(
    reader: &mut R,
    base: u64,
    header: &ArchiveHeader,
) -> Result<Md5Checksums> {
    let start = base + header.toc_offset;
    let file = salted_digest(reader, FILE_MD5_EIGEN, start, None)?;
    let header = salted_digest(reader, HEADER_MD5_EIGEN, start, Some(header.toc_size))?;
    Ok(Md5Checksums { file, header })
}

/// Recompute both digests and compare them with the ones stored in
/// `header`, for an archive that starts at `base` in `reader`.
///
/// A header without stored digests is `ChecksumsUnsupported`.
pub fn verify_at<R: Read + Seek + ?Sized>(
    reader: &mut R,
    base: u64,
    header: &ArchiveHeader,
    version: Version,
) -> Result<()> {
    let stored = header
        .checksums
        .ok_or(Error::ChecksumsUnsupported(version))?;
    let actual = compute_at(reader, base, header)?;

    // The cheaper header digest is checked first so a corrupt ToC is
    // reported as such.
    if actual.header != stored.header {
        return Err(Error::ChecksumMismatch {
            kind: ChecksumKind::Header,
            expected: stored.header,
            actual: actual.header,
        });
    }
    if actual.file != stored.file {
        return Err(Error::ChecksumMismatch {
            kind: ChecksumKind::File,
            expected: stored.file,
            actual: actual.file,
        });
    }

    debug!(%version, "checksums verified");
    Ok(())
}
