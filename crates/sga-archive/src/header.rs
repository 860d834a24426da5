//! Version-neutral view of an archive header.

use crate::version::Version;

/// Stored MD5 digests (v2 and v5 only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Md5Checksums {
    /// Digest over the ToC and data region.
    pub file: [u8; 16],
    /// Digest over the ToC region only.
    pub header: [u8; 16],
}

/// Header fields whose meaning is unknown, kept verbatim for write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderExtra {
    None,
    V7 { unk_a: u32 },
    V9 { sha256: Box<[u8; 256]> },
}

impl HeaderExtra {
    /// The zeroed extra fields a freshly built archive of `version` carries.
    pub fn default_for(version: Version) -> Self {
        match version {
            Version::V7 => Self::V7 { unk_a: 0 },
            Version::V9 => Self::V9 {
                sha256: Box::new([0u8; 256]),
            },
            _ => Self::None,
        }
    }
}

/// Archive header as decoded from any supported version.
///
/// All offsets are absolute from the start of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Archive display name.
    pub name: String,
    /// Start of the ToC region. Implied by the header length on v2.
    pub toc_offset: u64,
    /// Length of the ToC region in bytes.
    pub toc_size: u64,
    /// Start of the data region.
    pub data_offset: u64,
    /// Length of the data region (v9 only).
    pub data_size: Option<u64>,
    /// Stored digests (v2 and v5 only).
    pub checksums: Option<Md5Checksums>,
    pub extra: HeaderExtra,
}
