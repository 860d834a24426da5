//! Archive magic and version descriptor.
//!
//! The version pair right after the magic selects the codec. Lookup is by
//! exact identity: an unregistered pair is never decoded on a best guess.

use std::fmt;
use std::io::Read;

use crate::codec::{ArchiveCodec, V2, V5, V7, V9};
use crate::io::read_exact_checked;
use crate::{Error, Result};

/// Magic word at the start of every SGA archive.
pub const MAGIC: &[u8; 8] = b"_ARCHIVE";

/// Size of the magic word plus the version pair.
pub const PREAMBLE_LEN: u64 = 12;

/// An archive format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    /// Dawn of War.
    pub const V2: Self = Self::new(2, 0);
    /// Dawn of War II.
    pub const V5: Self = Self::new(5, 0);
    /// Company of Heroes 2.
    pub const V7: Self = Self::new(7, 0);
    /// Company of Heroes 3, Age of Empires IV.
    pub const V9: Self = Self::new(9, 0);

    /// Every version with a registered codec.
    pub const KNOWN: [Self; 4] = [Self::V2, Self::V5, Self::V7, Self::V9];

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Look up the codec registered for this exact version.
    pub(crate) fn codec(self) -> Result<&'static dyn ArchiveCodec> {
        match (self.major, self.minor) {
            (2, 0) => Ok(&V2),
            (5, 0) => Ok(&V5),
            (7, 0) => Ok(&V7),
            (9, 0) => Ok(&V9),
            _ => Err(Error::UnsupportedVersion {
                received: self,
                known: Self::KNOWN.to_vec(),
            }),
        }
    }

    pub(crate) fn to_bytes(self) -> [u8; 4] {
        let mut out = [0u8; 4];
        out[..2].copy_from_slice(&self.major.to_le_bytes());
        out[2..].copy_from_slice(&self.minor.to_le_bytes());
        out
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// Read the magic word and version pair and resolve the codec.
///
/// Consumes exactly [`PREAMBLE_LEN`] bytes on success and on
/// `BadMagic`/`UnsupportedVersion`.
pub(crate) fn read_preamble<R: Read>(
    reader: &mut R,
) -> Result<(Version, &'static dyn ArchiveCodec)> {
    let mut magic = [0u8; 8];
    read_exact_checked(reader, &mut magic, "magic")?;
    if &magic != MAGIC {
        return Err(Error::BadMagic {
            actual: magic.to_vec(),
        });
    }

    let mut pair = [0u8; 4];
    read_exact_checked(reader, &mut pair, "version")?;
    let version = Version::new(
        u16::from_le_bytes([pair[0], pair[1]]),
        u16::from_le_bytes([pair[2], pair[3]]),
    );

    let codec = version.codec()?;
    Ok((version, codec))
}
