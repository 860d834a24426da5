//! Per-version archive codecs.
//!
//! Each supported version gets one unit struct implementing [`ArchiveCodec`].
//! The codec owns every layout quirk of its version: header fields and
//! reserved sentinels, the width of ToC counts and ranges, and the file
//! record shape. Everything above this module works on the version-neutral
//! definitions in [`crate::toc`].

mod table;
mod v2;
mod v5;
mod v7;
mod v9;

pub(crate) use table::TocWidth;
pub(crate) use v2::V2;
pub(crate) use v5::V5;
pub(crate) use v7::V7;
pub(crate) use v9::V9;

use sga_common::BinaryReader;

use crate::header::ArchiveHeader;
use crate::toc::{DriveDef, FileDef, FolderDef, TocPointers};
use crate::version::{Version, PREAMBLE_LEN};
use crate::{Error, Result};

/// How the names entry of the ToC pointer block is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameSize {
    /// Byte length of the name buffer.
    Bytes,
    /// Number of NUL-terminated names in the buffer.
    Items,
}

/// Decoder and encoder for one on-disk version.
pub(crate) trait ArchiveCodec: Send + Sync {
    fn version(&self) -> Version;

    /// Length of the version header that follows the preamble.
    fn header_len(&self) -> usize;

    fn decode_header(&self, reader: &mut BinaryReader<'_>) -> Result<ArchiveHeader>;

    fn encode_header(&self, header: &ArchiveHeader, out: &mut Vec<u8>) -> Result<()>;

    /// Whether the header carries MD5 checksums.
    fn has_checksums(&self) -> bool {
        false
    }

    fn width(&self) -> TocWidth;

    fn name_size(&self) -> NameSize;

    fn file_def_len(&self) -> usize;

    fn decode_file_def(&self, reader: &mut BinaryReader<'_>) -> Result<FileDef>;

    fn encode_file_def(&self, def: &FileDef, out: &mut Vec<u8>) -> Result<()>;

    /// Where the ToC starts when it directly follows the header.
    fn default_toc_offset(&self) -> u64 {
        PREAMBLE_LEN + self.header_len() as u64
    }

    fn toc_pointers_len(&self) -> usize {
        self.width().pointers_len()
    }

    fn decode_toc_pointers(&self, reader: &mut BinaryReader<'_>) -> Result<TocPointers> {
        self.width().decode_pointers(reader)
    }

    fn encode_toc_pointers(&self, pointers: &TocPointers, out: &mut Vec<u8>) -> Result<()> {
        self.width().encode_pointers(pointers, out)
    }

    fn drive_def_len(&self) -> usize {
        self.width().drive_len()
    }

    fn decode_drive_def(&self, reader: &mut BinaryReader<'_>) -> Result<DriveDef> {
        self.width().decode_drive(reader)
    }

    fn encode_drive_def(&self, def: &DriveDef, out: &mut Vec<u8>) -> Result<()> {
        self.width().encode_drive(def, out)
    }

    fn folder_def_len(&self) -> usize {
        self.width().folder_len()
    }

    fn decode_folder_def(&self, reader: &mut BinaryReader<'_>) -> Result<FolderDef> {
        self.width().decode_folder(reader)
    }

    fn encode_folder_def(&self, def: &FolderDef, out: &mut Vec<u8>) -> Result<()> {
        self.width().encode_folder(def, out)
    }
}

/// Check a reserved header field against its fixed sentinel.
pub(crate) fn expect_reserved(field: &'static str, expected: u32, actual: u32) -> Result<()> {
    if actual != expected {
        return Err(Error::ReservedField {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Narrow a value to the on-disk width of `field`.
pub(crate) fn fit<T: TryFrom<u64>>(field: &'static str, value: u64) -> Result<T> {
    T::try_from(value).map_err(|_| Error::FieldOverflow { field, value })
}
