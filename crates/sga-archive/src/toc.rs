//! Table of contents: sparse definitions straight off disk.
//!
//! The decoder works on the ToC region already read into memory. Every
//! offset in the pointer block is relative to the start of that region,
//! i.e. the absolute position is `toc_offset + offset`. Names are not
//! resolved here; the name buffer is handed to the tree assembler whole.

use std::ops::Range;

use sga_common::BinaryReader;
use tracing::debug;

use crate::codec::{ArchiveCodec, NameSize};
use crate::entry::{StorageType, VerificationType};
use crate::{Error, Result};

/// One entry of the ToC pointer block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Offset relative to the start of the ToC.
    pub offset: u32,
    /// Item count, or byte size for a byte-counted name buffer.
    pub count: u32,
}

impl Section {
    pub const fn new(offset: u32, count: u32) -> Self {
        Self { offset, count }
    }
}

/// The ToC pointer block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocPointers {
    pub drives: Section,
    pub folders: Section,
    pub files: Section,
    pub names: Section,
}

/// Raw drive record. Alias and name are inline NUL-padded ASCII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveDef {
    pub alias: [u8; 64],
    pub name: [u8; 64],
    /// Direct child folders, half-open into the flat folder table.
    pub folders: Range<u32>,
    /// Direct child files, half-open into the flat file table.
    pub files: Range<u32>,
    pub root_folder: u32,
}

/// Raw folder record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderDef {
    /// Offset into the name buffer.
    pub name_offset: u32,
    pub folders: Range<u32>,
    pub files: Range<u32>,
}

/// Raw file record, widened to the largest field sizes of any version.
///
/// Fields a version does not store are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDef {
    pub name_offset: u32,
    /// Offset of the stored bytes relative to the data region.
    pub data_offset: u64,
    pub stored_size: u64,
    pub decompressed_size: u64,
    pub storage_type: StorageType,
    pub modified: u32,
    pub verification_type: VerificationType,
    pub crc: u32,
    pub hash_offset: u32,
}

/// Every definition table of one archive plus its name buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseToc {
    pub drives: Vec<DriveDef>,
    pub folders: Vec<FolderDef>,
    pub files: Vec<FileDef>,
    pub names: Vec<u8>,
}

/// Decode the ToC region `toc` with `codec`.
pub(crate) fn decode(codec: &dyn ArchiveCodec, toc: &[u8]) -> Result<SparseToc> {
    let mut reader = BinaryReader::new(toc);
    if reader.remaining() < codec.toc_pointers_len() {
        return Err(Error::TruncatedData {
            what: "ToC pointer block",
            expected: codec.toc_pointers_len() as u64,
            actual: reader.remaining() as u64,
        });
    }
    let pointers = codec.decode_toc_pointers(&mut reader)?;

    let drives = decode_table(toc, pointers.drives, codec.drive_def_len(), "drive table", |r| {
        codec.decode_drive_def(r)
    })?;
    let folders = decode_table(
        toc,
        pointers.folders,
        codec.folder_def_len(),
        "folder table",
        |r| codec.decode_folder_def(r),
    )?;
    let files = decode_table(toc, pointers.files, codec.file_def_len(), "file table", |r| {
        codec.decode_file_def(r)
    })?;
    let names = name_buffer(toc, pointers.names, codec.name_size())?.to_vec();

    debug!(
        drives = drives.len(),
        folders = folders.len(),
        files = files.len(),
        name_bytes = names.len(),
        "decoded table of contents"
    );

    Ok(SparseToc {
        drives,
        folders,
        files,
        names,
    })
}

fn decode_table<T>(
    toc: &[u8],
    section: Section,
    record_len: usize,
    what: &'static str,
    mut decode_one: impl FnMut(&mut BinaryReader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let start = section.offset as usize;
    let count = section.count as usize;
    let needed = (count as u64) * (record_len as u64);
    let available = toc.len().saturating_sub(start) as u64;
    if needed > available {
        return Err(Error::TruncatedData {
            what,
            expected: needed,
            actual: available,
        });
    }

    let mut reader = BinaryReader::new_at(toc, start);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(decode_one(&mut reader)?);
    }
    Ok(out)
}

/// Locate the name buffer inside the ToC.
///
/// A byte-sized buffer is taken as declared. An item-counted buffer extends
/// through the NUL that terminates its last name.
fn name_buffer(toc: &[u8], section: Section, size: NameSize) -> Result<&[u8]> {
    let start = section.offset as usize;
    let tail = toc.get(start..).unwrap_or_default();

    match size {
        NameSize::Bytes => {
            let len = section.count as usize;
            tail.get(..len).ok_or(Error::TruncatedData {
                what: "name buffer",
                expected: len as u64,
                actual: tail.len() as u64,
            })
        }
        NameSize::Items => {
            if section.count == 0 {
                return Ok(&[]);
            }
            let wanted = section.count as usize;
            match sga_common::memchr::memchr_iter(0, tail).nth(wanted - 1) {
                Some(last_nul) => Ok(&tail[..=last_nul]),
                None => Err(Error::TruncatedData {
                    what: "name buffer entries",
                    expected: wanted as u64,
                    actual: sga_common::memchr::memchr_iter(0, tail).count() as u64,
                }),
            }
        }
    }
}

/// Slice a name out of the name buffer: from `offset` to the next NUL or
/// the end of the buffer.
pub(crate) fn resolve_name<'a>(names: &'a [u8], offset: u32, context: impl Fn() -> String) -> Result<&'a str> {
    let start = offset as usize;
    if start >= names.len() {
        return Err(Error::InvalidName {
            context: context(),
            reason: format!(
                "offset {offset} is past the end of the {}-byte name buffer",
                names.len()
            ),
        });
    }

    let tail = &names[start..];
    let end = sga_common::memchr::memchr(0, tail).unwrap_or(tail.len());
    std::str::from_utf8(&tail[..end]).map_err(|e| Error::InvalidName {
        context: context(),
        reason: e.to_string(),
    })
}
