//! Version 9.0 (Company of Heroes 3, Age of Empires IV).
//!
//! 64-bit region offsets, an explicit data-region size, a 256-byte digest
//! block that is preserved but not interpreted, and a hash offset per file.

use sga_common::{text, BinaryReader};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::codec::{expect_reserved, fit, ArchiveCodec, NameSize, TocWidth};
use crate::entry::{StorageType, VerificationType};
use crate::header::{ArchiveHeader, HeaderExtra};
use crate::toc::FileDef;
use crate::version::Version;
use crate::Result;

/// Codec for version 9.0.
pub(crate) struct V9;

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct Header {
    name: [u8; 128],
    toc_offset: u64,
    toc_size: u32,
    data_offset: u64,
    data_size: u64,
    reserved_1: u32,
    sha256: [u8; 256],
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct FileRecord {
    name_offset: u32,
    hash_offset: u32,
    data_offset: u64,
    stored_size: u32,
    decompressed_size: u32,
    modified: u32,
    verification_type: u8,
    storage_type: u8,
    crc: u32,
}

impl ArchiveCodec for V9 {
    fn version(&self) -> Version {
        Version::V9
    }

    fn header_len(&self) -> usize {
        std::mem::size_of::<Header>()
    }

    fn decode_header(&self, reader: &mut BinaryReader<'_>) -> Result<ArchiveHeader> {
        let raw: Header = reader.read_struct()?;
        expect_reserved("reserved_1", 1, raw.reserved_1)?;

        let name_bytes = raw.name;
        Ok(ArchiveHeader {
            name: text::decode_utf16_le(&name_bytes)?,
            toc_offset: raw.toc_offset,
            toc_size: u64::from(raw.toc_size),
            data_offset: raw.data_offset,
            data_size: Some(raw.data_size),
            checksums: None,
            extra: HeaderExtra::V9 {
                sha256: Box::new(raw.sha256),
            },
        })
    }

    fn encode_header(&self, header: &ArchiveHeader, out: &mut Vec<u8>) -> Result<()> {
        let sha256 = match &header.extra {
            HeaderExtra::V9 { sha256 } => **sha256,
            _ => [0u8; 256],
        };
        let mut name = [0u8; 128];
        name.copy_from_slice(&text::encode_utf16_le(&header.name, 128)?);

        let raw = Header {
            name,
            toc_offset: header.toc_offset,
            toc_size: fit("toc_size", header.toc_size)?,
            data_offset: header.data_offset,
            data_size: header.data_size.unwrap_or_default(),
            reserved_1: 1,
            sha256,
        };
        out.extend_from_slice(raw.as_bytes());
        Ok(())
    }

    fn width(&self) -> TocWidth {
        TocWidth::Wide
    }

    fn name_size(&self) -> NameSize {
        NameSize::Items
    }

    fn file_def_len(&self) -> usize {
        std::mem::size_of::<FileRecord>()
    }

    fn decode_file_def(&self, reader: &mut BinaryReader<'_>) -> Result<FileDef> {
        let raw: FileRecord = reader.read_struct()?;
        Ok(FileDef {
            name_offset: raw.name_offset,
            data_offset: raw.data_offset,
            stored_size: u64::from(raw.stored_size),
            decompressed_size: u64::from(raw.decompressed_size),
            storage_type: StorageType::from_code(u32::from(raw.storage_type))?,
            modified: raw.modified,
            verification_type: VerificationType::from_code(raw.verification_type)?,
            crc: raw.crc,
            hash_offset: raw.hash_offset,
        })
    }

    fn encode_file_def(&self, def: &FileDef, out: &mut Vec<u8>) -> Result<()> {
        let raw = FileRecord {
            name_offset: def.name_offset,
            hash_offset: def.hash_offset,
            data_offset: def.data_offset,
            stored_size: fit("file.stored_size", def.stored_size)?,
            decompressed_size: fit("file.decompressed_size", def.decompressed_size)?,
            modified: def.modified,
            verification_type: def.verification_type.code(),
            storage_type: fit("file.storage_type", u64::from(def.storage_type.code()))?,
            crc: def.crc,
        };
        out.extend_from_slice(raw.as_bytes());
        Ok(())
    }
}
