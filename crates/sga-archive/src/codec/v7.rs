//! Version 7.0 (Company of Heroes 2).
//!
//! Drops the MD5 digests, widens ToC counts and ranges to 32 bits, counts
//! names instead of bytes, and adds a CRC field to file records.

use sga_common::{text, BinaryReader};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::codec::{expect_reserved, fit, ArchiveCodec, NameSize, TocWidth};
use crate::entry::{StorageType, VerificationType};
use crate::header::{ArchiveHeader, HeaderExtra};
use crate::toc::FileDef;
use crate::version::Version;
use crate::Result;

/// Codec for version 7.0.
pub(crate) struct V7;

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct Header {
    name: [u8; 128],
    toc_size: u32,
    data_offset: u32,
    toc_offset: u32,
    reserved_1: u32,
    reserved_0: u32,
    unk_a: u32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct FileRecord {
    name_offset: u32,
    data_offset: u32,
    stored_size: u32,
    decompressed_size: u32,
    modified: u32,
    verification_type: u8,
    storage_type: u8,
    crc: u32,
}

impl ArchiveCodec for V7 {
    fn version(&self) -> Version {
        Version::V7
    }

    fn header_len(&self) -> usize {
        std::mem::size_of::<Header>()
    }

    fn decode_header(&self, reader: &mut BinaryReader<'_>) -> Result<ArchiveHeader> {
        let raw: Header = reader.read_struct()?;
        expect_reserved("reserved_1", 1, raw.reserved_1)?;
        expect_reserved("reserved_0", 0, raw.reserved_0)?;

        let name_bytes = raw.name;
        Ok(ArchiveHeader {
            name: text::decode_utf16_le(&name_bytes)?,
            toc_offset: u64::from(raw.toc_offset),
            toc_size: u64::from(raw.toc_size),
            data_offset: u64::from(raw.data_offset),
            data_size: None,
            checksums: None,
            extra: HeaderExtra::V7 { unk_a: raw.unk_a },
        })
    }

    fn encode_header(&self, header: &ArchiveHeader, out: &mut Vec<u8>) -> Result<()> {
        let unk_a = match header.extra {
            HeaderExtra::V7 { unk_a } => unk_a,
            _ => 0,
        };
        let mut name = [0u8; 128];
        name.copy_from_slice(&text::encode_utf16_le(&header.name, 128)?);

        let raw = Header {
            name,
            toc_size: fit("toc_size", header.toc_size)?,
            data_offset: fit("data_offset", header.data_offset)?,
            toc_offset: fit("toc_offset", header.toc_offset)?,
            reserved_1: 1,
            reserved_0: 0,
            unk_a,
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
            data_offset: u64::from(raw.data_offset),
            stored_size: u64::from(raw.stored_size),
            decompressed_size: u64::from(raw.decompressed_size),
            storage_type: StorageType::from_code(u32::from(raw.storage_type))?,
            modified: raw.modified,
            verification_type: VerificationType::from_code(raw.verification_type)?,
            crc: raw.crc,
            hash_offset: 0,
        })
    }

    fn encode_file_def(&self, def: &FileDef, out: &mut Vec<u8>) -> Result<()> {
        let raw = FileRecord {
            name_offset: def.name_offset,
            data_offset: fit("file.data_offset", def.data_offset)?,
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
