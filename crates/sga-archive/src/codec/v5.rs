//! Version 5.0 (Dawn of War II).
//!
//! Adds an explicit ToC offset guarded by two reserved words, and a
//! timestamp plus verification tag on every file.

use sga_common::{text, BinaryReader};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::codec::{expect_reserved, fit, ArchiveCodec, NameSize, TocWidth};
use crate::entry::{StorageType, VerificationType};
use crate::header::{ArchiveHeader, HeaderExtra, Md5Checksums};
use crate::toc::FileDef;
use crate::version::Version;
use crate::Result;

/// Codec for version 5.0.
pub(crate) struct V5;

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct Header {
    file_md5: [u8; 16],
    name: [u8; 128],
    header_md5: [u8; 16],
    toc_size: u32,
    data_offset: u32,
    toc_offset: u32,
    reserved_1: u32,
    reserved_0: u32,
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
}

impl ArchiveCodec for V5 {
    fn version(&self) -> Version {
        Version::V5
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
            checksums: Some(Md5Checksums {
                file: raw.file_md5,
                header: raw.header_md5,
            }),
            extra: HeaderExtra::None,
        })
    }

    fn encode_header(&self, header: &ArchiveHeader, out: &mut Vec<u8>) -> Result<()> {
        let checksums = header.checksums.unwrap_or_default();
        let mut name = [0u8; 128];
        name.copy_from_slice(&text::encode_utf16_le(&header.name, 128)?);

        let raw = Header {
            file_md5: checksums.file,
            name,
            header_md5: checksums.header,
            toc_size: fit("toc_size", header.toc_size)?,
            data_offset: fit("data_offset", header.data_offset)?,
            toc_offset: fit("toc_offset", header.toc_offset)?,
            reserved_1: 1,
            reserved_0: 0,
        };
        out.extend_from_slice(raw.as_bytes());
        Ok(())
    }

    fn has_checksums(&self) -> bool {
        true
    }

    fn width(&self) -> TocWidth {
        TocWidth::Narrow
    }

    fn name_size(&self) -> NameSize {
        NameSize::Bytes
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
            crc: 0,
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
        };
        out.extend_from_slice(raw.as_bytes());
        Ok(())
    }
}
