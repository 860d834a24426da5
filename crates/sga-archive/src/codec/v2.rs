//! Version 2.0 (Dawn of War).
//!
//! Header carries both MD5 digests; the ToC starts right after the header.
//! Files record a 32-bit storage code and no timestamp.

use sga_common::{text, BinaryReader};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::codec::{fit, ArchiveCodec, NameSize, TocWidth};
use crate::entry::{StorageType, VerificationType};
use crate::header::{ArchiveHeader, HeaderExtra, Md5Checksums};
use crate::toc::FileDef;
use crate::version::Version;
use crate::Result;

/// Codec for version 2.0.
pub(crate) struct V2;

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct Header {
    file_md5: [u8; 16],
    name: [u8; 128],
    header_md5: [u8; 16],
    toc_size: u32,
    data_offset: u32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct FileRecord {
    name_offset: u32,
    storage_type: u32,
    data_offset: u32,
    stored_size: u32,
    decompressed_size: u32,
}

impl ArchiveCodec for V2 {
    fn version(&self) -> Version {
        Version::V2
    }

    fn header_len(&self) -> usize {
        std::mem::size_of::<Header>()
    }

    fn decode_header(&self, reader: &mut BinaryReader<'_>) -> Result<ArchiveHeader> {
        let raw: Header = reader.read_struct()?;
        let name_bytes = raw.name;
        Ok(ArchiveHeader {
            name: text::decode_utf16_le(&name_bytes)?,
            toc_offset: self.default_toc_offset(),
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
            storage_type: StorageType::from_code(raw.storage_type)?,
            modified: 0,
            verification_type: VerificationType::None,
            crc: 0,
            hash_offset: 0,
        })
    }

    fn encode_file_def(&self, def: &FileDef, out: &mut Vec<u8>) -> Result<()> {
        let raw = FileRecord {
            name_offset: def.name_offset,
            storage_type: def.storage_type.code(),
            data_offset: fit("file.data_offset", def.data_offset)?,
            stored_size: fit("file.stored_size", def.stored_size)?,
            decompressed_size: fit("file.decompressed_size", def.decompressed_size)?,
        };
        out.extend_from_slice(raw.as_bytes());
        Ok(())
    }
}
