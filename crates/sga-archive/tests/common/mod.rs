//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use sga_archive::{ArchiveBuilder, DriveEntry, FileEntry, FolderEntry, StorageType, Version};

pub const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat.";

/// One drive `data` holding `amet.txt` (file 0) and folder `lorem`
/// (folder 0) with `ipsum.txt`, `dolor.txt` and `sit.txt` (files 1..4),
/// one per storage type.
pub fn lorem(version: Version) -> ArchiveBuilder {
    ArchiveBuilder::new(version, "Lorem Ipsum").drive(
        DriveEntry::new("data", "Data")
            .folder(
                FolderEntry::new("lorem")
                    .file(FileEntry::new("ipsum.txt", LOREM))
                    .file(FileEntry::new("dolor.txt", LOREM).storage_type(StorageType::BufferCompress))
                    .file(FileEntry::new("sit.txt", LOREM.repeat(3)).storage_type(StorageType::StreamCompress)),
            )
            .file(FileEntry::new("amet.txt", "amet")),
    )
}

pub fn u16_at(bytes: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([bytes[pos], bytes[pos + 1]])
}

pub fn u32_at(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap())
}

pub fn put_u16(bytes: &mut [u8], pos: usize, value: u16) {
    bytes[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u32(bytes: &mut [u8], pos: usize, value: u32) {
    bytes[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

/// ToC layout of a v5 archive, as absolute offsets.
pub struct V5Layout {
    pub toc: usize,
    pub drives: usize,
    pub folders: usize,
    pub files: usize,
}

pub const V5_DATA_OFFSET_FIELD: usize = 176;
pub const V5_TOC_OFFSET_FIELD: usize = 180;
pub const V5_RESERVED_1_FIELD: usize = 184;
pub const V5_FILE_RECORD: usize = 22;
pub const NARROW_FOLDER_RECORD: usize = 12;

pub const V9_TOC_OFFSET_FIELD: usize = 140;
pub const V9_FILE_RECORD: usize = 34;

pub fn v5_layout(bytes: &[u8]) -> V5Layout {
    let toc = u32_at(bytes, V5_TOC_OFFSET_FIELD) as usize;
    V5Layout {
        toc,
        drives: toc + u32_at(bytes, toc) as usize,
        folders: toc + u32_at(bytes, toc + 6) as usize,
        files: toc + u32_at(bytes, toc + 12) as usize,
    }
}
