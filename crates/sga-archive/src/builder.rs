//! Archive builder for creating SGA files.
//!
//! The builder holds an owned tree of drives, folders and files and lays it
//! out in the on-disk format of any supported version.
//!
//! # Example
//!
//! ```
//! use sga_archive::{Archive, ArchiveBuilder, DriveEntry, FileEntry, FolderEntry, StorageType, Version};
//!
//! let bytes = ArchiveBuilder::new(Version::V5, "Mod")
//!     .drive(
//!         DriveEntry::new("data", "Data")
//!             .folder(FolderEntry::new("art").file(FileEntry::new("a.txt", "hello")))
//!             .file(FileEntry::new("readme.txt", "packed").storage_type(StorageType::BufferCompress)),
//!     )
//!     .build()?;
//!
//! let archive = Archive::read(std::io::Cursor::new(bytes))?;
//! let file = archive.find("data:art/a.txt").unwrap();
//! assert_eq!(&file.data(&archive)?[..], b"hello");
//! # Ok::<(), sga_archive::Error>(())
//! ```

use std::collections::VecDeque;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use sga_common::text;
use tracing::debug;

use crate::archive::Archive;
use crate::checksum;
use crate::codec::{ArchiveCodec, NameSize};
use crate::decompress;
use crate::entry::{File, Folder, StorageType, VerificationType};
use crate::header::{ArchiveHeader, HeaderExtra, Md5Checksums};
use crate::toc::{DriveDef, FileDef, FolderDef, Section, TocPointers};
use crate::version::{Version, MAGIC, PREAMBLE_LEN};
use crate::{Error, Result};

/// A file to be written, holding its decompressed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub content: Bytes,
    pub storage_type: StorageType,
    /// Seconds since the Unix epoch. Not stored by v2.
    pub modified: u32,
    /// Not stored by v2.
    pub verification_type: VerificationType,
    /// Stored by v7 and v9.
    pub crc: u32,
    /// Stored by v9.
    pub hash_offset: u32,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            storage_type: StorageType::Store,
            modified: 0,
            verification_type: VerificationType::None,
            crc: 0,
            hash_offset: 0,
        }
    }

    pub fn storage_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = storage_type;
        self
    }

    pub fn modified(mut self, modified: u32) -> Self {
        self.modified = modified;
        self
    }

    pub fn verification_type(mut self, verification_type: VerificationType) -> Self {
        self.verification_type = verification_type;
        self
    }

    pub fn crc(mut self, crc: u32) -> Self {
        self.crc = crc;
        self
    }

    pub fn hash_offset(mut self, hash_offset: u32) -> Self {
        self.hash_offset = hash_offset;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

impl FolderEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folders: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn folder(mut self, folder: FolderEntry) -> Self {
        self.folders.push(folder);
        self
    }

    pub fn file(mut self, file: FileEntry) -> Self {
        self.files.push(file);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEntry {
    /// ASCII, at most 64 bytes.
    pub alias: String,
    /// ASCII, at most 64 bytes.
    pub name: String,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

impl DriveEntry {
    pub fn new(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            name: name.into(),
            folders: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn folder(mut self, folder: FolderEntry) -> Self {
        self.folders.push(folder);
        self
    }

    pub fn file(mut self, file: FileEntry) -> Self {
        self.files.push(file);
        self
    }
}

/// Builder for SGA archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBuilder {
    pub version: Version,
    /// Archive display name, at most 64 UTF-16 code units.
    pub name: String,
    pub drives: Vec<DriveEntry>,
    pub extra: HeaderExtra,
}

/// Definitions and blobs accumulated while laying out the tree.
#[derive(Default)]
struct Layout {
    drives: Vec<DriveDef>,
    folders: Vec<FolderDef>,
    files: Vec<FileDef>,
    names: Vec<u8>,
    name_count: u32,
    data: Vec<u8>,
}

impl Layout {
    fn push_name(&mut self, name: &str) -> Result<u32> {
        if name.as_bytes().contains(&0) {
            return Err(Error::InvalidName {
                context: format!("{name:?}"),
                reason: "names may not contain NUL".into(),
            });
        }
        let offset = index_u32("name_offset", self.names.len())?;
        self.names.extend_from_slice(name.as_bytes());
        self.names.push(0);
        self.name_count += 1;
        Ok(offset)
    }

    /// Reserve a contiguous block of folder slots.
    fn reserve_folders(&mut self, count: usize) -> Result<std::ops::Range<u32>> {
        let start = index_u32("folder_start", self.folders.len())?;
        self.folders.extend((0..count).map(|_| FolderDef {
            name_offset: 0,
            folders: 0..0,
            files: 0..0,
        }));
        Ok(start..index_u32("folder_end", self.folders.len())?)
    }

    fn push_files(&mut self, files: &[FileEntry]) -> Result<std::ops::Range<u32>> {
        let start = index_u32("file_start", self.files.len())?;
        for file in files {
            let stored = if file.storage_type.is_compressed() {
                decompress::deflate(&file.content)?
            } else {
                file.content.to_vec()
            };
            let def = FileDef {
                name_offset: self.push_name(&file.name)?,
                data_offset: self.data.len() as u64,
                stored_size: stored.len() as u64,
                decompressed_size: file.content.len() as u64,
                storage_type: file.storage_type,
                modified: file.modified,
                verification_type: file.verification_type,
                crc: file.crc,
                hash_offset: file.hash_offset,
            };
            self.data.extend_from_slice(&stored);
            self.files.push(def);
        }
        Ok(start..index_u32("file_end", self.files.len())?)
    }
}

fn index_u32(field: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::FieldOverflow {
        field,
        value: value as u64,
    })
}

impl ArchiveBuilder {
    pub fn new(version: Version, name: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            drives: Vec::new(),
            extra: HeaderExtra::default_for(version),
        }
    }

    pub fn drive(mut self, drive: DriveEntry) -> Self {
        self.drives.push(drive);
        self
    }

    /// Set the uninterpreted header fields (v7 `unk_a`, v9 digest block).
    pub fn extra(mut self, extra: HeaderExtra) -> Self {
        self.extra = extra;
        self
    }

    /// Capture a parsed archive, reading and decompressing every file.
    pub fn from_archive<R: Read + Seek>(archive: &Archive<R>) -> Result<Self> {
        let mut drives = Vec::with_capacity(archive.drives().len());
        for drive in archive.drives() {
            drives.push(DriveEntry {
                alias: drive.alias().to_string(),
                name: drive.name().to_string(),
                folders: folder_entries(archive, drive.folders())?,
                files: file_entries(archive, drive.files())?,
            });
        }
        Ok(Self {
            version: archive.version(),
            name: archive.name().to_string(),
            drives,
            extra: archive.header().extra.clone(),
        })
    }

    /// Build the archive and write it to a file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = self.build()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Build the archive and return the raw bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let codec = self.version.codec()?;
        let layout = self.lay_out()?;

        let toc = encode_toc(codec, &layout)?;
        let toc_offset = codec.default_toc_offset();
        let toc_size = toc.len() as u64;
        let data_offset = toc_offset + toc_size;

        let mut header = ArchiveHeader {
            name: self.name.clone(),
            toc_offset,
            toc_size,
            data_offset,
            data_size: (self.version == Version::V9).then_some(layout.data.len() as u64),
            checksums: codec.has_checksums().then(Md5Checksums::default),
            extra: self.extra.clone(),
        };

        let mut out = Vec::with_capacity(data_offset as usize + layout.data.len());
        out.extend_from_slice(MAGIC);
        out.write_u16::<LittleEndian>(self.version.major)?;
        out.write_u16::<LittleEndian>(self.version.minor)?;
        codec.encode_header(&header, &mut out)?;
        out.extend_from_slice(&toc);
        out.extend_from_slice(&layout.data);

        if codec.has_checksums() {
            header.checksums = Some(checksum::compute_at(&mut Cursor::new(&out), 0, &header)?);
            let mut encoded = Vec::with_capacity(codec.header_len());
            codec.encode_header(&header, &mut encoded)?;
            let start = PREAMBLE_LEN as usize;
            out[start..start + encoded.len()].copy_from_slice(&encoded);
        }

        debug!(
            version = %self.version,
            drives = layout.drives.len(),
            folders = layout.folders.len(),
            files = layout.files.len(),
            bytes = out.len(),
            "built archive"
        );
        Ok(out)
    }

    /// Flatten the tree. Every node's child folders occupy one contiguous
    /// block, allocated breadth-first.
    fn lay_out(&self) -> Result<Layout> {
        let mut layout = Layout::default();
        let mut queue: VecDeque<(usize, &FolderEntry)> = VecDeque::new();

        for drive in &self.drives {
            let folders = layout.reserve_folders(drive.folders.len())?;
            for (slot, folder) in (folders.start as usize..).zip(&drive.folders) {
                queue.push_back((slot, folder));
            }
            let files = layout.push_files(&drive.files)?;

            let mut alias = [0u8; 64];
            alias.copy_from_slice(&text::encode_ascii(&drive.alias, 64)?);
            let mut name = [0u8; 64];
            name.copy_from_slice(&text::encode_ascii(&drive.name, 64)?);
            layout.drives.push(DriveDef {
                alias,
                name,
                root_folder: folders.start,
                folders,
                files,
            });
        }

        while let Some((slot, folder)) = queue.pop_front() {
            let name_offset = layout.push_name(&folder.name)?;
            let folders = layout.reserve_folders(folder.folders.len())?;
            for (child, sub) in (folders.start as usize..).zip(&folder.folders) {
                queue.push_back((child, sub));
            }
            let files = layout.push_files(&folder.files)?;
            layout.folders[slot] = FolderDef {
                name_offset,
                folders,
                files,
            };
        }

        Ok(layout)
    }
}

fn encode_toc(codec: &dyn ArchiveCodec, layout: &Layout) -> Result<Vec<u8>> {
    let drives_at = codec.toc_pointers_len();
    let folders_at = drives_at + layout.drives.len() * codec.drive_def_len();
    let files_at = folders_at + layout.folders.len() * codec.folder_def_len();
    let names_at = files_at + layout.files.len() * codec.file_def_len();

    let names_count = match codec.name_size() {
        NameSize::Bytes => index_u32("name_count", layout.names.len())?,
        NameSize::Items => layout.name_count,
    };
    let pointers = TocPointers {
        drives: Section::new(index_u32("drive_offset", drives_at)?, index_u32("drive_count", layout.drives.len())?),
        folders: Section::new(index_u32("folder_offset", folders_at)?, index_u32("folder_count", layout.folders.len())?),
        files: Section::new(index_u32("file_offset", files_at)?, index_u32("file_count", layout.files.len())?),
        names: Section::new(index_u32("name_offset", names_at)?, names_count),
    };

    let mut toc = Vec::with_capacity(names_at + layout.names.len());
    codec.encode_toc_pointers(&pointers, &mut toc)?;
    for def in &layout.drives {
        codec.encode_drive_def(def, &mut toc)?;
    }
    for def in &layout.folders {
        codec.encode_folder_def(def, &mut toc)?;
    }
    for def in &layout.files {
        codec.encode_file_def(def, &mut toc)?;
    }
    toc.extend_from_slice(&layout.names);
    Ok(toc)
}

fn folder_entries<R: Read + Seek>(archive: &Archive<R>, folders: &[Folder]) -> Result<Vec<FolderEntry>> {
    folders
        .iter()
        .map(|folder| {
            Ok(FolderEntry {
                name: folder.name().to_string(),
                folders: folder_entries(archive, folder.folders())?,
                files: file_entries(archive, folder.files())?,
            })
        })
        .collect()
}

fn file_entries<R: Read + Seek>(archive: &Archive<R>, files: &[File]) -> Result<Vec<FileEntry>> {
    files
        .iter()
        .map(|file| {
            Ok(FileEntry {
                name: file.name().to_string(),
                content: file.data(archive)?,
                storage_type: file.storage_type(),
                modified: file.modified_raw(),
                verification_type: file.verification_type(),
                crc: file.crc(),
                hash_offset: file.hash_offset(),
            })
        })
        .collect()
}
