//! Assembled archive tree: drives, folders and files.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::store::Payload;
use crate::{Error, Result};

/// Per-file compression mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StorageType {
    /// Stored verbatim.
    Store = 0,
    /// zlib, compressed as one buffer.
    BufferCompress = 16,
    /// zlib, compressed as a stream.
    StreamCompress = 32,
}

impl StorageType {
    /// Map an on-disk code to a storage type.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::Store),
            16 => Ok(Self::BufferCompress),
            32 => Ok(Self::StreamCompress),
            other => Err(Error::InvalidStorageType(other)),
        }
    }

    /// The on-disk code.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Whether the stored bytes are zlib data.
    #[inline]
    pub fn is_compressed(self) -> bool {
        !matches!(self, Self::Store)
    }
}

/// Per-file verification tag (v5 and later). Preserved, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum VerificationType {
    #[default]
    None = 0,
    Crc = 1,
    CrcBlocks = 2,
    Md5Blocks = 3,
    Sha1Blocks = 4,
}

impl VerificationType {
    /// Map an on-disk code to a verification type.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Crc),
            2 => Ok(Self::CrcBlocks),
            3 => Ok(Self::Md5Blocks),
            4 => Ok(Self::Sha1Blocks),
            other => Err(Error::InvalidVerificationType(other)),
        }
    }

    /// The on-disk code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Non-owning link from a node to the node that owns it.
///
/// `Drive` holds an index into [`Archive::drives`](crate::Archive::drives),
/// `Folder` holds the flat on-disk folder index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Drive(usize),
    Folder(usize),
}

/// A top-level named root of the archive's virtual filesystem.
#[derive(Debug)]
pub struct Drive {
    pub(crate) alias: String,
    pub(crate) name: String,
    pub(crate) root_folder: u32,
    pub(crate) folders: Vec<Folder>,
    pub(crate) files: Vec<File>,
}

impl Drive {
    /// Short alias used as the path prefix (e.g. `data`).
    #[inline]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Display name of the drive.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw root-folder index as stored on disk.
    #[inline]
    pub fn root_folder(&self) -> u32 {
        self.root_folder
    }

    /// Direct child folders, in on-disk order.
    #[inline]
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Direct child files, in on-disk order.
    #[inline]
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Mutable access to the direct child files.
    #[inline]
    pub fn files_mut(&mut self) -> &mut [File] {
        &mut self.files
    }

    /// Mutable access to the direct child folders.
    #[inline]
    pub fn folders_mut(&mut self) -> &mut [Folder] {
        &mut self.folders
    }
}

/// A folder inside a drive.
#[derive(Debug)]
pub struct Folder {
    pub(crate) name: String,
    pub(crate) index: usize,
    pub(crate) parent: Parent,
    pub(crate) folders: Vec<Folder>,
    pub(crate) files: Vec<File>,
}

impl Folder {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flat on-disk folder index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn parent(&self) -> Parent {
        self.parent
    }

    #[inline]
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    #[inline]
    pub fn files(&self) -> &[File] {
        &self.files
    }

    #[inline]
    pub fn files_mut(&mut self) -> &mut [File] {
        &mut self.files
    }

    #[inline]
    pub fn folders_mut(&mut self) -> &mut [Folder] {
        &mut self.folders
    }
}

impl Drop for Folder {
    // Folder chains can be arbitrarily deep; unlink them iteratively.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.folders);
        while let Some(mut folder) = pending.pop() {
            pending.append(&mut folder.folders);
        }
    }
}

/// A file inside a drive or folder.
///
/// This holds metadata and, once materialized, the cached bytes. Use
/// [`File::open`] or [`File::data`] with the owning archive to read it.
#[derive(Debug)]
pub struct File {
    pub(crate) name: String,
    pub(crate) index: usize,
    pub(crate) parent: Parent,
    pub(crate) storage_type: StorageType,
    pub(crate) data_offset: u64,
    pub(crate) stored_size: u64,
    pub(crate) decompressed_size: u64,
    pub(crate) modified: u32,
    pub(crate) verification_type: VerificationType,
    pub(crate) crc: u32,
    pub(crate) hash_offset: u32,
    pub(crate) cache: Mutex<Option<Payload>>,
}

impl File {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flat on-disk file index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn parent(&self) -> Parent {
        self.parent
    }

    #[inline]
    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    /// Offset of the stored bytes, relative to the data region.
    #[inline]
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Length of the bytes as stored in the archive.
    #[inline]
    pub fn stored_size(&self) -> u64 {
        self.stored_size
    }

    /// Declared length of the content after decompression.
    #[inline]
    pub fn decompressed_size(&self) -> u64 {
        self.decompressed_size
    }

    /// Raw modification timestamp (seconds since the Unix epoch, 0 on v2).
    #[inline]
    pub fn modified_raw(&self) -> u32 {
        self.modified
    }

    /// Modification time, or `None` when the archive does not record one.
    pub fn modified(&self) -> Option<SystemTime> {
        if self.modified == 0 {
            return None;
        }
        UNIX_EPOCH.checked_add(Duration::from_secs(u64::from(self.modified)))
    }

    #[inline]
    pub fn verification_type(&self) -> VerificationType {
        self.verification_type
    }

    /// Raw CRC field (v7 and later).
    #[inline]
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Raw hash offset field (v9).
    #[inline]
    pub fn hash_offset(&self) -> u32 {
        self.hash_offset
    }

    /// Get the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}
