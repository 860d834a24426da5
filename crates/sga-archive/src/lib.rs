//! Reader and writer for Relic SGA (`_ARCHIVE`) game archives.
//!
//! Four on-disk layouts are supported: v2 (Dawn of War), v5 (Dawn of
//! War II), v7 (Company of Heroes 2) and v9 (Company of Heroes 3, Age of
//! Empires IV). Reading an archive:
//!
//! - checks the magic word and dispatches on the exact version pair,
//! - decodes the header and the table of contents,
//! - assembles a drive / folder / file tree, rejecting overlapping,
//!   inverted or out-of-bounds index ranges,
//! - and leaves file content on disk until it is asked for.
//!
//! v2 and v5 archives carry salted MD5 checksums that can be validated on
//! request. The [`ArchiveBuilder`] writes archives in any supported version.
//!
//! # Example
//!
//! ```no_run
//! use sga_archive::{Archive, ReadOptions};
//!
//! let archive = Archive::open_with("DataArt.sga", &ReadOptions::new().verify_checksums(true))?;
//! println!("{} ({})", archive.name(), archive.version());
//!
//! for (path, file) in archive.walk() {
//!     println!("{path}: {} bytes", file.decompressed_size());
//! }
//!
//! if let Some(file) = archive.find("data:art/ui/icon.tga") {
//!     let content = file.data(&archive)?;
//!     println!("{} bytes", content.len());
//! }
//! # Ok::<(), sga_archive::Error>(())
//! ```
//!
//! # Features
//!
//! - `parallel`: [`Archive::load_all_parallel`] inflates files on the rayon pool.

mod archive;
mod builder;
pub mod checksum;
mod codec;
pub mod decompress;
mod entry;
mod error;
mod header;
mod io;
mod store;
pub mod toc;
mod tree;
mod version;

pub use archive::{Archive, ReadOptions, Walk};
pub use builder::{ArchiveBuilder, DriveEntry, FileEntry, FolderEntry};
pub use checksum::{ChecksumKind, FILE_MD5_EIGEN, HEADER_MD5_EIGEN};
pub use entry::{Drive, File, Folder, Parent, StorageType, VerificationType};
pub use error::{Error, Result};
pub use header::{ArchiveHeader, HeaderExtra, Md5Checksums};
pub use version::{Version, MAGIC, PREAMBLE_LEN};
