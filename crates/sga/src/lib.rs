//! SGA - Relic game archive library.
//!
//! This crate provides a unified interface to the SGA crates.
//!
//! # Crates
//!
//! - [`sga_common`] - Binary reading and fixed-width text fields
//! - [`sga_archive`] - Versioned `_ARCHIVE` reading, validation and writing
//!
//! # Example
//!
//! ```no_run
//! use sga::prelude::*;
//!
//! let archive = Archive::open("DataArt.sga")?;
//!
//! if let Some(file) = archive.find("data:art/ui/icon.tga") {
//!     let content = file.data(&archive)?;
//!     println!("{}: {} bytes", archive.path_of(file).unwrap_or_default(), content.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use sga_archive as archive;
pub use sga_common as common;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sga_archive::{
        Archive, ArchiveBuilder, ArchiveHeader, DriveEntry, Drive, File, FileEntry, Folder,
        FolderEntry, ReadOptions, StorageType, VerificationType, Version,
    };
    pub use sga_common::BinaryReader;
}

pub use sga_archive::{Error, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
