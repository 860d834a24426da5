//! ToC pointer block, drive and folder records.
//!
//! v2/v5 store counts and ranges as u16 ("narrow"), v7/v9 as u32 ("wide").
//! The records are otherwise identical, so both families live here.

use sga_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::codec::fit;
use crate::toc::{DriveDef, FolderDef, Section, TocPointers};
use crate::Result;

/// Width of ToC counts and index ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TocWidth {
    Narrow,
    Wide,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct NarrowPointers {
    drive_offset: u32,
    drive_count: u16,
    folder_offset: u32,
    folder_count: u16,
    file_offset: u32,
    file_count: u16,
    name_offset: u32,
    name_count: u16,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct WidePointers {
    drive_offset: u32,
    drive_count: u32,
    folder_offset: u32,
    folder_count: u32,
    file_offset: u32,
    file_count: u32,
    name_offset: u32,
    name_count: u32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct NarrowDrive {
    alias: [u8; 64],
    name: [u8; 64],
    folder_start: u16,
    folder_end: u16,
    file_start: u16,
    file_end: u16,
    root_folder: u16,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct WideDrive {
    alias: [u8; 64],
    name: [u8; 64],
    folder_start: u32,
    folder_end: u32,
    file_start: u32,
    file_end: u32,
    root_folder: u32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct NarrowFolder {
    name_offset: u32,
    folder_start: u16,
    folder_end: u16,
    file_start: u16,
    file_end: u16,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct WideFolder {
    name_offset: u32,
    folder_start: u32,
    folder_end: u32,
    file_start: u32,
    file_end: u32,
}

impl TocWidth {
    pub(crate) fn pointers_len(self) -> usize {
        match self {
            Self::Narrow => std::mem::size_of::<NarrowPointers>(),
            Self::Wide => std::mem::size_of::<WidePointers>(),
        }
    }

    pub(crate) fn drive_len(self) -> usize {
        match self {
            Self::Narrow => std::mem::size_of::<NarrowDrive>(),
            Self::Wide => std::mem::size_of::<WideDrive>(),
        }
    }

    pub(crate) fn folder_len(self) -> usize {
        match self {
            Self::Narrow => std::mem::size_of::<NarrowFolder>(),
            Self::Wide => std::mem::size_of::<WideFolder>(),
        }
    }

    pub(crate) fn decode_pointers(self, reader: &mut BinaryReader<'_>) -> Result<TocPointers> {
        let pointers = match self {
            Self::Narrow => {
                let raw: NarrowPointers = reader.read_struct()?;
                TocPointers {
                    drives: Section::new(raw.drive_offset, u32::from(raw.drive_count)),
                    folders: Section::new(raw.folder_offset, u32::from(raw.folder_count)),
                    files: Section::new(raw.file_offset, u32::from(raw.file_count)),
                    names: Section::new(raw.name_offset, u32::from(raw.name_count)),
                }
            }
            Self::Wide => {
                let raw: WidePointers = reader.read_struct()?;
                TocPointers {
                    drives: Section::new(raw.drive_offset, raw.drive_count),
                    folders: Section::new(raw.folder_offset, raw.folder_count),
                    files: Section::new(raw.file_offset, raw.file_count),
                    names: Section::new(raw.name_offset, raw.name_count),
                }
            }
        };
        Ok(pointers)
    }

    pub(crate) fn encode_pointers(self, pointers: &TocPointers, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Narrow => {
                let raw = NarrowPointers {
                    drive_offset: pointers.drives.offset,
                    drive_count: fit("drive_count", pointers.drives.count.into())?,
                    folder_offset: pointers.folders.offset,
                    folder_count: fit("folder_count", pointers.folders.count.into())?,
                    file_offset: pointers.files.offset,
                    file_count: fit("file_count", pointers.files.count.into())?,
                    name_offset: pointers.names.offset,
                    name_count: fit("name_count", pointers.names.count.into())?,
                };
                out.extend_from_slice(raw.as_bytes());
            }
            Self::Wide => {
                let raw = WidePointers {
                    drive_offset: pointers.drives.offset,
                    drive_count: pointers.drives.count,
                    folder_offset: pointers.folders.offset,
                    folder_count: pointers.folders.count,
                    file_offset: pointers.files.offset,
                    file_count: pointers.files.count,
                    name_offset: pointers.names.offset,
                    name_count: pointers.names.count,
                };
                out.extend_from_slice(raw.as_bytes());
            }
        }
        Ok(())
    }

    pub(crate) fn decode_drive(self, reader: &mut BinaryReader<'_>) -> Result<DriveDef> {
        let def = match self {
            Self::Narrow => {
                let raw: NarrowDrive = reader.read_struct()?;
                DriveDef {
                    alias: raw.alias,
                    name: raw.name,
                    folders: u32::from(raw.folder_start)..u32::from(raw.folder_end),
                    files: u32::from(raw.file_start)..u32::from(raw.file_end),
                    root_folder: u32::from(raw.root_folder),
                }
            }
            Self::Wide => {
                let raw: WideDrive = reader.read_struct()?;
                DriveDef {
                    alias: raw.alias,
                    name: raw.name,
                    folders: raw.folder_start..raw.folder_end,
                    files: raw.file_start..raw.file_end,
                    root_folder: raw.root_folder,
                }
            }
        };
        Ok(def)
    }

    pub(crate) fn encode_drive(self, def: &DriveDef, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Narrow => {
                let raw = NarrowDrive {
                    alias: def.alias,
                    name: def.name,
                    folder_start: fit("drive.folder_start", def.folders.start.into())?,
                    folder_end: fit("drive.folder_end", def.folders.end.into())?,
                    file_start: fit("drive.file_start", def.files.start.into())?,
                    file_end: fit("drive.file_end", def.files.end.into())?,
                    root_folder: fit("drive.root_folder", def.root_folder.into())?,
                };
                out.extend_from_slice(raw.as_bytes());
            }
            Self::Wide => {
                let raw = WideDrive {
                    alias: def.alias,
                    name: def.name,
                    folder_start: def.folders.start,
                    folder_end: def.folders.end,
                    file_start: def.files.start,
                    file_end: def.files.end,
                    root_folder: def.root_folder,
                };
                out.extend_from_slice(raw.as_bytes());
            }
        }
        Ok(())
    }

    pub(crate) fn decode_folder(self, reader: &mut BinaryReader<'_>) -> Result<FolderDef> {
        let def = match self {
            Self::Narrow => {
                let raw: NarrowFolder = reader.read_struct()?;
                FolderDef {
                    name_offset: raw.name_offset,
                    folders: u32::from(raw.folder_start)..u32::from(raw.folder_end),
                    files: u32::from(raw.file_start)..u32::from(raw.file_end),
                }
            }
            Self::Wide => {
                let raw: WideFolder = reader.read_struct()?;
                FolderDef {
                    name_offset: raw.name_offset,
                    folders: raw.folder_start..raw.folder_end,
                    files: raw.file_start..raw.file_end,
                }
            }
        };
        Ok(def)
    }

    pub(crate) fn encode_folder(self, def: &FolderDef, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Narrow => {
                let raw = NarrowFolder {
                    name_offset: def.name_offset,
                    folder_start: fit("folder.folder_start", def.folders.start.into())?,
                    folder_end: fit("folder.folder_end", def.folders.end.into())?,
                    file_start: fit("folder.file_start", def.files.start.into())?,
                    file_end: fit("folder.file_end", def.files.end.into())?,
                };
                out.extend_from_slice(raw.as_bytes());
            }
            Self::Wide => {
                let raw = WideFolder {
                    name_offset: def.name_offset,
                    folder_start: def.folders.start,
                    folder_end: def.folders.end,
                    file_start: def.files.start,
                    file_end: def.files.end,
                };
                out.extend_from_slice(raw.as_bytes());
            }
        }
        Ok(())
    }
}
