//! Tree assembly: turns the flat definition tables into owned drives.
//!
//! Every range on a drive or folder names its direct children, and every
//! flat index may be claimed by exactly one parent. Assembly runs in two
//! iterative passes so hostile nesting depth cannot exhaust the stack:
//! a breadth-first claim pass that validates every range, then a build pass
//! over the claimed folders in reverse claim order, which guarantees that a
//! folder's children exist before the folder itself is built.

use std::collections::VecDeque;
use std::ops::Range;

use parking_lot::Mutex;
use sga_common::text;
use tracing::{debug, warn};

use crate::entry::{Drive, File, Folder, Parent};
use crate::toc::{resolve_name, FileDef, SparseToc};
use crate::{Error, Result};

/// Name and parent of one folder, indexed by flat folder index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FolderLink {
    pub(crate) name: String,
    pub(crate) parent: Parent,
}

/// The assembled tree plus the flat folder link table.
pub(crate) struct Assembled {
    pub(crate) drives: Vec<Drive>,
    pub(crate) folder_links: Vec<Option<FolderLink>>,
    pub(crate) file_count: usize,
}

pub(crate) fn assemble(toc: &SparseToc) -> Result<Assembled> {
    let folder_count = toc.folders.len();
    let file_count = toc.files.len();

    let mut folder_owner: Vec<Option<Parent>> = vec![None; folder_count];
    let mut file_owner: Vec<Option<Parent>> = vec![None; file_count];
    let mut claim_order = Vec::with_capacity(folder_count);
    let mut queue = VecDeque::new();

    for (i, drive) in toc.drives.iter().enumerate() {
        let owner = Parent::Drive(i);
        for j in checked(&drive.folders, folder_count, || format!("drive {i} folder range"))? {
            claim(&mut folder_owner, j, owner, "folder")?;
            claim_order.push(j);
            queue.push_back(j);
        }
        for k in checked(&drive.files, file_count, || format!("drive {i} file range"))? {
            claim(&mut file_owner, k, owner, "file")?;
        }
    }

    while let Some(j) = queue.pop_front() {
        let def = &toc.folders[j];
        let owner = Parent::Folder(j);
        for child in checked(&def.folders, folder_count, || format!("folder {j} folder range"))? {
            claim(&mut folder_owner, child, owner, "folder")?;
            claim_order.push(child);
            queue.push_back(child);
        }
        for k in checked(&def.files, file_count, || format!("folder {j} file range"))? {
            claim(&mut file_owner, k, owner, "file")?;
        }
    }

    let mut file_slots: Vec<Option<File>> = Vec::with_capacity(file_count);
    let mut assembled_files = 0;
    for (k, def) in toc.files.iter().enumerate() {
        match file_owner[k] {
            Some(parent) => {
                file_slots.push(Some(build_file(&toc.names, k, def, parent)?));
                assembled_files += 1;
            }
            None => {
                warn!(index = k, "file is not owned by any drive or folder, dropping it");
                file_slots.push(None);
            }
        }
    }

    let mut folder_links: Vec<Option<FolderLink>> = vec![None; folder_count];
    for (j, owner) in folder_owner.iter().enumerate() {
        match owner {
            Some(parent) => {
                let def = &toc.folders[j];
                let name = resolve_name(&toc.names, def.name_offset, || format!("folder {j}"))?;
                folder_links[j] = Some(FolderLink {
                    name: name.to_string(),
                    parent: *parent,
                });
            }
            None => warn!(index = j, "folder is not owned by any drive or folder, dropping it"),
        }
    }

    let mut folder_slots: Vec<Option<Folder>> = (0..folder_count).map(|_| None).collect();
    for &j in claim_order.iter().rev() {
        let def = &toc.folders[j];
        let Some(link) = &folder_links[j] else {
            return Err(Error::Structural(format!("folder {j} was claimed but not named")));
        };
        let folder = Folder {
            name: link.name.clone(),
            index: j,
            parent: link.parent,
            folders: take_range(&mut folder_slots, &def.folders, "folder")?,
            files: take_range(&mut file_slots, &def.files, "file")?,
        };
        folder_slots[j] = Some(folder);
    }

    let mut drives = Vec::with_capacity(toc.drives.len());
    for (i, def) in toc.drives.iter().enumerate() {
        let alias = text::decode_ascii(&def.alias).map_err(|e| Error::InvalidName {
            context: format!("drive {i} alias"),
            reason: e.to_string(),
        })?;
        let name = text::decode_ascii(&def.name).map_err(|e| Error::InvalidName {
            context: format!("drive {i} name"),
            reason: e.to_string(),
        })?;
        drives.push(Drive {
            alias: alias.to_string(),
            name: name.to_string(),
            root_folder: def.root_folder,
            folders: take_range(&mut folder_slots, &def.folders, "folder")?,
            files: take_range(&mut file_slots, &def.files, "file")?,
        });
    }

    debug!(
        drives = drives.len(),
        folders = claim_order.len(),
        files = assembled_files,
        "assembled archive tree"
    );

    Ok(Assembled {
        drives,
        folder_links,
        file_count: assembled_files,
    })
}

/// Validate `range` against a table of `len` entries.
fn checked(range: &Range<u32>, len: usize, context: impl Fn() -> String) -> Result<Range<usize>> {
    let (start, end) = (range.start as usize, range.end as usize);
    if start > end {
        return Err(Error::Structural(format!(
            "{} is inverted: {start}..{end}",
            context()
        )));
    }
    if end > len {
        return Err(Error::Structural(format!(
            "{} {start}..{end} exceeds table of {len}",
            context()
        )));
    }
    Ok(start..end)
}

fn claim(owners: &mut [Option<Parent>], index: usize, owner: Parent, kind: &str) -> Result<()> {
    match owners[index] {
        Some(previous) => Err(Error::Structural(format!(
            "{kind} {index} is claimed by both {previous:?} and {owner:?}"
        ))),
        None => {
            owners[index] = Some(owner);
            Ok(())
        }
    }
}

fn take_range<T>(slots: &mut [Option<T>], range: &Range<u32>, kind: &str) -> Result<Vec<T>> {
    (range.start as usize..range.end as usize)
        .map(|i| {
            slots[i]
                .take()
                .ok_or_else(|| Error::Structural(format!("{kind} {i} was not assembled")))
        })
        .collect()
}

fn build_file(names: &[u8], index: usize, def: &FileDef, parent: Parent) -> Result<File> {
    let name = resolve_name(names, def.name_offset, || format!("file {index}"))?;
    Ok(File {
        name: name.to_string(),
        index,
        parent,
        storage_type: def.storage_type,
        data_offset: def.data_offset,
        stored_size: def.stored_size,
        decompressed_size: def.decompressed_size,
        modified: def.modified,
        verification_type: def.verification_type,
        crc: def.crc,
        hash_offset: def.hash_offset,
        cache: Mutex::new(None),
    })
}
