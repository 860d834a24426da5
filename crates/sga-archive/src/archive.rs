//! Archive facade: decode a stream into a tree and serve file reads.

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;
use sga_common::BinaryReader;
use tracing::debug;

use crate::checksum;
use crate::codec::ArchiveCodec;
use crate::entry::{Drive, File, Folder, Parent};
use crate::header::ArchiveHeader;
use crate::io::{read_exact_checked, read_vec_checked};
use crate::store::DataSource;
use crate::toc;
use crate::tree::{self, FolderLink};
use crate::version::{read_preamble, Version};
use crate::{Error, Result};

/// Options controlling how an archive is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Defer file reads until first access.
    pub lazy: bool,
    /// When reading eagerly, cache decompressed content rather than the
    /// stored bytes.
    pub decompress: bool,
    /// Validate the MD5 checksums during the read (v2 and v5 only).
    pub verify_checksums: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            lazy: true,
            decompress: true,
            verify_checksums: false,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn decompress(mut self, decompress: bool) -> Self {
        self.decompress = decompress;
        self
    }

    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }
}

/// A decoded SGA archive.
///
/// The tree is fully decoded and validated when this value exists; file
/// content is read from the stream on demand (see [`File::data`]).
pub struct Archive<R> {
    version: Version,
    codec: &'static dyn ArchiveCodec,
    header: ArchiveHeader,
    drives: Vec<Drive>,
    folder_links: Vec<Option<FolderLink>>,
    file_count: usize,
    source: DataSource<R>,
}

impl Archive<Cursor<Mmap>> {
    /// Memory-map the file at `path` and read it with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &ReadOptions::default())
    }

    /// Memory-map the file at `path` and read it.
    pub fn open_with<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::read_with(Cursor::new(mmap), options)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Read an archive starting at the stream's current position.
    pub fn read(stream: R) -> Result<Self> {
        Self::read_with(stream, &ReadOptions::default())
    }

    /// Read an archive starting at the stream's current position.
    ///
    /// Any failure, including a checksum or eager materialization failure
    /// requested by `options`, fails the whole read. Checksums are validated
    /// before the ToC is decoded.
    pub fn read_with(mut stream: R, options: &ReadOptions) -> Result<Self> {
        let base = stream.stream_position()?;
        let (version, codec) = read_preamble(&mut stream)?;

        let mut raw_header = vec![0u8; codec.header_len()];
        read_exact_checked(&mut stream, &mut raw_header, "header")?;
        let header = codec.decode_header(&mut BinaryReader::new(&raw_header))?;
        debug!(
            %version,
            name = %header.name,
            toc_offset = header.toc_offset,
            toc_size = header.toc_size,
            data_offset = header.data_offset,
            "decoded archive header"
        );

        let archive_len = stream.seek(SeekFrom::End(0))?.saturating_sub(base);
        let toc_end = header.toc_offset.saturating_add(header.toc_size);
        if toc_end > archive_len {
            return Err(Error::TruncatedData {
                what: "ToC",
                expected: header.toc_size,
                actual: archive_len.saturating_sub(header.toc_offset),
            });
        }
        if header.data_offset > archive_len {
            return Err(Error::TruncatedData {
                what: "data region",
                expected: header.data_offset,
                actual: archive_len,
            });
        }

        // A corrupt ToC must surface as a checksum mismatch, not a decode error.
        if options.verify_checksums {
            if !codec.has_checksums() {
                return Err(Error::ChecksumsUnsupported(version));
            }
            checksum::verify_at(&mut stream, base, &header, version)?;
        }

        stream.seek(SeekFrom::Start(base + header.toc_offset))?;
        let raw_toc = read_vec_checked(&mut stream, header.toc_size, "ToC")?;
        let sparse = toc::decode(codec, &raw_toc)?;
        let assembled = tree::assemble(&sparse)?;

        let archive = Self {
            version,
            codec,
            source: DataSource::new(stream, base, header.data_offset, archive_len),
            header,
            drives: assembled.drives,
            folder_links: assembled.folder_links,
            file_count: assembled.file_count,
        };

        if !options.lazy {
            archive.materialize_all(options.decompress)?;
        }
        Ok(archive)
    }

    /// Recompute and compare the stored MD5 checksums.
    ///
    /// Versions without stored checksums report `ChecksumsUnsupported`.
    pub fn verify_checksums(&self) -> Result<()> {
        if !self.codec.has_checksums() {
            return Err(Error::ChecksumsUnsupported(self.version));
        }
        let base = self.source.base();
        self.source
            .with_stream(|stream| checksum::verify_at(stream, base, &self.header, self.version))
    }

    /// Materialize and decompress every file, stopping at the first failure.
    pub fn load_all(&self) -> Result<()> {
        self.materialize_all(true)
    }

    /// Like [`Archive::load_all`], inflating on the rayon pool.
    ///
    /// Stream reads are still serialized; only decompression runs in parallel.
    #[cfg(feature = "parallel")]
    pub fn load_all_parallel(&self) -> Result<()>
    where
        R: Send,
    {
        use rayon::prelude::*;

        let files: Vec<&File> = self.walk().map(|(_, file)| file).collect();
        files.par_iter().try_for_each(|file| file.data(self).map(|_| ()))
    }

    fn materialize_all(&self, decompress: bool) -> Result<()> {
        for (_, file) in self.walk() {
            file.load(self, decompress)?;
        }
        debug!(files = self.file_count, decompress, "materialized all files");
        Ok(())
    }

    pub(crate) fn source(&self) -> &DataSource<R> {
        &self.source
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }
}

impl<R> Archive<R> {
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Archive display name from the header.
    #[inline]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    #[inline]
    pub fn drives(&self) -> &[Drive] {
        &self.drives
    }

    #[inline]
    pub fn drives_mut(&mut self) -> &mut [Drive] {
        &mut self.drives
    }

    /// Number of files in the tree.
    #[inline]
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Iterate every file depth-first as `(path, file)`, in on-disk order.
    ///
    /// A node's own files come before its subfolders.
    pub fn walk(&self) -> Walk<'_> {
        let pending = self
            .drives
            .iter()
            .rev()
            .map(|drive| (format!("{}:", drive.alias), drive.folders.as_slice(), drive.files.as_slice()))
            .collect();
        Walk {
            pending,
            current: None,
        }
    }

    /// Find a file by path, e.g. `data:art/ui/icon.png`.
    ///
    /// Matching is ASCII case-insensitive and accepts `/` or `\` separators.
    /// Without an `alias:` prefix every drive is searched.
    pub fn find(&self, path: &str) -> Option<&File> {
        let (alias, rest) = match path.split_once(':') {
            Some((alias, rest)) => (Some(alias), rest),
            None => (None, path),
        };
        let parts: Vec<&str> = rest.split(['/', '\\']).filter(|p| !p.is_empty()).collect();
        let (file_name, dirs) = parts.split_last()?;

        self.drives
            .iter()
            .filter(|d| alias.map_or(true, |a| d.alias.eq_ignore_ascii_case(a)))
            .find_map(|drive| {
                let mut folders = drive.folders.as_slice();
                let mut files = drive.files.as_slice();
                for dir in dirs {
                    let folder: &Folder = folders.iter().find(|f| f.name.eq_ignore_ascii_case(dir))?;
                    folders = folder.folders.as_slice();
                    files = folder.files.as_slice();
                }
                files.iter().find(|f| f.name.eq_ignore_ascii_case(file_name))
            })
    }

    /// Rebuild the full path of a file in this archive.
    pub fn path_of(&self, file: &File) -> Option<String> {
        let mut segments = vec![file.name.as_str()];
        let mut parent = file.parent;
        // Links come from unique claims, so a chain never exceeds the table.
        for _ in 0..=self.folder_links.len() {
            match parent {
                Parent::Drive(i) => {
                    let drive = self.drives.get(i)?;
                    segments.reverse();
                    return Some(format!("{}:{}", drive.alias, segments.join("/")));
                }
                Parent::Folder(j) => {
                    let link = self.folder_links.get(j)?.as_ref()?;
                    segments.push(&link.name);
                    parent = link.parent;
                }
            }
        }
        None
    }
}

/// Depth-first iterator over `(path, file)` pairs. See [`Archive::walk`].
pub struct Walk<'a> {
    pending: Vec<(String, &'a [Folder], &'a [File])>,
    current: Option<(String, std::slice::Iter<'a, File>)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (String, &'a File);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((prefix, files)) = &mut self.current {
                if let Some(file) = files.next() {
                    return Some((format!("{prefix}{}", file.name), file));
                }
                self.current = None;
            }

            let (prefix, folders, files) = self.pending.pop()?;
            for folder in folders.iter().rev() {
                self.pending.push((
                    format!("{prefix}{}/", folder.name),
                    folder.folders.as_slice(),
                    folder.files.as_slice(),
                ));
            }
            self.current = Some((prefix, files.iter()));
        }
    }
}

impl<R> std::fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("version", &self.version)
            .field("name", &self.header.name)
            .field("drives", &self.drives.len())
            .field("files", &self.file_count)
            .finish()
    }
}
