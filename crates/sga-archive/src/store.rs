//! Lazy file store.
//!
//! File bytes stay on disk until first access. The archive's stream sits
//! behind a mutex so any number of `&Archive` holders can materialize files,
//! but only one seek/read pair runs at a time. Inflation happens after the
//! stream lock is released.

use std::io::{Cursor, Read, Seek, SeekFrom};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::trace;

use crate::archive::Archive;
use crate::decompress;
use crate::entry::{File, StorageType};
use crate::io::read_vec_checked;
use crate::{Error, Result};

/// Cached bytes of one file.
#[derive(Debug, Clone)]
pub(crate) struct Payload {
    pub(crate) bytes: Bytes,
    /// Whether `bytes` is the zlib stream rather than the content.
    pub(crate) compressed: bool,
}

/// The archive's backing stream plus the offsets file reads are relative to.
#[derive(Debug)]
pub(crate) struct DataSource<R> {
    stream: Mutex<R>,
    /// Stream position of the `_ARCHIVE` magic.
    base: u64,
    /// Absolute start of the data region within the archive.
    data_origin: u64,
    /// Archive length measured from `base`.
    archive_len: u64,
}

impl<R: Read + Seek> DataSource<R> {
    pub(crate) fn new(stream: R, base: u64, data_origin: u64, archive_len: u64) -> Self {
        Self {
            stream: Mutex::new(stream),
            base,
            data_origin,
            archive_len,
        }
    }

    #[inline]
    pub(crate) fn base(&self) -> u64 {
        self.base
    }

    /// Run `f` with exclusive access to the stream.
    pub(crate) fn with_stream<T>(&self, f: impl FnOnce(&mut R) -> Result<T>) -> Result<T> {
        let mut stream = self.stream.lock();
        f(&mut stream)
    }

    /// Read the exact on-disk bytes of `file`.
    ///
    /// A record whose bytes would extend past the end of the archive fails
    /// with `TruncatedData` before anything is read.
    pub(crate) fn read_stored(&self, file: &File) -> Result<Vec<u8>> {
        let start = self.data_origin.checked_add(file.data_offset);
        let end = start.and_then(|start| start.checked_add(file.stored_size));
        let start = match (start, end) {
            (Some(start), Some(end)) if end <= self.archive_len => start,
            (start, _) => {
                return Err(Error::TruncatedData {
                    what: "file data",
                    expected: file.stored_size,
                    actual: start.map_or(0, |start| self.archive_len.saturating_sub(start)),
                })
            }
        };
        let position = self.base + start;
        trace!(file = %file.name, position, len = file.stored_size, "reading file data");

        self.with_stream(|stream| {
            stream.seek(SeekFrom::Start(position))?;
            read_vec_checked(stream, file.stored_size, "file data")
        })
    }

    pub(crate) fn into_inner(self) -> R {
        self.stream.into_inner()
    }
}

impl File {
    /// Whether the file currently holds cached bytes.
    pub fn is_materialized(&self) -> bool {
        self.cache.lock().is_some()
    }

    /// Open the file's content as a readable cursor.
    pub fn open<R: Read + Seek>(&self, archive: &Archive<R>) -> Result<Cursor<Bytes>> {
        Ok(Cursor::new(self.data(archive)?))
    }

    /// The file's decompressed content, materializing it on first use.
    ///
    /// A successful result is cached; later calls do not touch the stream.
    pub fn data<R: Read + Seek>(&self, archive: &Archive<R>) -> Result<Bytes> {
        let cached = self.cache.lock().clone();
        let payload = match cached {
            Some(payload) if !payload.compressed => return Ok(payload.bytes),
            Some(payload) => payload,
            None => self.read_payload(archive)?,
        };

        let content = self.expand(payload)?;
        *self.cache.lock() = Some(Payload {
            bytes: content.clone(),
            compressed: false,
        });
        Ok(content)
    }

    /// The file's bytes exactly as stored in the archive.
    ///
    /// Served from the cache when it holds the stored form, otherwise read
    /// from the stream without touching the cache.
    pub fn stored<R: Read + Seek>(&self, archive: &Archive<R>) -> Result<Bytes> {
        if let Some(payload) = self.cache.lock().as_ref() {
            if payload.compressed == self.storage_type.is_compressed() {
                return Ok(payload.bytes.clone());
            }
        }
        Ok(self.read_payload(archive)?.bytes)
    }

    /// Materialize the file into the cache.
    ///
    /// With `decompress` false, compressed files keep their stored bytes.
    pub(crate) fn load<R: Read + Seek>(&self, archive: &Archive<R>, decompress: bool) -> Result<()> {
        if decompress {
            self.data(archive).map(|_| ())
        } else {
            if self.is_materialized() {
                return Ok(());
            }
            let payload = self.read_payload(archive)?;
            *self.cache.lock() = Some(payload);
            Ok(())
        }
    }

    /// Drop any cached bytes. The next access reads the stream again.
    pub fn evict(&mut self) {
        self.cache.get_mut().take();
    }

    /// Replace cached content with its zlib form.
    ///
    /// A no-op for `Store` files and for files already holding compressed
    /// bytes.
    pub fn compress(&mut self) -> Result<()> {
        let storage_type = self.storage_type;
        let payload = self.materialized_mut()?;
        if payload.compressed || storage_type == StorageType::Store {
            return Ok(());
        }
        payload.bytes = Bytes::from(decompress::deflate(&payload.bytes)?);
        payload.compressed = true;
        Ok(())
    }

    /// Replace cached zlib bytes with the content they expand to.
    pub fn decompress(&mut self) -> Result<()> {
        let expected = self.decompressed_size;
        let payload = self.materialized_mut()?;
        if !payload.compressed {
            return Ok(());
        }
        payload.bytes = Bytes::from(decompress::inflate_sized(&payload.bytes, expected)?);
        payload.compressed = false;
        Ok(())
    }

    fn materialized_mut(&mut self) -> Result<&mut Payload> {
        let name = &self.name;
        self.cache
            .get_mut()
            .as_mut()
            .ok_or_else(|| Error::NotMaterialized(name.clone()))
    }

    fn read_payload<R: Read + Seek>(&self, archive: &Archive<R>) -> Result<Payload> {
        let raw = archive.source().read_stored(self)?;
        Ok(Payload {
            bytes: Bytes::from(raw),
            compressed: self.storage_type.is_compressed(),
        })
    }

    /// Turn a payload into content, checking it against the declared size.
    pub(crate) fn expand(&self, payload: Payload) -> Result<Bytes> {
        if payload.compressed {
            trace!(file = %self.name, stored = payload.bytes.len(), "inflating");
            return decompress::inflate_sized(&payload.bytes, self.decompressed_size).map(Bytes::from);
        }
        if self.storage_type == StorageType::Store && payload.bytes.len() as u64 != self.decompressed_size {
            return Err(Error::SizeMismatch {
                expected: self.decompressed_size,
                actual: payload.bytes.len() as u64,
            });
        }
        Ok(payload.bytes)
    }
}
