//! Lazy materialization, caching and per-file failure locality.

mod common;

use std::io::Cursor;

use sga_archive::{Archive, Error, ReadOptions, StorageType, Version};

use common::*;

/// Absolute position of flat file record `index` in a v5 lorem archive.
fn file_record(bytes: &[u8], index: usize) -> usize {
    v5_layout(bytes).files + index * V5_FILE_RECORD
}

#[test]
fn test_lazy_read_touches_no_file() {
    let archive = Archive::read(Cursor::new(lorem(Version::V5).build().unwrap())).unwrap();
    assert!(archive.walk().all(|(_, file)| !file.is_materialized()));

    let file = archive.find("data:lorem/dolor.txt").unwrap();
    file.data(&archive).unwrap();
    assert!(file.is_materialized());
    assert!(!archive.find("data:lorem/sit.txt").unwrap().is_materialized());
}

#[test]
fn test_second_access_is_served_from_cache() {
    let archive = Archive::read(Cursor::new(lorem(Version::V5).build().unwrap())).unwrap();
    let file = archive.find("data:lorem/sit.txt").unwrap();
    let first = file.data(&archive).unwrap();
    let again = file.data(&archive).unwrap();
    assert_eq!(first.as_ptr(), again.as_ptr());
}

#[test]
fn test_open_returns_cursor() {
    use std::io::Read;

    let archive = Archive::read(Cursor::new(lorem(Version::V9).build().unwrap())).unwrap();
    let mut content = String::new();
    archive
        .find("data:lorem/sit.txt")
        .unwrap()
        .open(&archive)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, LOREM.repeat(3));
}

#[test]
fn test_size_mismatch_is_local_to_the_file() {
    let mut bytes = lorem(Version::V5).build().unwrap();

    // ipsum.txt (Store): declare one byte more than is stored.
    let ipsum = file_record(&bytes, 1);
    let declared = u32_at(&bytes, ipsum + 12);
    put_u32(&mut bytes, ipsum + 12, declared + 1);

    // dolor.txt (zlib): declare one byte less than it inflates to.
    let dolor = file_record(&bytes, 2);
    let declared = u32_at(&bytes, dolor + 12);
    put_u32(&mut bytes, dolor + 12, declared - 1);

    let archive = Archive::read(Cursor::new(bytes)).unwrap();
    let len = LOREM.len() as u64;

    match archive.find("data:lorem/ipsum.txt").unwrap().data(&archive) {
        Err(Error::SizeMismatch { expected, actual }) => {
            assert_eq!(expected, len + 1);
            assert_eq!(actual, len);
        }
        other => panic!("expected SizeMismatch, got {other:?}"),
    }
    match archive.find("data:lorem/dolor.txt").unwrap().data(&archive) {
        Err(Error::SizeMismatch { expected, actual }) => {
            assert_eq!(expected, len - 1);
            assert_eq!(actual, len);
        }
        other => panic!("expected SizeMismatch, got {other:?}"),
    }

    let sit = archive.find("data:lorem/sit.txt").unwrap();
    assert_eq!(&sit.data(&archive).unwrap()[..], LOREM.repeat(3).as_bytes());
}

#[test]
fn test_size_mismatch_fails_eager_read() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    let ipsum = file_record(&bytes, 1);
    let declared = u32_at(&bytes, ipsum + 12);
    put_u32(&mut bytes, ipsum + 12, declared + 1);

    let options = ReadOptions::new().lazy(false);
    assert!(matches!(
        Archive::read_with(Cursor::new(bytes), &options),
        Err(Error::SizeMismatch { .. })
    ));
}

#[test]
fn test_truncated_data_is_lazy_local_and_eager_fatal() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    // sit.txt is the last file in the data region.
    bytes.truncate(bytes.len() - 5);

    let archive = Archive::read(Cursor::new(bytes.clone())).unwrap();
    let sit = archive.find("data:lorem/sit.txt").unwrap();
    assert!(matches!(
        sit.data(&archive),
        Err(Error::TruncatedData {
            what: "file data",
            ..
        })
    ));
    assert!(!sit.is_materialized());
    let amet = archive.find("data:amet.txt").unwrap();
    assert_eq!(&amet.data(&archive).unwrap()[..], b"amet");

    assert!(matches!(
        Archive::read_with(Cursor::new(bytes), &ReadOptions::new().lazy(false)),
        Err(Error::TruncatedData { .. })
    ));
}

#[test]
fn test_data_offset_past_archive_end_is_truncated() {
    let mut bytes = lorem(Version::V9).build().unwrap();
    let toc = u32_at(&bytes, V9_TOC_OFFSET_FIELD) as usize;
    let files = toc + u32_at(&bytes, toc + 16) as usize;
    let amet = Archive::read(Cursor::new(bytes.clone()))
        .unwrap()
        .find("data:amet.txt")
        .unwrap()
        .index();
    let record = files + amet * V9_FILE_RECORD;
    bytes[record + 8..record + 16].copy_from_slice(&u64::MAX.to_le_bytes());

    let archive = Archive::read(Cursor::new(bytes.clone())).unwrap();
    let file = archive.find("data:amet.txt").unwrap();
    assert_eq!(file.data_offset(), u64::MAX);
    assert!(matches!(
        file.data(&archive),
        Err(Error::TruncatedData {
            what: "file data",
            expected: 4,
            actual: 0,
        })
    ));
    assert!(file.open(&archive).is_err());
    assert_eq!(
        &archive.find("data:lorem/ipsum.txt").unwrap().data(&archive).unwrap()[..],
        LOREM.as_bytes()
    );

    assert!(matches!(
        Archive::read_with(Cursor::new(bytes), &ReadOptions::new().lazy(false)),
        Err(Error::TruncatedData { .. })
    ));
}

#[test]
fn test_huge_stored_size_fails_without_reading() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    let ipsum = file_record(&bytes, 1);
    put_u32(&mut bytes, ipsum + 8, u32::MAX);

    let archive = Archive::read(Cursor::new(bytes)).unwrap();
    let file = archive.find("data:lorem/ipsum.txt").unwrap();
    assert_eq!(file.stored_size(), u64::from(u32::MAX));
    assert!(matches!(
        file.data(&archive),
        Err(Error::TruncatedData {
            what: "file data",
            expected: 0xFFFF_FFFF,
            ..
        })
    ));
    assert!(!file.is_materialized());
}

#[test]
fn test_eager_read_without_decompression() {
    let options = ReadOptions::new().lazy(false).decompress(false);
    let mut archive =
        Archive::read_with(Cursor::new(lorem(Version::V7).build().unwrap()), &options).unwrap();
    assert!(archive.walk().all(|(_, file)| file.is_materialized()));

    let dolor = archive.find("data:lorem/dolor.txt").unwrap();
    let stored = dolor.stored(&archive).unwrap();
    assert_eq!(stored.len() as u64, dolor.stored_size());
    assert_eq!(&dolor.data(&archive).unwrap()[..], LOREM.as_bytes());

    let files = archive.drives_mut()[0].folders_mut()[0].files_mut();
    let dolor = &mut files[1];
    assert_eq!(dolor.storage_type(), StorageType::BufferCompress);
    dolor.compress().unwrap();
    dolor.compress().unwrap();
    dolor.decompress().unwrap();
    dolor.decompress().unwrap();
}

#[test]
fn test_evict_and_mutators() {
    let mut archive = Archive::read(Cursor::new(lorem(Version::V5).build().unwrap())).unwrap();
    archive.load_all().unwrap();

    let files = archive.drives_mut()[0].folders_mut()[0].files_mut();

    // Store files have nothing to compress.
    let ipsum = &mut files[0];
    ipsum.compress().unwrap();
    assert!(ipsum.is_materialized());

    let dolor = &mut files[1];
    dolor.evict();
    assert!(!dolor.is_materialized());
    assert!(matches!(dolor.compress(), Err(Error::NotMaterialized(_))));
    assert!(matches!(dolor.decompress(), Err(Error::NotMaterialized(_))));

    let sit = &mut files[2];
    sit.compress().unwrap();
    sit.decompress().unwrap();
    assert!(sit.is_materialized());

    // Evicted files are re-read on the next access.
    let dolor = archive.find("data:lorem/dolor.txt").unwrap();
    assert_eq!(&dolor.data(&archive).unwrap()[..], LOREM.as_bytes());
}

#[test]
fn test_concurrent_reads_share_one_stream() {
    let archive = Archive::read(Cursor::new(lorem(Version::V9).build().unwrap())).unwrap();
    let expected: Vec<(String, Vec<u8>)> = archive
        .walk()
        .map(|(path, file)| (path, file.stored(&archive).unwrap().to_vec()))
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for (path, stored) in &expected {
                    let file = archive.find(path).unwrap();
                    assert_eq!(&file.stored(&archive).unwrap()[..], &stored[..]);
                    file.data(&archive).unwrap();
                }
            });
        }
    });
    assert!(archive.walk().all(|(_, file)| file.is_materialized()));
}

#[cfg(feature = "parallel")]
#[test]
fn test_load_all_parallel() {
    let archive = Archive::read(Cursor::new(lorem(Version::V5).build().unwrap())).unwrap();
    archive.load_all_parallel().unwrap();
    assert!(archive.walk().all(|(_, file)| file.is_materialized()));
}
