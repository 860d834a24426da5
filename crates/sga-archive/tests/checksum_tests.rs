//! Salted MD5 validation end to end.

mod common;

use std::io::Cursor;

use proptest::prelude::*;
use sga_archive::{Archive, ChecksumKind, Error, ReadOptions, Version};

use common::*;

#[test]
fn test_built_archives_validate() {
    for version in [Version::V2, Version::V5] {
        let bytes = lorem(version).build().unwrap();
        let options = ReadOptions::new().verify_checksums(true);
        let archive = Archive::read_with(Cursor::new(bytes), &options).unwrap();
        archive.verify_checksums().unwrap();
        assert!(archive.header().checksums.is_some());
    }
}

#[test]
fn test_versions_without_checksums() {
    for version in [Version::V7, Version::V9] {
        let bytes = lorem(version).build().unwrap();
        let archive = Archive::read(Cursor::new(bytes.clone())).unwrap();
        assert!(archive.header().checksums.is_none());
        assert!(matches!(
            archive.verify_checksums(),
            Err(Error::ChecksumsUnsupported(v)) if v == version
        ));

        let options = ReadOptions::new().verify_checksums(true);
        assert!(matches!(
            Archive::read_with(Cursor::new(bytes), &options),
            Err(Error::ChecksumsUnsupported(_))
        ));
    }
}

#[test]
fn test_data_corruption_is_a_file_mismatch() {
    let mut bytes = lorem(Version::V2).build().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x40;

    // Unvalidated reads do not notice.
    let archive = Archive::read(Cursor::new(bytes.clone())).unwrap();
    assert!(matches!(
        archive.verify_checksums(),
        Err(Error::ChecksumMismatch {
            kind: ChecksumKind::File,
            ..
        })
    ));
}

#[test]
fn test_toc_corruption_is_a_header_mismatch() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    let layout = v5_layout(&bytes);
    bytes[layout.files] ^= 0x01;

    let options = ReadOptions::new().verify_checksums(true);
    assert!(matches!(
        Archive::read_with(Cursor::new(bytes), &options),
        Err(Error::ChecksumMismatch {
            kind: ChecksumKind::Header,
            ..
        })
    ));
}

#[test]
fn test_stored_digest_corruption() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    // file_md5 is the first header field.
    bytes[12] ^= 0xFF;
    let archive = Archive::read(Cursor::new(bytes)).unwrap();
    assert!(matches!(
        archive.verify_checksums(),
        Err(Error::ChecksumMismatch {
            kind: ChecksumKind::File,
            ..
        })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn single_bit_flip_is_detected(position in any::<prop::sample::Index>(), bit in 0u8..8) {
        let mut bytes = lorem(Version::V5).build().unwrap();
        let toc = v5_layout(&bytes).toc;
        let target = toc + position.index(bytes.len() - toc);
        bytes[target] ^= 1 << bit;

        let options = ReadOptions::new().verify_checksums(true);
        let result = Archive::read_with(Cursor::new(bytes), &options);
        let is_checksum_mismatch = matches!(result, Err(Error::ChecksumMismatch { .. }));
        prop_assert!(is_checksum_mismatch);
    }
}
