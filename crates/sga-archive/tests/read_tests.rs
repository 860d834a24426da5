//! Decoding and tree assembly against built archives.

mod common;

use std::io::{Cursor, Seek, SeekFrom};

use pretty_assertions::assert_eq;
use sga_archive::{
    Archive, ArchiveBuilder, DriveEntry, Error, FileEntry, FolderEntry, HeaderExtra, Parent,
    StorageType, VerificationType, Version, MAGIC,
};

use common::*;

#[test]
fn test_lorem_every_storage_type_v2() {
    let bytes = lorem(Version::V2).build().unwrap();
    let archive = Archive::read(Cursor::new(bytes)).unwrap();

    assert_eq!(archive.version(), Version::V2);
    assert_eq!(archive.name(), "Lorem Ipsum");
    assert_eq!(archive.header().toc_offset, 180);
    assert_eq!(archive.file_count(), 4);

    let paths: Vec<String> = archive.walk().map(|(path, _)| path).collect();
    assert_eq!(
        paths,
        vec![
            "data:amet.txt",
            "data:lorem/ipsum.txt",
            "data:lorem/dolor.txt",
            "data:lorem/sit.txt",
        ]
    );

    let ipsum = archive.find("data:lorem/ipsum.txt").unwrap();
    assert_eq!(ipsum.storage_type(), StorageType::Store);
    assert_eq!(&ipsum.data(&archive).unwrap()[..], LOREM.as_bytes());

    let dolor = archive.find("data:lorem/dolor.txt").unwrap();
    assert_eq!(dolor.storage_type(), StorageType::BufferCompress);
    assert_eq!(&dolor.data(&archive).unwrap()[..], LOREM.as_bytes());
    let stored = dolor.stored(&archive).unwrap();
    assert_eq!(stored.len() as u64, dolor.stored_size());
    assert_eq!(stored[0], 0x78);

    let sit = archive.find("data:lorem/sit.txt").unwrap();
    assert_eq!(sit.storage_type(), StorageType::StreamCompress);
    assert_eq!(&sit.data(&archive).unwrap()[..], LOREM.repeat(3).as_bytes());
}

#[test]
fn test_roundtrip_every_version() {
    for version in Version::KNOWN {
        let builder = lorem(version);
        let bytes = builder.build().unwrap();
        let archive = Archive::read(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.version(), version);
        assert_eq!(ArchiveBuilder::from_archive(&archive).unwrap(), builder, "{version}");
    }
}

#[test]
fn test_v9_metadata_is_preserved() {
    let mut digest = [0u8; 256];
    digest[..4].copy_from_slice(b"sha!");
    let builder = ArchiveBuilder::new(Version::V9, "Age")
        .extra(HeaderExtra::V9 {
            sha256: Box::new(digest),
        })
        .drive(
            DriveEntry::new("attrib", "Attributes").file(
                FileEntry::new("unit.xml", "<unit/>")
                    .storage_type(StorageType::BufferCompress)
                    .modified(1_600_000_000)
                    .verification_type(VerificationType::CrcBlocks)
                    .crc(0xCAFE_BABE)
                    .hash_offset(96),
            ),
        );
    let archive = Archive::read(Cursor::new(builder.build().unwrap())).unwrap();

    let file = archive.find("attrib:unit.xml").unwrap();
    assert_eq!(file.modified_raw(), 1_600_000_000);
    assert!(file.modified().is_some());
    assert_eq!(file.verification_type(), VerificationType::CrcBlocks);
    assert_eq!(file.crc(), 0xCAFE_BABE);
    assert_eq!(file.hash_offset(), 96);
    assert_eq!(file.extension(), Some("xml"));
    assert_eq!(archive.header().data_size, Some(file.stored_size()));
    assert_eq!(archive.header().extra, builder.extra);
    assert_eq!(ArchiveBuilder::from_archive(&archive).unwrap(), builder);
}

#[test]
fn test_v7_unknown_field_is_preserved() {
    let builder = lorem(Version::V7).extra(HeaderExtra::V7 { unk_a: 0x0102_0304 });
    let archive = Archive::read(Cursor::new(builder.build().unwrap())).unwrap();
    assert_eq!(archive.header().extra, HeaderExtra::V7 { unk_a: 0x0102_0304 });
}

#[test]
fn test_v7_unknown_fields_rewrite_verbatim() {
    let builder = ArchiveBuilder::new(Version::V7, "Raw")
        .extra(HeaderExtra::V7 { unk_a: 0xDEAD_BEEF })
        .drive(
            DriveEntry::new("data", "Data").file(
                FileEntry::new("unit.rgd", "raw fields")
                    .storage_type(StorageType::BufferCompress)
                    .modified(1_234_567_890)
                    .verification_type(VerificationType::Sha1Blocks)
                    .crc(0x8765_4321),
            ),
        );
    let original = builder.build().unwrap();
    let archive = Archive::read(Cursor::new(original.clone())).unwrap();

    let file = archive.find("data:unit.rgd").unwrap();
    assert_eq!(file.crc(), 0x8765_4321);
    assert_eq!(file.modified_raw(), 1_234_567_890);
    assert_eq!(file.verification_type(), VerificationType::Sha1Blocks);

    let rewritten = ArchiveBuilder::from_archive(&archive).unwrap().build().unwrap();
    assert_eq!(rewritten, original);
}

#[test]
fn test_find_and_path_of() {
    let archive = Archive::read(Cursor::new(lorem(Version::V5).build().unwrap())).unwrap();

    let file = archive.find("DATA:Lorem\\Sit.TXT").unwrap();
    assert_eq!(file.name(), "sit.txt");
    assert_eq!(file.parent(), Parent::Folder(0));
    assert_eq!(archive.path_of(file).unwrap(), "data:lorem/sit.txt");

    assert!(archive.find("lorem/ipsum.txt").is_some());
    assert!(archive.find("other:lorem/ipsum.txt").is_none());
    assert!(archive.find("data:lorem").is_none());
    assert!(archive.find("data:").is_none());

    let amet = archive.find("data:amet.txt").unwrap();
    assert_eq!(amet.parent(), Parent::Drive(0));
    assert_eq!(archive.path_of(amet).unwrap(), "data:amet.txt");
}

#[test]
fn test_nested_children_keep_order() {
    let builder = ArchiveBuilder::new(Version::V7, "Nested").drive(
        DriveEntry::new("data", "Data")
            .folder(
                FolderEntry::new("zeta")
                    .folder(FolderEntry::new("inner").file(FileEntry::new("deep.bin", vec![1u8, 2, 3])))
                    .file(FileEntry::new("z.txt", "z")),
            )
            .folder(FolderEntry::new("alpha").file(FileEntry::new("a.txt", "a"))),
    );
    let archive = Archive::read(Cursor::new(builder.build().unwrap())).unwrap();

    let drive = &archive.drives()[0];
    let names: Vec<&str> = drive.folders().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);

    let paths: Vec<String> = archive.walk().map(|(path, _)| path).collect();
    assert_eq!(paths, vec!["data:zeta/z.txt", "data:zeta/inner/deep.bin", "data:alpha/a.txt"]);

    let deep = archive.find("data:zeta/inner/deep.bin").unwrap();
    assert_eq!(archive.path_of(deep).unwrap(), "data:zeta/inner/deep.bin");
}

#[test]
fn test_multiple_drives() {
    let builder = ArchiveBuilder::new(Version::V5, "Two")
        .drive(DriveEntry::new("data", "Data").file(FileEntry::new("a.txt", "a")))
        .drive(DriveEntry::new("attrib", "Attrib").file(FileEntry::new("a.txt", "b")));
    let archive = Archive::read(Cursor::new(builder.build().unwrap())).unwrap();

    assert_eq!(archive.drives().len(), 2);
    let second = archive.find("attrib:a.txt").unwrap();
    assert_eq!(&second.data(&archive).unwrap()[..], b"b");
    assert_eq!(second.parent(), Parent::Drive(1));
}

#[test]
fn test_empty_archive() {
    for version in Version::KNOWN {
        let bytes = ArchiveBuilder::new(version, "").build().unwrap();
        let archive = Archive::read(Cursor::new(bytes)).unwrap();
        assert!(archive.drives().is_empty());
        assert_eq!(archive.walk().count(), 0);
    }
}

#[test]
fn test_archive_at_nonzero_offset() {
    let mut bytes = vec![0xA5u8; 100];
    bytes.extend(lorem(Version::V5).build().unwrap());
    let mut cursor = Cursor::new(bytes);
    cursor.seek(SeekFrom::Start(100)).unwrap();

    let archive = Archive::read(cursor).unwrap();
    let file = archive.find("data:lorem/dolor.txt").unwrap();
    assert_eq!(&file.data(&archive).unwrap()[..], LOREM.as_bytes());
    archive.verify_checksums().unwrap();
}

#[test]
fn test_toc_offsets_are_relative_to_toc_start() {
    const PAD: usize = 37;
    let original = lorem(Version::V5).build().unwrap();
    let layout = v5_layout(&original);

    let mut bytes = original[..layout.toc].to_vec();
    bytes.extend(std::iter::repeat(0xEE).take(PAD));
    bytes.extend_from_slice(&original[layout.toc..]);
    let toc_offset = u32_at(&bytes, V5_TOC_OFFSET_FIELD);
    let data_offset = u32_at(&bytes, V5_DATA_OFFSET_FIELD);
    put_u32(&mut bytes, V5_TOC_OFFSET_FIELD, toc_offset + PAD as u32);
    put_u32(&mut bytes, V5_DATA_OFFSET_FIELD, data_offset + PAD as u32);

    let archive = Archive::read(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.header().toc_offset, (layout.toc + PAD) as u64);
    for (path, file) in archive.walk() {
        let expected = if path.ends_with("amet.txt") {
            "amet".to_string()
        } else if path.ends_with("sit.txt") {
            LOREM.repeat(3)
        } else {
            LOREM.to_string()
        };
        assert_eq!(&file.data(&archive).unwrap()[..], expected.as_bytes(), "{path}");
    }
    // Both digests start at the ToC, so moving it keeps them valid.
    archive.verify_checksums().unwrap();
}

#[test]
fn test_bad_magic() {
    let mut bytes = lorem(Version::V2).build().unwrap();
    bytes[0] = b'-';
    assert!(matches!(
        Archive::read(Cursor::new(bytes)),
        Err(Error::BadMagic { .. })
    ));
}

#[test]
fn test_unsupported_version() {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&99u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 512]);
    match Archive::read(Cursor::new(bytes)) {
        Err(Error::UnsupportedVersion { received, known }) => {
            assert_eq!(received, Version::new(99, 0));
            assert_eq!(known, Version::KNOWN.to_vec());
        }
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[test]
fn test_v5_reserved_field() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    put_u32(&mut bytes, V5_RESERVED_1_FIELD, 2);
    assert!(matches!(
        Archive::read(Cursor::new(bytes)),
        Err(Error::ReservedField {
            field: "reserved_1",
            expected: 1,
            actual: 2
        })
    ));
}

#[test]
fn test_name_offset_past_buffer() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    let layout = v5_layout(&bytes);
    put_u32(&mut bytes, layout.files, 0xFFFF);
    assert!(matches!(
        Archive::read(Cursor::new(bytes)),
        Err(Error::InvalidName { .. })
    ));
}

#[test]
fn test_overlapping_ranges() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    let layout = v5_layout(&bytes);
    // Folder 0 owns files 1..4; widen it to 0..4, which the drive already owns.
    let file_start = layout.folders + 8;
    assert_eq!(u16_at(&bytes, file_start), 1);
    put_u16(&mut bytes, file_start, 0);
    assert!(matches!(
        Archive::read(Cursor::new(bytes)),
        Err(Error::Structural(_))
    ));
}

#[test]
fn test_range_past_table() {
    let mut bytes = lorem(Version::V5).build().unwrap();
    let layout = v5_layout(&bytes);
    // Drive record: alias[64] name[64] folder_start folder_end file_start file_end
    put_u16(&mut bytes, layout.drives + 134, 9);
    assert!(matches!(
        Archive::read(Cursor::new(bytes)),
        Err(Error::Structural(_))
    ));
}

#[test]
fn test_truncated_toc() {
    let bytes = lorem(Version::V5).build().unwrap();
    let layout = v5_layout(&bytes);
    let cut = bytes[..layout.toc + 10].to_vec();
    assert!(matches!(
        Archive::read(Cursor::new(cut)),
        Err(Error::TruncatedData { what: "ToC", .. })
    ));
}

#[test]
fn test_truncated_header() {
    let bytes = lorem(Version::V9).build().unwrap();
    assert!(matches!(
        Archive::read(Cursor::new(bytes[..100].to_vec())),
        Err(Error::TruncatedData { what: "header", .. })
    ));
}

#[test]
fn test_open_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    lorem(Version::V7).write_to_file(file.path()).unwrap();
    std::io::Write::flush(&mut file).unwrap();

    let archive = Archive::open(file.path()).unwrap();
    assert_eq!(archive.version(), Version::V7);
    let sit = archive.find("data:lorem/sit.txt").unwrap();
    assert_eq!(&sit.data(&archive).unwrap()[..], LOREM.repeat(3).as_bytes());
}
