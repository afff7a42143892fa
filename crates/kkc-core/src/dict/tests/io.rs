use std::fs;

use crate::dict::{CompressedDictionary, DictError, Dictionary};

fn sample_dict() -> CompressedDictionary {
    CompressedDictionary::build(vec![
        ("わたし", vec!["私", "渡し"]),
        ("なまえ", vec!["名前"]),
        ("なか", vec!["中", "仲"]),
        ("なかの", vec!["中野"]),
    ])
    .unwrap()
}

#[test]
fn test_roundtrip_bytes() {
    let dict = sample_dict();
    let bytes = dict.to_bytes().unwrap();
    let loaded = CompressedDictionary::from_bytes(&bytes).unwrap();

    assert_eq!(loaded.len(), dict.len());
    for reading in ["わたし", "なまえ", "なか", "なかの", "ない"] {
        assert_eq!(
            loaded.find_candidates(reading),
            dict.find_candidates(reading),
            "mismatch for {reading}"
        );
    }
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system.dict");

    let dict = sample_dict();
    dict.save(&path).unwrap();
    assert!(!path.with_extension("tmp").exists());

    let loaded = CompressedDictionary::load(&path).unwrap();
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded.find_candidates("わたし"), vec!["私", "渡し"]);
    assert_eq!(loaded.prefixes_of("なかのです"), vec!["なか", "なかの"]);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = CompressedDictionary::load(&dir.path().join("nope.dict"));
    assert!(matches!(result, Err(DictError::Io(_))));
}

#[test]
fn test_load_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.dict");
    fs::write(&path, b"this is not a dictionary").unwrap();
    assert!(matches!(
        CompressedDictionary::load(&path),
        Err(DictError::InvalidMagic)
    ));
}

#[test]
fn test_invalid_header() {
    assert!(matches!(
        CompressedDictionary::from_bytes(b"KK"),
        Err(DictError::InvalidHeader)
    ));
}

#[test]
fn test_unsupported_version() {
    let mut bytes = sample_dict().to_bytes().unwrap();
    bytes[4] = 99;
    assert!(matches!(
        CompressedDictionary::from_bytes(&bytes),
        Err(DictError::UnsupportedVersion(99))
    ));
}

#[test]
fn test_truncated_trie() {
    let bytes = sample_dict().to_bytes().unwrap();
    let truncated = &bytes[..bytes.len() - 1];
    assert!(matches!(
        CompressedDictionary::from_bytes(truncated),
        Err(DictError::InvalidHeader)
    ));
}

#[test]
fn test_checksum_mismatch() {
    let mut bytes = sample_dict().to_bytes().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x5a;
    assert!(matches!(
        CompressedDictionary::from_bytes(&bytes),
        Err(DictError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_key_count_mismatch() {
    let mut bytes = sample_dict().to_bytes().unwrap();
    // key_count lives outside the checksummed trie bytes
    bytes[8..12].copy_from_slice(&5u32.to_le_bytes());
    let err = CompressedDictionary::from_bytes(&bytes).unwrap_err();
    match err {
        DictError::Trie(msg) => assert_eq!(msg, "header declares 5 keys, trie holds 4"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_failed_save_removes_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system.kkdx");
    // A non-empty directory in the way makes the final rename fail.
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), b"x").unwrap();

    let err = sample_dict().save(&path).unwrap_err();
    assert!(matches!(err, DictError::Io(_)));
    assert!(!path.with_extension("tmp").exists());
    assert!(path.join("keep").exists());
}
