use crate::test_utils::sample_table;
use crate::*;

#[test]
fn roundtrip_through_bytes() {
    let table = sample_table();
    let bytes = table.to_bytes().unwrap();

    let header = Header::from_bytes(&bytes).unwrap();
    assert_eq!(header.total_size as usize, bytes.len());
    assert_eq!(header.symbol_count, 5);
    assert_eq!(header.state_count, 4);

    let loaded = LanguageTable::from_bytes(&bytes).unwrap();
    assert_eq!(loaded, table);
}

#[test]
fn too_small() {
    let err = LanguageTable::from_bytes(&[0u8; 32]).unwrap_err();
    assert!(matches!(err, LoadError::FileTooSmall(32)));
}

#[test]
fn invalid_magic() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[0] = b'X';
    let err = LanguageTable::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, LoadError::InvalidMagic));
}

#[test]
fn wrong_version_fails_with_descriptive_error() {
    let mut bytes = sample_table().to_bytes().unwrap();
    bytes[4..8].copy_from_slice(&999u32.to_le_bytes());
    let err = LanguageTable::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedVersion(999)));
    insta::assert_snapshot!(err, @"unsupported table version 999: this engine reads version 1; regenerate the table");
}

#[test]
fn size_mismatch() {
    let mut bytes = sample_table().to_bytes().unwrap();
    let actual = bytes.len();
    bytes.push(0);
    let err = LanguageTable::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err,
        LoadError::SizeMismatch { header, actual: got } if header as usize == actual && got == actual + 1
    ));
}

#[test]
fn corrupted_body_fails_checksum() {
    let mut bytes = sample_table().to_bytes().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    let err = LanguageTable::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, LoadError::ChecksumMismatch { .. }));
}

#[test]
fn dangling_shift_is_rejected() {
    let mut table = sample_table();
    table.action_lists[0] = vec![ParseAction::Shift { state: 42 }];
    let bytes = table.to_bytes().unwrap();
    let err = LanguageTable::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, LoadError::Inconsistent(_)));
}

#[test]
fn unsorted_row_is_rejected() {
    let mut table = sample_table();
    table.states[1].actions.reverse();
    let bytes = table.to_bytes().unwrap();
    let err = LanguageTable::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, LoadError::Inconsistent(_)));
}

#[test]
fn lookups() {
    let table = sample_table();
    assert_eq!(table.actions(0, 2), &[ParseAction::Shift { state: 1 }]);
    assert!(table.actions(0, 3).is_empty());
    assert_eq!(table.goto(0, 4), Some(2));
    assert_eq!(table.goto(1, 4), None);
    assert_eq!(table.expected_terminals(1).collect::<Vec<_>>(), vec![0, 3]);
    assert_eq!(table.symbol_for_name("source", true), Some(4));
    assert_eq!(table.symbol_for_name("source", false), None);
    let tail = table.field_id("tail").unwrap();
    assert_eq!(table.field_name(tail), "tail");
    assert_eq!(table.field_id("head"), None);
}

#[test]
fn garbage_dfa_is_rejected() {
    let err = deserialize_dfa(&[1, 2, 3, 4]).unwrap_err();
    assert!(matches!(err, LoadError::InvalidDfa(_)));
}

#[test]
fn keyword_lookup() {
    let keywords = KeywordTable {
        word: 2,
        keywords: vec![("if".to_owned(), 5), ("module".to_owned(), 6)],
    };
    assert_eq!(keywords.lookup(b"module"), Some(6));
    assert_eq!(keywords.lookup(b"modules"), None);
    assert!(keywords.is_keyword(5));
    assert!(!keywords.is_keyword(2));
}
