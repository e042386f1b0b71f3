//! Reading ACH files from `tests/data/`.

use ach_builder::{AchError, File, FileLayout, Reader, Validate, Value};
use std::fs;

fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

#[test]
fn test_read_sample_structure() {
    let file = File::read(test_data_path("sample.ach")).unwrap();

    assert_eq!(file.batch_count(), 2);
    assert_eq!(file.file_entry_addenda_count(), 3);
    assert_eq!(file.record_count(), 9);
    assert_eq!(file.tails_count(), 1);

    let first = &file.batches()[0];
    assert_eq!(first.entries().len(), 1);
    assert_eq!(first.addenda_for(0).len(), 1);
    assert_eq!(
        first.addenda_for(0)[0].get("payment_related_info").map(Value::to_string),
        Some(format!("{:<80}", "foo bar"))
    );

    let second = &file.batches()[1];
    assert!(second.addenda_for(0).is_empty());
    assert!(second.has_credit());
    assert!(!second.has_debit());
}

#[test]
fn test_read_sample_aggregates() {
    let file = File::read(test_data_path("sample.ach")).unwrap();

    assert_eq!(file.entry_hash(), 3101012);
    assert_eq!(file.total_debit_amount(), 2501);
    assert_eq!(file.total_credit_amount(), 10000);
}

#[test]
fn test_read_sample_is_valid_and_identical() {
    let input = fs::read_to_string(test_data_path("sample.ach")).unwrap();
    let mut file = File::read(test_data_path("sample.ach")).unwrap();

    assert!(file.valid());
    assert_eq!(file.serialize().unwrap(), input);
}

#[test]
fn test_parsed_control_is_kept() {
    let mut file = File::read(test_data_path("sample.ach")).unwrap();
    let control = file.batches_mut()[0].control();
    assert_eq!(control.get("entry_hash"), Some(&Value::from("0001001010")));
}

#[test]
fn test_read_from_string() {
    let input = fs::read_to_string(test_data_path("sample.ach")).unwrap();
    let file = Reader::new(FileLayout::standard()).read_str(&input).unwrap();
    assert_eq!(file.batch_count(), 2);
}

#[test]
fn test_trailing_newline_ignored() {
    let mut input = fs::read_to_string(test_data_path("sample.ach")).unwrap();
    input.push('\n');
    let file = Reader::default().read_str(&input).unwrap();
    assert_eq!(file.batch_count(), 2);
}

#[test]
fn test_orphan_entry() {
    let err = File::read(test_data_path("orphan_entry.ach")).unwrap_err();
    assert!(matches!(
        err,
        AchError::OrphanRecord {
            line: 2,
            record_type: '6'
        }
    ));
}

#[test]
fn test_missing_file_control() {
    let err = File::read(test_data_path("missing_control.ach")).unwrap_err();
    assert!(matches!(err, AchError::MissingRecord("File::Control")));
}

#[test]
fn test_missing_file() {
    let err = File::read(test_data_path("nonexistent.ach")).unwrap_err();
    assert!(matches!(err, AchError::Io(_)));
}
