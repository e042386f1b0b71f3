//! Constants of the NACHA file format.

/// Width of every standard record, in characters.
pub const RECORD_SIZE: usize = 94;

/// The record count of a file (transmission header excluded) must be a
/// multiple of this number; the remainder is filled with pad records.
pub const BLOCKING_FACTOR: usize = 10;

/// Always 1.
pub const FORMAT_CODE: i64 = 1;

/// Delimiter between records.
pub const ROWS_DELIMITER: &str = "\n";

pub const FILE_HEADER_RECORD_TYPE: char = '1';
pub const BATCH_HEADER_RECORD_TYPE: char = '5';
pub const BATCH_ENTRY_RECORD_TYPE: char = '6';
pub const BATCH_ADDENDA_RECORD_TYPE: char = '7';
pub const BATCH_CONTROL_RECORD_TYPE: char = '8';
pub const FILE_CONTROL_RECORD_TYPE: char = '9';
