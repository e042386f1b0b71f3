//! Error types for building, writing and reading ACH files.

use thiserror::Error;

/// Result type alias for ACH operations
pub type Result<T> = std::result::Result<T, AchError>;

/// Errors that can occur while defining layouts, building records or reading files.
///
/// Validation problems (missing required fields) are not errors: they are
/// collected into [`crate::ValidationErrors`] instead.
#[derive(Error, Debug)]
pub enum AchError {
    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write the CSV summary
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Rule descriptor does not match `(<-|->)width[-][|transform]`
    #[error("Malformed rule descriptor '{descriptor}'")]
    MalformedRule { descriptor: String },

    /// Rule descriptor names a transform that is not registered
    #[error("Unknown transform '{transform}' in rule descriptor '{descriptor}'")]
    UnknownTransform {
        transform: String,
        descriptor: String,
    },

    /// Line length differs from the sum of the record's field widths
    #[error("Line of {actual} characters does not match {record} width of {expected}")]
    LineLengthMismatch {
        record: String,
        expected: usize,
        actual: usize,
    },

    /// Field has no registered rule, or is not declared by the record
    #[error("Unrecognized field '{field}' in {record}")]
    UnknownField { field: String, record: String },

    /// Field left unset when serializing
    #[error("Empty field '{field}' for {record}")]
    EmptyField { field: String, record: String },

    /// Dynamic field redeclared with a new rule
    #[error("Rule {field} has already been defined")]
    DuplicateFormat { field: String },

    /// Dynamic field declared for the first time without a rule
    #[error("Unknown field {field} should be supplied by format")]
    UndefinedFormat { field: String },

    /// Layout declared a second transmission header
    #[error("TransmissionHeader record may be defined only once")]
    RedefinedTransmissionHeader,

    /// Transmission header declared without fields
    #[error("TransmissionHeader should declare its fields")]
    EmptyTransmissionHeader,

    /// Transmission header requested from a layout that has none
    #[error("No TransmissionHeader is declared for this file layout")]
    NoTransmissionHeader,

    /// Attribute name has no registered rule
    #[error("Unrecognized attribute '{attribute}' for {component}")]
    UnknownAttribute {
        attribute: String,
        component: &'static str,
    },

    /// Collection already bound to another owner
    #[error("Association {name} has already been assigned to {owner}")]
    DoubleAssignment { name: &'static str, owner: String },

    /// Linked record added before any record it could attach to
    #[error("No {link} was found to attach a new {record}")]
    NoLink {
        link: &'static str,
        record: &'static str,
    },

    /// Batch-level line found before any batch header
    #[error("Line {line}: record type '{record_type}' found outside of a batch")]
    OrphanRecord { line: usize, record_type: char },

    /// Required record absent from the input
    #[error("Missing {0} record")]
    MissingRecord(&'static str),

    /// Write refused because the file does not validate
    #[error("File failed validation with {count} invalid record(s)")]
    ValidationFailed { count: usize },

    /// Missing input file argument
    #[error("Missing input file argument. Usage: ach-builder <input.ach> [output.ach]")]
    MissingArgument,
}
