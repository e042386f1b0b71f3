//! Presence validation for records and components.
//!
//! Validation never fails with an error: problems are collected into a
//! [`ValidationErrors`] tree. For a record the tree maps field names to
//! `"is required"`; for a component it maps `"<RecordType>#<n>"` (1-based per
//! record type) to the errors of each invalid record.

use crate::record::Record;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

const REQUIRED: &str = "is required";

/// A single node of the error tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Message(String),
    Nested(ValidationErrors),
}

impl ValidationError {
    /// The error recorded for a missing required field.
    pub fn required() -> Self {
        ValidationError::Message(REQUIRED.to_string())
    }
}

/// Errors keyed by field name or record occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, error: ValidationError) {
        self.0.insert(key.into(), error);
    }

    pub fn get(&self, key: &str) -> Option<&ValidationError> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries at this level.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValidationError)> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_level(
            f: &mut fmt::Formatter<'_>,
            errors: &ValidationErrors,
            prefix: &str,
        ) -> fmt::Result {
            for (key, error) in errors.iter() {
                match error {
                    ValidationError::Message(message) => {
                        writeln!(f, "{}{} {}", prefix, key, message)?
                    }
                    ValidationError::Nested(nested) => {
                        write_level(f, nested, &format!("{}{}: ", prefix, key))?
                    }
                }
            }
            Ok(())
        }
        write_level(f, self, "")
    }
}

/// Types that can check themselves for missing required fields.
pub trait Validate {
    /// Clears previous errors, re-validates, and returns `true` if nothing
    /// was found.
    fn valid(&mut self) -> bool;

    /// Errors found by the last call to [`Validate::valid`].
    fn errors(&self) -> &ValidationErrors;
}

/// Validates a flattened record sequence, keying each invalid record by its
/// type name and 1-based occurrence among records of that type.
pub(crate) fn validate_records(records: &mut [Record]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in records.iter_mut() {
        let count = counts.entry(record.kind().to_string()).or_insert(0);
        *count += 1;
        if !record.valid() {
            errors.insert(
                format!("{}#{}", record.kind(), count),
                ValidationError::Nested(record.errors().clone()),
            );
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::Formatter;
    use crate::schema::Schema;
    use crate::value::{attributes, Attributes};
    use std::sync::Arc;

    #[test]
    fn test_records_keyed_by_type_and_occurrence() {
        let schema = Arc::new(
            Schema::builder("Entry")
                .fields(["amount"])
                .build(&Formatter::standard())
                .unwrap(),
        );
        let mut records = vec![
            Record::new(schema.clone(), attributes([("amount", 1)])),
            Record::new(schema.clone(), Attributes::new()),
        ];

        let errors = validate_records(&mut records);
        assert_eq!(errors.len(), 1);
        let nested = match errors.get("Entry#2") {
            Some(ValidationError::Nested(nested)) => nested,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(nested.get("amount"), Some(&ValidationError::required()));
    }

    #[test]
    fn test_display_flattens_tree() {
        let mut inner = ValidationErrors::new();
        inner.insert("amount", ValidationError::required());
        let mut outer = ValidationErrors::new();
        outer.insert("Entry#1", ValidationError::Nested(inner));
        assert_eq!(outer.to_string(), "Entry#1: amount is required\n");
    }
}
