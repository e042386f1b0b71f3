//! A single fixed-width record: a schema plus field values.

use crate::error::{AchError, Result};
use crate::schema::Schema;
use crate::validation::{Validate, ValidationError, ValidationErrors};
use crate::value::{Attributes, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One record of an ACH file.
///
/// Field values are set through [`Record::set`], which only accepts fields
/// the schema declares. Values supplied at construction are merged over the
/// schema defaults without that check.
///
/// # Examples
///
/// ```
/// use ach_builder::{attributes, Formatter, Record, Schema};
/// use std::sync::Arc;
///
/// let schema = Schema::builder("Test")
///     .fields(["customer_name", "amount"])
///     .default("customer_name", "JOHN SMITH")
///     .build(&Formatter::standard())
///     .unwrap();
/// let record = Record::new(Arc::new(schema), attributes([("amount", 1599)]));
/// assert_eq!(record.serialize().unwrap(), "JOHN SMITH            0000001599");
/// ```
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    fields: HashMap<String, Value>,
    errors: ValidationErrors,
}

impl Record {
    /// Builds a record from the schema defaults overlaid with `values`.
    pub fn new(schema: Arc<Schema>, values: Attributes) -> Self {
        let mut fields: HashMap<String, Value> = schema.default_values().into_iter().collect();
        fields.extend(values);
        Record {
            schema,
            fields,
            errors: ValidationErrors::new(),
        }
    }

    /// Builds a record from a serialized line.
    ///
    /// Fields hold the raw substrings of `line`, padding included, so a
    /// zero-padded amount reads back as `"0000002501"`.
    pub fn parse(schema: Arc<Schema>, line: &str) -> Result<Self> {
        let values = schema
            .split(line)?
            .into_iter()
            .map(|(name, raw)| (name, Value::Text(raw)))
            .collect();
        Ok(Record {
            schema,
            fields: values,
            errors: ValidationErrors::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Record type name, e.g. `"Batch::Header"`.
    pub fn kind(&self) -> &str {
        self.schema.name()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a declared field.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        if !self.schema.has_field(field) {
            return Err(AchError::UnknownField {
                field: field.to_string(),
                record: self.kind().to_string(),
            });
        }
        self.fields.insert(field.to_string(), value.into());
        Ok(self)
    }

    /// Unsets a field, returning its previous value.
    pub fn clear(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Formats every declared field in order.
    ///
    /// Fails with [`AchError::EmptyField`] on the first unset field.
    pub fn serialize(&self) -> Result<String> {
        let mut line = String::with_capacity(self.schema.width());
        for field in self.schema.fields() {
            let value = self
                .fields
                .get(&field.name)
                .ok_or_else(|| AchError::EmptyField {
                    field: field.name.clone(),
                    record: self.kind().to_string(),
                })?;
            line.push_str(&field.rule.format(value));
        }
        Ok(line)
    }
}

impl Validate for Record {
    fn valid(&mut self) -> bool {
        let mut errors = ValidationErrors::new();
        for name in self.schema.field_names() {
            if !self.fields.contains_key(name) {
                errors.insert(name, ValidationError::required());
            }
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())?;
        for name in self.schema.field_names() {
            match self.fields.get(name) {
                Some(value) => write!(f, " {}={:?}", name, value.to_string())?,
                None => write!(f, " {}=<unset>", name)?,
            }
        }
        Ok(())
    }
}
