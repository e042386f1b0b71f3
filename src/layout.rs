//! File layouts: the blueprint shared by every file of one type.
//!
//! A layout carries the rule registry, the default attributes copied into
//! every new file, the compiled standard record schemas and, optionally, a
//! caller-defined transmission header that precedes the file header.

use crate::constants::{
    BATCH_ADDENDA_RECORD_TYPE, BATCH_CONTROL_RECORD_TYPE, BATCH_ENTRY_RECORD_TYPE,
    BATCH_HEADER_RECORD_TYPE, BLOCKING_FACTOR, FILE_CONTROL_RECORD_TYPE,
    FILE_HEADER_RECORD_TYPE, FORMAT_CODE, RECORD_SIZE,
};
use crate::error::{AchError, Result};
use crate::formatter::Formatter;
use crate::schema::{DynamicSchema, Schema};
use crate::value::{Attributes, Value};
use chrono::Local;
use std::sync::{Arc, OnceLock};

fn current_date() -> Value {
    Value::from(Local::now().format("%y%m%d").to_string())
}

fn current_time() -> Value {
    Value::from(Local::now().format("%H%M").to_string())
}

fn record_type(code: char) -> Value {
    Value::from(code.to_string())
}

/// Compiled schemas of the standard NACHA records.
#[derive(Debug, Clone)]
pub struct Schemas {
    pub file_header: Arc<Schema>,
    pub file_control: Arc<Schema>,
    pub batch_header: Arc<Schema>,
    pub batch_control: Arc<Schema>,
    pub entry: Arc<Schema>,
    pub addenda: Arc<Schema>,
    pub tail: Arc<Schema>,
}

impl Schemas {
    fn compile(formatter: &Formatter) -> Result<Self> {
        let file_header = Schema::builder("File::Header")
            .fields([
                "record_type",
                "priority_code",
                "immediate_dest",
                "immediate_origin",
                "date",
                "time",
                "file_id_modifier",
                "record_size",
                "blocking_factor",
                "format_code",
                "immediate_dest_name",
                "immediate_origin_name",
                "reference_code",
            ])
            .default("record_type", record_type(FILE_HEADER_RECORD_TYPE))
            .default("priority_code", 1)
            .deferred("date", current_date)
            .deferred("time", current_time)
            .default("file_id_modifier", "A")
            .default("record_size", RECORD_SIZE)
            .default("blocking_factor", BLOCKING_FACTOR)
            .default("format_code", FORMAT_CODE)
            .default("reference_code", "")
            .build(formatter)?;

        let file_control = Schema::builder("File::Control")
            .fields([
                "record_type",
                "batch_count",
                "block_count",
                "file_entry_addenda_count",
                "entry_hash",
                "total_debit_amount",
                "total_credit_amount",
                "bank_39",
            ])
            .default("record_type", record_type(FILE_CONTROL_RECORD_TYPE))
            .default("bank_39", "")
            .build(formatter)?;

        let batch_header = Schema::builder("Batch::Header")
            .fields([
                "record_type",
                "service_class_code",
                "company_name",
                "company_note_data",
                "company_id",
                "entry_class_code",
                "company_entry_descr",
                "desc_date",
                "effective_date",
                "settlement_date",
                "origin_status_code",
                "origin_dfi_id",
                "batch_number",
            ])
            .default("record_type", record_type(BATCH_HEADER_RECORD_TYPE))
            .default("service_class_code", 200)
            .default("company_note_data", "")
            .default("settlement_date", "")
            .default("origin_status_code", 1)
            .build(formatter)?;

        let batch_control = Schema::builder("Batch::Control")
            .fields([
                "record_type",
                "service_class_code",
                "entry_addenda_count",
                "entry_hash",
                "total_debit_amount",
                "total_credit_amount",
                "company_id",
                "authen_code",
                "bank_6",
                "origin_dfi_id",
                "batch_number",
            ])
            .default("record_type", record_type(BATCH_CONTROL_RECORD_TYPE))
            .default("authen_code", "")
            .default("bank_6", "")
            .build(formatter)?;

        let entry = Schema::builder("Entry")
            .fields([
                "record_type",
                "transaction_code",
                "routing_number",
                "bank_account",
                "amount",
                "customer_acct",
                "customer_name",
                "transaction_type",
                "addenda",
                "bank_15",
            ])
            .default("record_type", record_type(BATCH_ENTRY_RECORD_TYPE))
            .default("transaction_code", 27)
            .default("transaction_type", "S")
            .default("customer_acct", "")
            .default("addenda", 0)
            .default("bank_15", "")
            .build(formatter)?;

        let addenda = Schema::builder("Addenda")
            .fields([
                "record_type",
                "addenda_type_code",
                "payment_related_info",
                "addenda_sequence_num",
                "entry_details_sequence_num",
            ])
            .default("record_type", record_type(BATCH_ADDENDA_RECORD_TYPE))
            .default("addenda_type_code", 5)
            .build(formatter)?;

        let tail = Schema::builder("Tail")
            .fields(["nines"])
            .default("nines", "9".repeat(RECORD_SIZE))
            .build(formatter)?;

        Ok(Schemas {
            file_header: Arc::new(file_header),
            file_control: Arc::new(file_control),
            batch_header: Arc::new(batch_header),
            batch_control: Arc::new(batch_control),
            entry: Arc::new(entry),
            addenda: Arc::new(addenda),
            tail: Arc::new(tail),
        })
    }
}

/// The blueprint of one kind of ACH file.
///
/// # Examples
///
/// ```
/// use ach_builder::{File, FileLayout};
///
/// let layout = FileLayout::builder()
///     .transmission_header(|header| {
///         header.field("starting", Some("->1"), Some("<".into()))?;
///         header.field("receiver_name", Some("<-10"), None)?;
///         header.field("ending", Some("->1"), Some(">".into()))?;
///         Ok(())
///     })
///     .unwrap()
///     .default_attribute("immediate_dest_name", "COMMERCE BANK")
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let mut file = File::with_layout(layout, [("receiver_name", "MY BANK")]).unwrap();
/// let header = file.transmission_header().unwrap();
/// assert_eq!(header.serialize().unwrap(), "<MY BANK   >");
/// ```
#[derive(Debug)]
pub struct FileLayout {
    formatter: Formatter,
    default_attributes: Attributes,
    schemas: Schemas,
    transmission_header: Option<Arc<Schema>>,
}

impl FileLayout {
    /// The plain NACHA layout: standard rules, no defaults, no transmission header.
    ///
    /// Compiled once and shared.
    pub fn standard() -> Arc<Self> {
        static STANDARD: OnceLock<Arc<FileLayout>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                // Safety: the standard schemas only reference rules of the standard registry
                FileLayoutBuilder::new()
                    .build()
                    .expect("standard layout compiles")
            })
            .clone()
    }

    pub fn builder() -> FileLayoutBuilder {
        FileLayoutBuilder::new()
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Attributes every new file starts with.
    pub fn default_attributes(&self) -> &Attributes {
        &self.default_attributes
    }

    pub fn schemas(&self) -> &Schemas {
        &self.schemas
    }

    pub fn transmission_header(&self) -> Option<&Arc<Schema>> {
        self.transmission_header.as_ref()
    }

    pub fn has_transmission_header(&self) -> bool {
        self.transmission_header.is_some()
    }

    /// Merges the layout defaults with `fields`, rejecting any name that has
    /// no rule in this layout's registry.
    pub(crate) fn merge_attributes(
        &self,
        base: &Attributes,
        fields: Attributes,
        component: &'static str,
    ) -> Result<Attributes> {
        let mut merged = base.clone();
        for (name, value) in fields {
            self.check_attribute(&name, component)?;
            merged.insert(name, value);
        }
        Ok(merged)
    }

    pub(crate) fn check_attribute(&self, name: &str, component: &'static str) -> Result<()> {
        if self.formatter.is_defined(name) {
            Ok(())
        } else {
            Err(AchError::UnknownAttribute {
                attribute: name.to_string(),
                component,
            })
        }
    }
}

/// Accumulates the configuration of a [`FileLayout`].
#[derive(Debug, Clone)]
pub struct FileLayoutBuilder {
    formatter: Formatter,
    default_attributes: Attributes,
    transmission_header: Option<Schema>,
}

impl FileLayoutBuilder {
    pub fn new() -> Self {
        FileLayoutBuilder {
            formatter: Formatter::standard(),
            default_attributes: Attributes::new(),
            transmission_header: None,
        }
    }

    /// Registers an additional rule, making `field` a valid attribute name.
    pub fn rule(mut self, field: &str, descriptor: &str) -> Result<Self> {
        self.formatter.define(field, descriptor)?;
        Ok(self)
    }

    /// Sets an attribute every file of this layout starts with.
    ///
    /// Defaults cascade: a file passes them to its batches, and each record
    /// picks up the ones naming its own fields.
    pub fn default_attribute(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        if !self.formatter.is_defined(name) {
            return Err(AchError::UnknownAttribute {
                attribute: name.to_string(),
                component: "FileLayout",
            });
        }
        self.default_attributes.insert(name.to_string(), value.into());
        Ok(self)
    }

    /// Declares the transmission header record.
    ///
    /// May be called once per layout and must declare at least one field.
    pub fn transmission_header<F>(mut self, define: F) -> Result<Self>
    where
        F: FnOnce(&mut DynamicSchema<'_>) -> Result<()>,
    {
        if self.transmission_header.is_some() {
            return Err(AchError::RedefinedTransmissionHeader);
        }

        let mut dynamic = DynamicSchema::new("TransmissionHeader", &mut self.formatter);
        define(&mut dynamic)?;
        if dynamic.is_empty() {
            return Err(AchError::EmptyTransmissionHeader);
        }
        let schema = dynamic.seal();
        self.transmission_header = Some(schema);
        Ok(self)
    }

    pub fn build(self) -> Result<Arc<FileLayout>> {
        let schemas = Schemas::compile(&self.formatter)?;
        Ok(Arc::new(FileLayout {
            formatter: self.formatter,
            default_attributes: self.default_attributes,
            schemas,
            transmission_header: self.transmission_header.map(Arc::new),
        }))
    }
}

impl Default for FileLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_records_are_94_wide() {
        let layout = FileLayout::standard();
        let schemas = layout.schemas();
        for schema in [
            &schemas.file_header,
            &schemas.file_control,
            &schemas.batch_header,
            &schemas.batch_control,
            &schemas.entry,
            &schemas.addenda,
            &schemas.tail,
        ] {
            assert_eq!(schema.width(), RECORD_SIZE, "{}", schema.name());
        }
    }

    #[test]
    fn test_standard_layout_is_shared() {
        assert!(Arc::ptr_eq(&FileLayout::standard(), &FileLayout::standard()));
    }

    #[test]
    fn test_default_attribute_must_have_rule() {
        let err = FileLayout::builder()
            .default_attribute("foo", "bar")
            .unwrap_err();
        assert!(matches!(err, AchError::UnknownAttribute { .. }));
    }

    #[test]
    fn test_transmission_header_declared_once() {
        let err = FileLayout::builder()
            .transmission_header(|h| {
                h.field("application_id", Some("->8"), None)?;
                Ok(())
            })
            .unwrap()
            .transmission_header(|h| {
                h.field("remote_id", Some("<-8-"), None)?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, AchError::RedefinedTransmissionHeader));
    }

    #[test]
    fn test_empty_transmission_header() {
        let err = FileLayout::builder()
            .transmission_header(|_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, AchError::EmptyTransmissionHeader));
    }

    #[test]
    fn test_has_transmission_header() {
        assert!(!FileLayout::standard().has_transmission_header());

        let layout = FileLayout::builder()
            .transmission_header(|h| {
                h.field("application_id", Some("->8"), None)?;
                Ok(())
            })
            .unwrap()
            .build()
            .unwrap();
        assert!(layout.has_transmission_header());
        assert!(layout.formatter().is_defined("application_id"));
    }
}
