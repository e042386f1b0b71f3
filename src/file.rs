//! ACH files: the root of the record tree.
//!
//! A file owns an optional transmission header, the file header, its
//! batches, the file control, and enough pad records to fill the last
//! block. Writing is gated on validation: an invalid file is never written.

use crate::association::HasMany;
use crate::batch::Batch;
use crate::component::{control_fields, Component};
use crate::constants::{BLOCKING_FACTOR, ROWS_DELIMITER};
use crate::error::{AchError, Result};
use crate::layout::FileLayout;
use crate::reader::Reader;
use crate::record::Record;
use crate::validation::{validate_records, Validate, ValidationErrors};
use crate::value::{attributes, Attributes, Value};
use log::{debug, warn};
use std::fs;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::Arc;

fn batch_numbering(count: usize) -> Attributes {
    attributes([("batch_number", count + 1)])
}

/// An ACH file under construction, or one read back from disk.
///
/// # Examples
///
/// ```
/// use ach_builder::File;
///
/// let mut file = File::new([
///     ("company_id", "11-11111"),
///     ("company_name", "MY COMPANY"),
///     ("immediate_dest", "123123123"),
///     ("immediate_origin", "123123123"),
///     ("immediate_dest_name", "COMMERCE BANK"),
///     ("immediate_origin_name", "MYCOMPANY"),
/// ])
/// .unwrap();
///
/// let batch = file
///     .batch([
///         ("entry_class_code", "WEB"),
///         ("company_entry_descr", "TV-TELCOM"),
///         ("effective_date", "110412"),
///         ("desc_date", "APR 12"),
///         ("origin_dfi_id", "00000000"),
///     ])
///     .unwrap();
/// batch
///     .entry([
///         ("customer_name", "JOHN SMITH"),
///         ("amount", "2501"),
///         ("routing_number", "010010101"),
///         ("bank_account", "103030030"),
///     ])
///     .unwrap();
///
/// assert_eq!(file.record_count(), 5);
/// assert_eq!(file.serialize().unwrap().lines().count(), 10);
/// ```
#[derive(Debug)]
pub struct File {
    layout: Arc<FileLayout>,
    attributes: Attributes,
    transmission_header: Option<Record>,
    header: Option<Record>,
    control: Option<Record>,
    batches: HasMany<Batch>,
    errors: ValidationErrors,
}

impl File {
    /// Creates a file of the standard layout.
    pub fn new<I, K, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::with_layout(FileLayout::standard(), values)
    }

    /// Creates a file starting from the layout's default attributes
    /// overlaid with `values`.
    pub fn with_layout<I, K, V>(layout: Arc<FileLayout>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let attributes =
            layout.merge_attributes(layout.default_attributes(), attributes(values), Self::NAME)?;
        let batches = HasMany::declare("batches")
            .with_proc_defaults(batch_numbering)
            .bind(Self::NAME)?;

        Ok(File {
            layout,
            attributes,
            transmission_header: None,
            header: None,
            control: None,
            batches,
            errors: ValidationErrors::new(),
        })
    }

    /// Creates a file and runs `init` on it before returning.
    pub fn build<I, K, V, F>(layout: Arc<FileLayout>, values: I, init: F) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
        F: FnOnce(&mut File) -> Result<()>,
    {
        let mut file = Self::with_layout(layout, values)?;
        init(&mut file)?;
        Ok(file)
    }

    /// Reads a file of the standard layout from `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_with_layout(FileLayout::standard(), path)
    }

    /// Reads a file of the given layout from `path`.
    pub fn read_with_layout(layout: Arc<FileLayout>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading ACH file {}", path.display());
        let input = fs::File::open(path)?;
        Reader::new(layout).read(BufReader::new(input))
    }

    /// The transmission header, built on first access.
    ///
    /// Fails with [`AchError::NoTransmissionHeader`] if the layout declares none.
    pub fn transmission_header(&mut self) -> Result<&mut Record> {
        let schema = self
            .layout
            .transmission_header()
            .cloned()
            .ok_or(AchError::NoTransmissionHeader)?;
        let header = match self.transmission_header.take() {
            Some(header) => header,
            None => {
                let fields = self.fields_for(&schema);
                Record::new(schema, fields)
            }
        };
        Ok(self.transmission_header.insert(header))
    }

    /// Replaces the transmission header with one parsed from `line`.
    pub fn build_transmission_header(&mut self, line: &str) -> Result<&mut Record> {
        let schema = self
            .layout
            .transmission_header()
            .cloned()
            .ok_or(AchError::NoTransmissionHeader)?;
        let header = Record::parse(schema, line)?;
        Ok(self.transmission_header.insert(header))
    }

    /// The file header, built on first access.
    pub fn header(&mut self) -> &mut Record {
        self.header_with(Attributes::new())
    }

    /// The file header; `overrides` apply only when it is first built.
    pub fn header_with(&mut self, overrides: Attributes) -> &mut Record {
        let header = match self.header.take() {
            Some(header) => header,
            None => {
                let schema = self.layout.schemas().file_header.clone();
                let mut fields = self.fields_for(&schema);
                fields.extend(overrides);
                Record::new(schema, fields)
            }
        };
        self.header.insert(header)
    }

    /// Replaces the header with one parsed from `line`.
    pub fn build_header(&mut self, line: &str) -> Result<&mut Record> {
        let header = Record::parse(self.layout.schemas().file_header.clone(), line)?;
        Ok(self.header.insert(header))
    }

    /// The file control, built on first access from the file's aggregates.
    pub fn control(&mut self) -> &mut Record {
        let control = match self.control.take() {
            Some(control) => control,
            None => {
                let schema = self.layout.schemas().file_control.clone();
                let fields = control_fields(&schema, &self.attributes, |field| self.computed(field));
                Record::new(schema, fields)
            }
        };
        self.control.insert(control)
    }

    /// Replaces the control with one parsed from `line`.
    pub fn build_control(&mut self, line: &str) -> Result<&mut Record> {
        let control = Record::parse(self.layout.schemas().file_control.clone(), line)?;
        Ok(self.control.insert(control))
    }

    /// Adds a batch carrying the file's attributes, the next batch number
    /// and `values`, in increasing precedence.
    pub fn batch<I, K, V>(&mut self, values: I) -> Result<&mut Batch>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut fields = self.attributes.clone();
        fields.extend(self.batches.next_defaults());
        fields.extend(attributes(values));
        let batch = Batch::from_attributes(self.layout.clone(), &Attributes::new(), fields)?;
        debug!("Adding batch #{} to file", self.batches.len() + 1);
        Ok(self.batches.push(batch))
    }

    /// Adds a batch like [`File::batch`] and runs `init` on it.
    pub fn batch_with<I, K, V, F>(&mut self, values: I, init: F) -> Result<&mut Batch>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
        F: FnOnce(&mut Batch) -> Result<()>,
    {
        let batch = self.batch(values)?;
        init(&mut *batch)?;
        Ok(batch)
    }

    pub fn batches(&self) -> &[Batch] {
        self.batches.all()
    }

    pub fn batches_mut(&mut self) -> &mut [Batch] {
        self.batches.all_mut()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Entry and addenda records across all batches.
    pub fn file_entry_addenda_count(&self) -> usize {
        self.batches().iter().map(Batch::entry_addenda_count).sum()
    }

    pub fn entry_hash(&self) -> i64 {
        self.batches().iter().map(Batch::entry_hash).fold(0, i64::saturating_add)
    }

    pub fn total_debit_amount(&self) -> i64 {
        self.batches().iter().map(Batch::total_debit_amount).fold(0, i64::saturating_add)
    }

    pub fn total_credit_amount(&self) -> i64 {
        self.batches().iter().map(Batch::total_credit_amount).fold(0, i64::saturating_add)
    }

    /// Records excluding pads and the transmission header.
    pub fn record_count(&self) -> usize {
        2 + 2 * self.batch_count() + self.file_entry_addenda_count()
    }

    pub fn block_count(&self) -> usize {
        self.record_count().div_ceil(BLOCKING_FACTOR)
    }

    /// Pad records needed to fill the last block.
    pub fn tails_count(&self) -> usize {
        self.block_count() * BLOCKING_FACTOR - self.record_count()
    }

    /// Serializes every record, joined by newlines with no trailing newline.
    pub fn serialize(&mut self) -> Result<String> {
        let lines = self
            .records()
            .iter()
            .map(Record::serialize)
            .collect::<Result<Vec<_>>>()?;
        Ok(lines.join(ROWS_DELIMITER))
    }

    /// Writes the file to `sink` if it validates.
    ///
    /// Returns `Ok(false)` without writing anything when validation fails;
    /// the problems are available from [`Validate::errors`].
    pub fn write<W: Write>(&mut self, mut sink: W) -> Result<bool> {
        let Some(content) = self.validated_content()? else {
            return Ok(false);
        };
        sink.write_all(content.as_bytes())?;
        sink.flush()?;
        Ok(true)
    }

    /// Writes the file to `path` if it validates. Nothing is created when
    /// validation or serialization fails.
    pub fn write_to_path(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let Some(content) = self.validated_content()? else {
            return Ok(false);
        };
        fs::write(path, content)?;
        Ok(true)
    }

    fn validated_content(&mut self) -> Result<Option<String>> {
        if !self.valid() {
            warn!(
                "Refusing to write ACH file with {} invalid record(s):\n{}",
                self.errors.len(),
                self.errors
            );
            return Ok(None);
        }
        self.serialize().map(Some)
    }

    fn computed(&self, field: &str) -> Option<Value> {
        match field {
            "batch_count" => Some(Value::from(self.batch_count())),
            "block_count" => Some(Value::from(self.block_count())),
            "file_entry_addenda_count" => Some(Value::from(self.file_entry_addenda_count())),
            "entry_hash" => Some(Value::from(self.entry_hash())),
            "total_debit_amount" => Some(Value::from(self.total_debit_amount())),
            "total_credit_amount" => Some(Value::from(self.total_credit_amount())),
            _ => None,
        }
    }
}

impl Component for File {
    const NAME: &'static str = "File";

    fn layout(&self) -> &Arc<FileLayout> {
        &self.layout
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    fn records(&mut self) -> Vec<Record> {
        let mut records = Vec::with_capacity(self.block_count() * BLOCKING_FACTOR + 1);
        if self.layout.has_transmission_header() {
            if let Ok(header) = self.transmission_header() {
                records.push(header.clone());
            }
        }
        records.push(self.header().clone());
        for batch in self.batches.all_mut() {
            records.extend(batch.records());
        }
        records.push(self.control().clone());

        let tail = Record::new(self.layout.schemas().tail.clone(), Attributes::new());
        records.extend(std::iter::repeat(tail).take(self.tails_count()));
        records
    }
}

impl Validate for File {
    fn valid(&mut self) -> bool {
        let mut records = self.records();
        self.errors = validate_records(&mut records);
        self.errors.is_empty()
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
}
