//! Batches: a header, entries with their addenda, and a control record.

use crate::association::{HasMany, LinkedHasMany};
use crate::component::{control_fields, Component};
use crate::error::Result;
use crate::layout::FileLayout;
use crate::record::Record;
use crate::validation::{validate_records, Validate, ValidationErrors};
use crate::value::{Attributes, Value};
use log::debug;
use std::sync::Arc;

/// Second digits of the transaction codes that denote a credit.
const CREDIT_TRANSACTION_CODE_ENDING_DIGITS: [char; 5] = ['0', '1', '2', '3', '4'];

/// Returns `true` if the entry's transaction code denotes a credit.
///
/// The second character of the transaction code decides: `0`–`4` is a
/// credit, anything else (including a missing code) is a debit.
pub fn is_credit(entry: &Record) -> bool {
    entry
        .get("transaction_code")
        .and_then(|code| code.to_string().chars().nth(1))
        .is_some_and(|digit| CREDIT_TRANSACTION_CODE_ENDING_DIGITS.contains(&digit))
}

/// Returns `true` if the entry is not a credit.
pub fn is_debit(entry: &Record) -> bool {
    !is_credit(entry)
}

/// A group of entries sharing one header/control pair.
///
/// # Examples
///
/// ```
/// use ach_builder::Batch;
///
/// let mut batch = Batch::new([("company_id", "11-11111")]).unwrap();
/// batch.entry([("amount", "2501"), ("routing_number", "010010101")]).unwrap();
/// batch.addenda([("payment_related_info", "foo bar")]).unwrap();
///
/// assert_eq!(batch.entry_addenda_count(), 2);
/// assert_eq!(batch.entry_hash(), 1001010);
/// assert_eq!(batch.total_debit_amount(), 2501);
/// ```
#[derive(Debug)]
pub struct Batch {
    layout: Arc<FileLayout>,
    attributes: Attributes,
    header: Option<Record>,
    control: Option<Record>,
    entries: HasMany<Record>,
    addenda: LinkedHasMany<Record>,
    errors: ValidationErrors,
}

impl Batch {
    /// Creates a batch of the standard layout.
    pub fn new<I, K, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::with_layout(FileLayout::standard(), values)
    }

    /// Creates a standalone batch starting from the layout's default
    /// attributes overlaid with `values`.
    pub fn with_layout<I, K, V>(layout: Arc<FileLayout>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let base = layout.default_attributes().clone();
        Self::from_attributes(layout, &base, crate::value::attributes(values))
    }

    /// Batches added through [`crate::File::batch`] pass an empty `base`:
    /// their `values` already carry the file's attributes.
    pub(crate) fn from_attributes(
        layout: Arc<FileLayout>,
        base: &Attributes,
        values: Attributes,
    ) -> Result<Self> {
        let attributes = layout.merge_attributes(base, values, Self::NAME)?;
        let entries = HasMany::declare("entries").bind(Self::NAME)?;
        let addenda = LinkedHasMany::declare("addenda", "Addenda", "entry").bind(Self::NAME)?;

        Ok(Batch {
            layout,
            attributes,
            header: None,
            control: None,
            entries,
            addenda,
            errors: ValidationErrors::new(),
        })
    }

    /// The batch header, built on first access.
    pub fn header(&mut self) -> &mut Record {
        self.header_with(Attributes::new())
    }

    /// The batch header; `overrides` apply only when it is first built.
    pub fn header_with(&mut self, overrides: Attributes) -> &mut Record {
        let header = match self.header.take() {
            Some(header) => header,
            None => {
                self.before_header();
                let schema = self.layout.schemas().batch_header.clone();
                let mut fields = self.fields_for(&schema);
                fields.extend(overrides);
                Record::new(schema, fields)
            }
        };
        self.header.insert(header)
    }

    /// Replaces the header with one parsed from `line`.
    pub fn build_header(&mut self, line: &str) -> Result<&mut Record> {
        let header = Record::parse(self.layout.schemas().batch_header.clone(), line)?;
        Ok(self.header.insert(header))
    }

    /// The batch control, built on first access from the batch's aggregates.
    pub fn control(&mut self) -> &mut Record {
        let control = match self.control.take() {
            Some(control) => control,
            None => {
                let schema = self.layout.schemas().batch_control.clone();
                let fields = control_fields(&schema, &self.attributes, |field| self.computed(field));
                Record::new(schema, fields)
            }
        };
        self.control.insert(control)
    }

    /// Replaces the control with one parsed from `line`.
    pub fn build_control(&mut self, line: &str) -> Result<&mut Record> {
        let control = Record::parse(self.layout.schemas().batch_control.clone(), line)?;
        Ok(self.control.insert(control))
    }

    /// Adds an entry built from the batch attributes and `values`.
    pub fn entry<I, K, V>(&mut self, values: I) -> Result<&mut Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let schema = self.layout.schemas().entry.clone();
        let mut fields = self.fields_for(&schema);
        fields.extend(crate::value::attributes(values));
        debug!("Adding entry #{} to batch", self.entries.len() + 1);
        Ok(self.entries.push(Record::new(schema, fields)))
    }

    /// Adds an entry parsed from `line`.
    pub fn build_entry(&mut self, line: &str) -> Result<&mut Record> {
        let entry = Record::parse(self.layout.schemas().entry.clone(), line)?;
        Ok(self.entries.push(entry))
    }

    pub fn entries(&self) -> &[Record] {
        self.entries.all()
    }

    pub fn entries_mut(&mut self) -> &mut [Record] {
        self.entries.all_mut()
    }

    /// Adds an addenda record attached to the latest entry.
    ///
    /// Fails with [`crate::AchError::NoLink`] if the batch has no entries.
    pub fn addenda<I, K, V>(&mut self, values: I) -> Result<&mut Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let schema = self.layout.schemas().addenda.clone();
        let mut fields = self.fields_for(&schema);
        fields.extend(crate::value::attributes(values));
        self.addenda.push(self.entries.len(), Record::new(schema, fields))
    }

    /// Adds an addenda record parsed from `line`, attached to the latest entry.
    pub fn build_addenda(&mut self, line: &str) -> Result<&mut Record> {
        let addenda = Record::parse(self.layout.schemas().addenda.clone(), line)?;
        self.addenda.push(self.entries.len(), addenda)
    }

    /// Addenda attached to the entry at `entry_index`.
    pub fn addenda_for(&self, entry_index: usize) -> &[Record] {
        self.addenda.linked_to(entry_index)
    }

    /// Every addenda record, grouped by entry.
    pub fn all_addenda(&self) -> &LinkedHasMany<Record> {
        &self.addenda
    }

    pub fn has_credit(&self) -> bool {
        self.entries().iter().any(is_credit)
    }

    pub fn has_debit(&self) -> bool {
        self.entries().iter().any(is_debit)
    }

    /// Number of entry and addenda records.
    pub fn entry_addenda_count(&self) -> usize {
        self.entries.len() + self.addenda.len()
    }

    /// Sum of the entries' routing numbers divided by ten (remainder dropped).
    ///
    /// Sums saturate at `i64::MAX`; the control field keeps its rightmost digits.
    pub fn entry_hash(&self) -> i64 {
        self.entries()
            .iter()
            .map(|entry| entry.get("routing_number").map_or(0, Value::to_i) / 10)
            .fold(0, i64::saturating_add)
    }

    /// Sum of the amounts of all debit entries.
    pub fn total_debit_amount(&self) -> i64 {
        self.amount_sum_for(is_debit)
    }

    /// Sum of the amounts of all credit entries.
    pub fn total_credit_amount(&self) -> i64 {
        self.amount_sum_for(is_credit)
    }

    /// The `service_class_code` attribute, or the code implied by the
    /// entries: 200 mixed, 225 debits only, 220 otherwise.
    pub fn service_class_code(&self) -> Value {
        if let Some(code) = self.attributes.get("service_class_code") {
            return code.clone();
        }
        let code = match (self.has_debit(), self.has_credit()) {
            (true, true) => 200,
            (true, false) => 225,
            _ => 220,
        };
        Value::from(code)
    }

    fn amount_sum_for(&self, matches: fn(&Record) -> bool) -> i64 {
        self.entries()
            .iter()
            .filter(|entry| matches(entry))
            .map(|entry| entry.get("amount").map_or(0, Value::to_i))
            .fold(0, i64::saturating_add)
    }

    fn before_header(&mut self) {
        if !self.attributes.contains_key("service_class_code") {
            let code = self.service_class_code();
            self.attributes.insert("service_class_code".to_string(), code);
        }
    }

    fn computed(&self, field: &str) -> Option<Value> {
        match field {
            "service_class_code" => Some(self.service_class_code()),
            "entry_addenda_count" => Some(Value::from(self.entry_addenda_count())),
            "entry_hash" => Some(Value::from(self.entry_hash())),
            "total_debit_amount" => Some(Value::from(self.total_debit_amount())),
            "total_credit_amount" => Some(Value::from(self.total_credit_amount())),
            _ => None,
        }
    }
}

impl Component for Batch {
    const NAME: &'static str = "Batch";

    fn layout(&self) -> &Arc<FileLayout> {
        &self.layout
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Header, each entry followed by its addenda, then control.
    fn records(&mut self) -> Vec<Record> {
        let mut records = Vec::with_capacity(self.entry_addenda_count() + 2);
        records.push(self.header().clone());
        for (index, entry) in self.entries().iter().enumerate() {
            records.push(entry.clone());
            records.extend(self.addenda_for(index).iter().cloned());
        }
        records.push(self.control().clone());
        records
    }
}

impl Validate for Batch {
    fn valid(&mut self) -> bool {
        let mut records = self.records();
        self.errors = validate_records(&mut records);
        self.errors.is_empty()
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RECORD_SIZE;
    use crate::error::AchError;

    fn empty_batch() -> Batch {
        Batch::new(Attributes::new()).unwrap()
    }

    fn complete_batch() -> Batch {
        let mut batch = Batch::new([
            ("company_id", "11-11111"),
            ("company_name", "MY COMPANY"),
            ("entry_class_code", "WEB"),
            ("company_entry_descr", "TV-TELCOM"),
            ("effective_date", "110412"),
            ("desc_date", "APR 12"),
            ("origin_dfi_id", "00000000"),
            ("batch_number", "1"),
        ])
        .unwrap();
        batch
            .entry([
                ("customer_name", "JOHN SMITH"),
                ("customer_acct", "61242882282"),
                ("amount", "2501"),
                ("routing_number", "010010101"),
                ("bank_account", "103030030"),
            ])
            .unwrap();
        batch
    }

    #[test]
    fn test_entry_created_with_attributes() {
        let mut batch = empty_batch();
        let entry = batch.entry([("amount", 100)]).unwrap();
        assert_eq!(entry.kind(), "Entry");
        assert_eq!(entry.get("amount"), Some(&Value::from(100)));
    }

    #[test]
    fn test_entry_inherits_batch_attributes() {
        let mut batch = Batch::new([("customer_name", "PETER PARKER")]).unwrap();
        let entry = batch.entry([("amount", 100)]).unwrap();
        assert_eq!(entry.get("customer_name"), Some(&Value::from("PETER PARKER")));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let err = Batch::new([("foo", "bar")]).unwrap_err();
        assert!(matches!(err, AchError::UnknownAttribute { component: "Batch", .. }));
    }

    #[test]
    fn test_addenda_without_entry_fails() {
        let mut batch = empty_batch();
        let err = batch
            .addenda([("payment_related_info", "foo bar")])
            .unwrap_err();
        assert!(matches!(err, AchError::NoLink { .. }));
    }

    #[test]
    fn test_addenda_follow_their_entries() {
        let mut batch = empty_batch();
        for i in 0..3 {
            batch.entry([("amount", 100)]).unwrap();
            for _ in 0..i {
                batch.addenda([("payment_related_info", "foo bar")]).unwrap();
            }
        }

        let records = batch.records();
        let kinds: Vec<&str> = records[1..records.len() - 1]
            .iter()
            .map(|r| r.kind())
            .collect();
        assert_eq!(
            kinds,
            vec!["Entry", "Entry", "Addenda", "Entry", "Addenda", "Addenda"]
        );
        assert_eq!(batch.addenda_for(2).len(), 2);
    }

    #[test]
    fn test_empty_batch_has_neither_credit_nor_debit() {
        let batch = empty_batch();
        assert!(!batch.has_credit());
        assert!(!batch.has_debit());
    }

    #[test]
    fn test_credit_and_debit_classification() {
        let mut batch = empty_batch();
        batch.entry([("amount", 100), ("transaction_code", 21)]).unwrap();
        assert!(batch.has_credit());
        assert!(!batch.has_debit());

        batch.entry([("amount", 100)]).unwrap();
        assert!(batch.has_debit());
    }

    #[test]
    fn test_service_class_code_debit_only() {
        let mut batch = empty_batch();
        batch.entry([("amount", 100)]).unwrap();
        assert_eq!(batch.header().get("service_class_code"), Some(&Value::from(225)));
    }

    #[test]
    fn test_service_class_code_credit_only() {
        let mut batch = empty_batch();
        batch.entry([("amount", 100), ("transaction_code", 21)]).unwrap();
        assert_eq!(batch.header().get("service_class_code"), Some(&Value::from(220)));
    }

    #[test]
    fn test_service_class_code_mixed() {
        let mut batch = empty_batch();
        batch.entry([("amount", 100)]).unwrap();
        batch.entry([("amount", 100), ("transaction_code", 21)]).unwrap();
        assert_eq!(batch.header().get("service_class_code"), Some(&Value::from(200)));
    }

    #[test]
    fn test_service_class_code_empty_batch() {
        let mut batch = empty_batch();
        assert_eq!(batch.header().get("service_class_code"), Some(&Value::from(220)));
    }

    #[test]
    fn test_explicit_service_class_code_kept() {
        let mut batch = Batch::new([("service_class_code", 200)]).unwrap();
        batch.entry([("amount", 100)]).unwrap();
        assert_eq!(batch.header().get("service_class_code"), Some(&Value::from(200)));
        assert_eq!(batch.control().get("service_class_code"), Some(&Value::from(200)));
    }

    #[test]
    fn test_standalone_batch_takes_layout_defaults() {
        let layout = FileLayout::builder()
            .default_attribute("company_name", "MY COMPANY")
            .unwrap()
            .build()
            .unwrap();
        let mut batch = Batch::with_layout(layout.clone(), [("company_id", "11-11111")]).unwrap();
        assert_eq!(batch.header().get("company_name"), Some(&Value::from("MY COMPANY")));

        let mut overridden = Batch::with_layout(layout, [("company_name", "OTHER CO")]).unwrap();
        assert_eq!(overridden.header().get("company_name"), Some(&Value::from("OTHER CO")));
    }

    #[test]
    fn test_totals_saturate_on_overwide_amounts() {
        let mut batch = empty_batch();
        batch.entry([("amount", "99999999999999999999")]).unwrap();
        batch.entry([("amount", "99999999999999999999")]).unwrap();
        batch.entry([("amount", i64::MAX), ("transaction_code", 22)]).unwrap();
        batch.entry([("amount", i64::MAX), ("transaction_code", 22)]).unwrap();
        batch.entry([("routing_number", "99999999999999999999")]).unwrap();

        assert_eq!(batch.total_debit_amount(), i64::MAX);
        assert_eq!(batch.total_credit_amount(), i64::MAX);
        assert_eq!(batch.entry_hash(), i64::MAX / 10);
        assert_eq!(
            batch.control().get("total_debit_amount"),
            Some(&Value::from(i64::MAX))
        );
    }

    #[test]
    fn test_entry_hash_truncates() {
        let mut batch = empty_batch();
        batch.entry([("routing_number", "010010101")]).unwrap();
        assert_eq!(batch.entry_hash(), 1001010);

        batch.entry([("routing_number", "021000021")]).unwrap();
        assert_eq!(batch.entry_hash(), 1001010 + 2100002);
    }

    #[test]
    fn test_totals() {
        let mut batch = empty_batch();
        batch.entry([("amount", "2501")]).unwrap();
        batch.entry([("amount", "100"), ("transaction_code", "22")]).unwrap();
        batch.entry([("amount", "0000000050"), ("transaction_code", "27")]).unwrap();

        assert_eq!(batch.total_debit_amount(), 2551);
        assert_eq!(batch.total_credit_amount(), 100);
    }

    #[test]
    fn test_control_takes_aggregates() {
        let mut batch = complete_batch();
        batch.addenda([("payment_related_info", "foo bar")]).unwrap();
        let control = batch.control();
        assert_eq!(control.get("entry_addenda_count"), Some(&Value::from(2)));
        assert_eq!(control.get("entry_hash"), Some(&Value::from(1001010)));
        assert_eq!(control.get("total_debit_amount"), Some(&Value::from(2501)));
        assert_eq!(control.get("total_credit_amount"), Some(&Value::from(0)));
        assert_eq!(control.get("company_id"), Some(&Value::from("11-11111")));
    }

    #[test]
    fn test_header_and_control_are_94_wide() {
        let mut batch = complete_batch();
        assert_eq!(batch.header().serialize().unwrap().len(), RECORD_SIZE);
        assert_eq!(batch.control().serialize().unwrap().len(), RECORD_SIZE);
    }

    #[test]
    fn test_header_is_memoized() {
        let mut batch = complete_batch();
        batch.header().set("company_name", "OTHER").unwrap();
        assert_eq!(batch.header().get("company_name"), Some(&Value::from("OTHER")));
    }

    #[test]
    fn test_validation_reports_missing_header_fields() {
        let mut batch = empty_batch();
        batch.entry([("amount", 100)]).unwrap();
        assert!(!batch.valid());
        assert!(batch.errors().get("Batch::Header#1").is_some());
        assert!(batch.errors().get("Entry#1").is_some());

        let mut complete = complete_batch();
        assert!(complete.valid());
    }
}
