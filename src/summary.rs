//! Per-batch CSV summary of an ACH file.

use crate::batch::Batch;
use crate::error::Result;
use crate::file::File;
use crate::value::Value;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Amounts are stored in cents; the summary reports dollars.
const CENTS_SCALE: u32 = 2;

fn dollars(cents: i64) -> Decimal {
    Decimal::new(cents, CENTS_SCALE)
}

/// One summary row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub batch_number: i64,
    pub service_class_code: i64,
    pub entry_class_code: String,
    pub entries: usize,
    pub addenda: usize,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

impl BatchSummary {
    fn from_batch(batch: &mut Batch) -> Self {
        let entries = batch.entries().len();
        let addenda = batch.entry_addenda_count() - entries;
        let total_debit = dollars(batch.total_debit_amount());
        let total_credit = dollars(batch.total_credit_amount());

        let header = batch.header();
        let field = |name: &str| header.get(name).cloned().unwrap_or(Value::Number(0));

        BatchSummary {
            batch_number: field("batch_number").to_i(),
            service_class_code: field("service_class_code").to_i(),
            entry_class_code: field("entry_class_code").to_string().trim().to_string(),
            entries,
            addenda,
            total_debit,
            total_credit,
        }
    }
}

/// Summary of every batch of a file.
///
/// # Examples
///
/// ```
/// use ach_builder::{File, FileSummary};
///
/// let mut file = File::new([("entry_class_code", "PPD")]).unwrap();
/// file.batch([("service_class_code", 225)])
///     .unwrap()
///     .entry([("amount", 2501)])
///     .unwrap();
///
/// let mut out = Vec::new();
/// FileSummary::from_file(&mut file).write_csv(&mut out).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "batch_number,service_class_code,entry_class_code,entries,addenda,total_debit,total_credit\n\
///      1,225,PPD,1,0,25.01,0.00\n"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSummary {
    batches: Vec<BatchSummary>,
}

impl FileSummary {
    /// Collects one row per batch. Takes `&mut` because batch headers are
    /// built on first access.
    pub fn from_file(file: &mut File) -> Self {
        FileSummary {
            batches: file
                .batches_mut()
                .iter_mut()
                .map(BatchSummary::from_batch)
                .collect(),
        }
    }

    pub fn batches(&self) -> &[BatchSummary] {
        &self.batches
    }

    /// Writes a header row and one row per batch.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record([
            "batch_number",
            "service_class_code",
            "entry_class_code",
            "entries",
            "addenda",
            "total_debit",
            "total_credit",
        ])?;
        for batch in &self.batches {
            csv_writer.serialize(batch)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Attributes;

    #[test]
    fn test_dollars_keep_two_places() {
        assert_eq!(dollars(2501).to_string(), "25.01");
        assert_eq!(dollars(0).to_string(), "0.00");
        assert_eq!(dollars(100).to_string(), "1.00");
    }

    #[test]
    fn test_one_row_per_batch() {
        let mut file = File::new(Attributes::new()).unwrap();
        let batch = file.batch([("entry_class_code", "WEB")]).unwrap();
        batch.entry([("amount", 2501)]).unwrap();
        batch.addenda([("payment_related_info", "foo bar")]).unwrap();
        let batch = file.batch([("entry_class_code", "TEL")]).unwrap();
        batch.entry([("amount", 100), ("transaction_code", 22)]).unwrap();

        let summary = FileSummary::from_file(&mut file);
        assert_eq!(summary.batches().len(), 2);

        let first = &summary.batches()[0];
        assert_eq!(first.batch_number, 1);
        assert_eq!(first.service_class_code, 225);
        assert_eq!(first.entries, 1);
        assert_eq!(first.addenda, 1);
        assert_eq!(first.total_debit, dollars(2501));

        let second = &summary.batches()[1];
        assert_eq!(second.batch_number, 2);
        assert_eq!(second.service_class_code, 220);
        assert_eq!(second.entry_class_code, "TEL");
        assert_eq!(second.total_credit, dollars(100));
    }

    #[test]
    fn test_empty_file_writes_header_only() {
        let mut file = File::new(Attributes::new()).unwrap();
        let mut out = Vec::new();
        FileSummary::from_file(&mut file).write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "batch_number,service_class_code,entry_class_code,entries,addenda,total_debit,total_credit\n"
        );
    }
}
