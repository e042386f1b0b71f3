//! Parsing ACH files back into a [`File`] tree.
//!
//! Lines are classified by their first character and grouped by batch; once
//! the input is consumed the tree is rebuilt with [`crate::Record::parse`].

use crate::constants::{
    BATCH_ADDENDA_RECORD_TYPE, BATCH_CONTROL_RECORD_TYPE, BATCH_ENTRY_RECORD_TYPE,
    BATCH_HEADER_RECORD_TYPE, FILE_CONTROL_RECORD_TYPE, FILE_HEADER_RECORD_TYPE,
};
use crate::error::{AchError, Result};
use crate::file::File;
use crate::layout::FileLayout;
use crate::value::Attributes;
use log::{debug, warn};
use std::io::BufRead;
use std::sync::Arc;

/// Lines of one batch, in input order.
#[derive(Debug)]
struct RawBatch {
    header: String,
    /// Entry and addenda lines.
    body: Vec<String>,
    control: Option<String>,
}

#[derive(Debug, Default)]
struct RawFile {
    transmission_header: Option<String>,
    header: Option<String>,
    batches: Vec<RawBatch>,
    control: Option<String>,
}

impl RawFile {
    fn current_batch(&mut self, line_no: usize, record_type: char) -> Result<&mut RawBatch> {
        self.batches.last_mut().ok_or(AchError::OrphanRecord {
            line: line_no,
            record_type,
        })
    }
}

fn is_pad(line: &str) -> bool {
    line.chars().all(|c| c == FILE_CONTROL_RECORD_TYPE)
}

/// Reads ACH files of one layout.
///
/// # Examples
///
/// ```
/// use ach_builder::{FileLayout, Reader};
///
/// let reader = Reader::new(FileLayout::standard());
/// let err = reader.read_str("6 orphan entry").unwrap_err();
/// assert_eq!(err.to_string(), "Line 1: record type '6' found outside of a batch");
/// ```
#[derive(Debug, Clone)]
pub struct Reader {
    layout: Arc<FileLayout>,
}

impl Reader {
    pub fn new(layout: Arc<FileLayout>) -> Self {
        Reader { layout }
    }

    /// Reads a whole file from `input`.
    ///
    /// When the layout declares a transmission header, the first non-blank
    /// line is taken as that header.
    pub fn read<R: BufRead>(&self, input: R) -> Result<File> {
        let mut raw = RawFile::default();
        let mut expect_transmission_header = self.layout.has_transmission_header();

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let line_no = index + 1;
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.is_empty() {
                debug!("Line {}: skipping blank line", line_no);
                continue;
            }
            if expect_transmission_header {
                raw.transmission_header = Some(line.to_string());
                expect_transmission_header = false;
                continue;
            }
            self.classify(&mut raw, line_no, line)?;
        }

        self.assemble(raw)
    }

    /// Reads a whole file from an in-memory string.
    pub fn read_str(&self, input: &str) -> Result<File> {
        self.read(input.as_bytes())
    }

    fn classify(&self, raw: &mut RawFile, line_no: usize, line: &str) -> Result<()> {
        let Some(record_type) = line.chars().next() else {
            return Ok(());
        };

        match record_type {
            FILE_HEADER_RECORD_TYPE => raw.header = Some(line.to_string()),
            BATCH_HEADER_RECORD_TYPE => raw.batches.push(RawBatch {
                header: line.to_string(),
                body: Vec::new(),
                control: None,
            }),
            BATCH_ENTRY_RECORD_TYPE | BATCH_ADDENDA_RECORD_TYPE => raw
                .current_batch(line_no, record_type)?
                .body
                .push(line.to_string()),
            BATCH_CONTROL_RECORD_TYPE => {
                raw.current_batch(line_no, record_type)?.control = Some(line.to_string())
            }
            FILE_CONTROL_RECORD_TYPE if is_pad(line) => {
                debug!("Line {}: skipping pad record", line_no)
            }
            FILE_CONTROL_RECORD_TYPE => raw.control = Some(line.to_string()),
            other => warn!(
                "Line {}: skipping line with unknown record type '{}'",
                line_no, other
            ),
        }
        Ok(())
    }

    fn assemble(&self, raw: RawFile) -> Result<File> {
        let mut file = File::with_layout(self.layout.clone(), Attributes::new())?;

        if let Some(line) = &raw.transmission_header {
            file.build_transmission_header(line)?;
        }
        let header = raw
            .header
            .as_deref()
            .ok_or(AchError::MissingRecord("File::Header"))?;
        file.build_header(header)?;

        for raw_batch in &raw.batches {
            let batch = file.batch(Attributes::new())?;
            batch.build_header(&raw_batch.header)?;
            for line in &raw_batch.body {
                if line.starts_with(BATCH_ENTRY_RECORD_TYPE) {
                    batch.build_entry(line)?;
                } else {
                    batch.build_addenda(line)?;
                }
            }
            let control = raw_batch
                .control
                .as_deref()
                .ok_or(AchError::MissingRecord("Batch::Control"))?;
            batch.build_control(control)?;
        }

        let control = raw
            .control
            .as_deref()
            .ok_or(AchError::MissingRecord("File::Control"))?;
        file.build_control(control)?;

        debug!(
            "Read ACH file with {} batch(es) and {} entry/addenda record(s)",
            file.batch_count(),
            file.file_entry_addenda_count()
        );
        Ok(file)
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new(FileLayout::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample_lines() -> Vec<String> {
        let mut file = File::new([
            ("company_id", "11-11111"),
            ("company_name", "MY COMPANY"),
            ("immediate_dest", "123123123"),
            ("immediate_dest_name", "COMMERCE BANK"),
            ("immediate_origin", "123123123"),
            ("immediate_origin_name", "MYCOMPANY"),
            ("date", "110412"),
            ("time", "1200"),
        ])
        .unwrap();
        let batch = file
            .batch([
                ("entry_class_code", "WEB"),
                ("company_entry_descr", "TV-TELCOM"),
                ("effective_date", "110412"),
                ("desc_date", "APR 12"),
                ("origin_dfi_id", "00000000"),
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
            .addenda([
                ("payment_related_info", "foo bar"),
                ("addenda_sequence_num", "1"),
                ("entry_details_sequence_num", "1"),
            ])
            .unwrap();
        file.serialize()
            .unwrap()
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_reads_tree() {
        let lines = sample_lines();
        let file = Reader::default().read_str(&lines.join("\n")).unwrap();

        assert_eq!(file.batch_count(), 1);
        let batch = &file.batches()[0];
        assert_eq!(batch.entries().len(), 1);
        assert_eq!(batch.addenda_for(0).len(), 1);
        assert_eq!(
            batch.entries()[0].get("amount"),
            Some(&Value::from("0000002501"))
        );
        assert_eq!(file.total_debit_amount(), 2501);
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let input = sample_lines().join("\n");
        let mut file = Reader::default().read_str(&input).unwrap();
        assert_eq!(file.serialize().unwrap(), input);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let input = sample_lines().join("\r\n\r\n");
        let file = Reader::default().read_str(&input).unwrap();
        assert_eq!(file.file_entry_addenda_count(), 2);
    }

    #[test]
    fn test_unknown_lines_skipped() {
        let mut lines = sample_lines();
        lines.insert(1, "X not a record".to_string());
        let file = Reader::default().read_str(&lines.join("\n")).unwrap();
        assert_eq!(file.batch_count(), 1);
    }

    #[test]
    fn test_entry_before_batch_is_orphan() {
        let lines = sample_lines();
        let input = [lines[0].as_str(), lines[2].as_str()].join("\n");
        let err = Reader::default().read_str(&input).unwrap_err();
        assert!(matches!(
            err,
            AchError::OrphanRecord {
                line: 2,
                record_type: '6'
            }
        ));
    }

    #[test]
    fn test_addenda_before_entry_has_no_link() {
        let mut lines = sample_lines();
        lines.remove(2);
        let err = Reader::default().read_str(&lines.join("\n")).unwrap_err();
        assert!(matches!(err, AchError::NoLink { .. }));
    }

    #[test]
    fn test_missing_records() {
        let lines = sample_lines();

        let no_header = lines[1..].join("\n");
        let err = Reader::default().read_str(&no_header).unwrap_err();
        assert!(matches!(err, AchError::MissingRecord("File::Header")));

        let no_file_control = lines[..5].join("\n");
        let err = Reader::default().read_str(&no_file_control).unwrap_err();
        assert!(matches!(err, AchError::MissingRecord("File::Control")));

        let mut no_batch_control = lines.clone();
        no_batch_control.remove(4);
        let err = Reader::default()
            .read_str(&no_batch_control.join("\n"))
            .unwrap_err();
        assert!(matches!(err, AchError::MissingRecord("Batch::Control")));
    }

    fn with_batch_count(control: &str, count: &str) -> String {
        format!("{}{}{}", &control[..1], count, &control[7..])
    }

    #[test]
    fn test_last_file_control_wins() {
        let lines = sample_lines();
        let mut input = lines[..6].to_vec();
        input.push(with_batch_count(&lines[5], "000007"));

        let mut file = Reader::default().read_str(&input.join("\n")).unwrap();
        assert_eq!(
            file.control().get("batch_count"),
            Some(&Value::from("000007"))
        );

        let mut input = lines[..5].to_vec();
        input.push(with_batch_count(&lines[5], "000007"));
        input.push(lines[5].clone());
        let mut file = Reader::default().read_str(&input.join("\n")).unwrap();
        assert_eq!(
            file.control().get("batch_count"),
            Some(&Value::from("000001"))
        );
    }

    #[test]
    fn test_pad_before_file_control_is_skipped() {
        let lines = sample_lines();
        let mut input = lines.clone();
        input.insert(5, "9".repeat(94));
        input.insert(2, "9".repeat(94));

        let mut file = Reader::default().read_str(&input.join("\n")).unwrap();
        assert_eq!(file.batch_count(), 1);
        assert_eq!(file.file_entry_addenda_count(), 2);
        assert_eq!(
            file.control().get("batch_count"),
            Some(&Value::from("000001"))
        );
        assert_eq!(file.serialize().unwrap(), lines.join("\n"));
    }

    #[test]
    fn test_wrong_width_fails() {
        let mut lines = sample_lines();
        lines[2].push(' ');
        let err = Reader::default().read_str(&lines.join("\n")).unwrap_err();
        assert!(matches!(
            err,
            AchError::LineLengthMismatch {
                expected: 94,
                actual: 95,
                ..
            }
        ));
    }
}
