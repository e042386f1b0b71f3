//! Fixed-width formatting rules and the rule registry.
//!
//! A rule is compiled from a compact descriptor:
//!
//! ```text
//! ("<-" | "->") width ["-"] ["|" transform]
//! ```
//!
//! - `<-` left-justifies, padding on the right with spaces.
//! - `->` right-justifies, padding on the left with zeros, or with spaces when
//!   the `-` flag is present.
//! - `|transform` applies a registered transform (`upcase`, `downcase`,
//!   `strip`) before padding.
//!
//! Formatting always keeps the rightmost `width` characters of the padded
//! string, so over-long input is cut from the left for both justifications.

use crate::error::{AchError, Result};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Rules of every field of the standard NACHA records.
const RULES: &[(&str, &str)] = &[
    ("customer_name", "<-22"),
    ("customer_acct", "<-15"),
    ("amount", "->10"),
    ("bank_2", "<-2"),
    ("transaction_type", "<-2"),
    ("bank_15", "<-15"),
    ("addenda", "<-1"),
    ("trace_num", "<-15"),
    ("transaction_code", "<-2"),
    ("record_type", "<-1"),
    ("bank_account", "<-17"),
    ("routing_number", "->9"),
    ("priority_code", "->2"),
    ("immediate_dest", "->10-"),
    ("immediate_origin", "->10-"),
    ("date", "<-6"),
    ("time", "<-4"),
    ("file_id_modifier", "<-1|upcase"),
    ("record_size", "->3"),
    ("blocking_factor", "->2"),
    ("format_code", "<-1"),
    ("immediate_dest_name", "<-23"),
    ("immediate_origin_name", "<-23"),
    ("reference_code", "<-8"),
    ("service_class_code", "<-3"),
    // aka Individual Name
    ("company_name", "<-16"),
    ("company_note_data", "<-20"),
    ("company_id", "<-10"),
    ("entry_class_code", "<-3"),
    ("company_entry_descr", "<-10"),
    ("effective_date", "<-6"),
    ("settlement_date", "<-3"),
    ("origin_status_code", "<-1"),
    ("origin_dfi_id", "<-8"),
    ("batch_number", "->7"),
    ("entry_addenda_count", "->6"),
    ("entry_hash", "->10"),
    ("total_debit_amount", "->12"),
    ("total_credit_amount", "->12"),
    ("authen_code", "<-19"),
    ("bank_6", "<-6"),
    ("batch_count", "->6"),
    ("block_count", "->6"),
    ("file_entry_addenda_count", "->8"),
    ("bank_39", "<-39"),
    ("nines", "<-94"),
    // company descriptive date
    ("desc_date", "<-6-"),
    ("addenda_type_code", "->2"),
    ("payment_related_info", "<-80"),
    ("addenda_sequence_num", "->4"),
    ("entry_details_sequence_num", "->7"),
];

/// Which side of the field the value is aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    /// `<-`: value on the left, padding on the right.
    Left,
    /// `->`: value on the right, padding on the left.
    Right,
}

/// A named, pure string transform applied before padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Upcase,
    Downcase,
    Strip,
}

impl Transform {
    fn apply(self, value: &str) -> String {
        match self {
            Transform::Upcase => value.to_uppercase(),
            Transform::Downcase => value.to_lowercase(),
            Transform::Strip => value.trim().to_string(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Transform::Upcase => "upcase",
            Transform::Downcase => "downcase",
            Transform::Strip => "strip",
        }
    }
}

impl FromStr for Transform {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "upcase" => Ok(Transform::Upcase),
            "downcase" => Ok(Transform::Downcase),
            "strip" => Ok(Transform::Strip),
            _ => Err(()),
        }
    }
}

/// A compiled formatting rule.
///
/// # Examples
///
/// ```
/// use ach_builder::Rule;
///
/// let amount = Rule::compile("->10").unwrap();
/// assert_eq!(amount.format(&2501.into()), "0000002501");
///
/// let name = Rule::compile("<-5|upcase").unwrap();
/// assert_eq!(name.format(&"bar".into()), "BAR  ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    justification: Justification,
    width: usize,
    pad: char,
    transform: Option<Transform>,
}

impl Rule {
    /// Compiles a rule descriptor.
    pub fn compile(descriptor: &str) -> Result<Self> {
        let malformed = || AchError::MalformedRule {
            descriptor: descriptor.to_string(),
        };

        let (justification, rest) = if let Some(rest) = descriptor.strip_prefix("<-") {
            (Justification::Left, rest)
        } else if let Some(rest) = descriptor.strip_prefix("->") {
            (Justification::Right, rest)
        } else {
            return Err(malformed());
        };

        let (body, transform_name) = match rest.split_once('|') {
            Some((body, name)) => (body, Some(name)),
            None => (rest, None),
        };

        let (digits, spaced) = match body.strip_suffix('-') {
            Some(digits) => (digits, true),
            None => (body, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let width: usize = digits.parse().map_err(|_| malformed())?;
        if width == 0 {
            return Err(malformed());
        }

        let transform = match transform_name {
            None => None,
            Some(name) => {
                if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return Err(malformed());
                }
                let transform = name.parse().map_err(|_| AchError::UnknownTransform {
                    transform: name.to_string(),
                    descriptor: descriptor.to_string(),
                })?;
                Some(transform)
            }
        };

        let pad = match justification {
            Justification::Left => ' ',
            Justification::Right if spaced => ' ',
            Justification::Right => '0',
        };

        Ok(Rule {
            justification,
            width,
            pad,
            transform,
        })
    }

    /// Number of characters every formatted value occupies.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn justification(&self) -> Justification {
        self.justification
    }

    pub fn pad_char(&self) -> char {
        self.pad
    }

    /// Formats `value` to exactly `width` characters.
    pub fn format(&self, value: &Value) -> String {
        let raw = value.to_string();
        let text = match self.transform {
            Some(transform) => transform.apply(&raw),
            None => raw,
        };

        let len = text.chars().count();
        let padded = if len >= self.width {
            text
        } else {
            let padding: String = std::iter::repeat(self.pad).take(self.width - len).collect();
            match self.justification {
                Justification::Left => text + &padding,
                Justification::Right => padding + &text,
            }
        };

        let excess = padded.chars().count() - self.width;
        padded.chars().skip(excess).collect()
    }
}

impl FromStr for Rule {
    type Err = AchError;

    fn from_str(s: &str) -> Result<Self> {
        Rule::compile(s)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.justification {
            Justification::Left => "<-",
            Justification::Right => "->",
        };
        write!(f, "{}{}", arrow, self.width)?;
        if self.justification == Justification::Right && self.pad == ' ' {
            f.write_str("-")?;
        }
        if let Some(transform) = self.transform {
            write!(f, "|{}", transform.name())?;
        }
        Ok(())
    }
}

/// Splits a line into consecutive substrings, one per rule width.
///
/// Fails with [`AchError::LineLengthMismatch`] when the line is not exactly
/// as long as the sum of the widths. `record` names the line's record type
/// in that error.
pub fn split_line<'a, I>(record: &str, rules: I, line: &str) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a Rule>,
{
    let widths: Vec<usize> = rules.into_iter().map(Rule::width).collect();
    let expected: usize = widths.iter().sum();
    let actual = line.chars().count();
    if actual != expected {
        return Err(AchError::LineLengthMismatch {
            record: record.to_string(),
            expected,
            actual,
        });
    }

    let mut chars = line.chars();
    Ok(widths
        .into_iter()
        .map(|width| chars.by_ref().take(width).collect())
        .collect())
}

/// Registry of rules keyed by field name.
///
/// The standard registry knows every field of the NACHA layout. Layouts may
/// register more (for example the fields of a transmission header), which
/// also makes those names valid component attributes.
#[derive(Debug, Clone)]
pub struct Formatter {
    rules: HashMap<String, Rule>,
}

impl Formatter {
    /// Creates a registry holding the standard NACHA rules.
    pub fn standard() -> Self {
        let rules = RULES
            .iter()
            .map(|(name, descriptor)| {
                // Safety: the built-in table is static and every descriptor in it is well-formed
                let rule = Rule::compile(descriptor).expect("built-in rule descriptor");
                (name.to_string(), rule)
            })
            .collect();
        Formatter { rules }
    }

    /// Creates a registry with no rules.
    pub fn empty() -> Self {
        Formatter {
            rules: HashMap::new(),
        }
    }

    /// Returns `true` if a rule is registered for `field`.
    pub fn is_defined(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }

    /// Compiles `descriptor` and registers it for `field`, replacing any previous rule.
    pub fn define(&mut self, field: &str, descriptor: &str) -> Result<()> {
        let rule = Rule::compile(descriptor)?;
        self.rules.insert(field.to_string(), rule);
        Ok(())
    }

    /// Looks up the rule for `field`.
    pub fn rule(&self, field: &str) -> Option<&Rule> {
        self.rules.get(field)
    }

    /// Formats `value` with the rule registered for `field`.
    pub fn format(&self, field: &str, value: &Value) -> Result<String> {
        self.rules
            .get(field)
            .map(|rule| rule.format(value))
            .ok_or_else(|| AchError::UnknownField {
                field: field.to_string(),
                record: "Formatter".to_string(),
            })
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::standard()
    }
}
