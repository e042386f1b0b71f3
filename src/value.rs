//! Field and attribute values.
//!
//! Records store whatever the caller supplied: text or integers. Values are
//! only turned into fixed-width strings by a [`crate::Rule`] at serialization
//! time, and records parsed from a line hold the raw, padded substrings.

use std::collections::BTreeMap;
use std::fmt;

/// Attribute name → value mapping carried by components and passed to records.
pub type Attributes = BTreeMap<String, Value>;

/// A single field or attribute value.
///
/// # Examples
///
/// ```
/// use ach_builder::Value;
///
/// assert_eq!(Value::from("0000002501").to_i(), 2501);
/// assert_eq!(Value::from(27).to_string(), "27");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(i64),
}

impl Value {
    /// Reads the value as an integer.
    ///
    /// Leading whitespace is skipped, an optional sign and the following run
    /// of digits are read; anything else yields 0. Zero-padded numeric fields
    /// parsed from a line therefore read back as their numeric value.
    pub fn to_i(&self) -> i64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => {
                let s = s.trim_start();
                let (negative, digits) = match s.as_bytes().first() {
                    Some(b'-') => (true, &s[1..]),
                    Some(b'+') => (false, &s[1..]),
                    _ => (false, s),
                };
                let magnitude = digits
                    .chars()
                    .map_while(|c| c.to_digit(10))
                    .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d as i64));
                if negative {
                    -magnitude
                } else {
                    magnitude
                }
            }
        }
    }

    /// Returns the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as i64)
    }
}

/// Collects `(name, value)` pairs into [`Attributes`].
pub fn attributes<I, K, V>(pairs: I) -> Attributes
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_i_reads_padded_numbers() {
        assert_eq!(Value::from("0000002501").to_i(), 2501);
        assert_eq!(Value::from("  42abc").to_i(), 42);
        assert_eq!(Value::from("-17").to_i(), -17);
    }

    #[test]
    fn test_to_i_without_digits_is_zero() {
        assert_eq!(Value::from("").to_i(), 0);
        assert_eq!(Value::from("WEB").to_i(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(225).to_string(), "225");
        assert_eq!(Value::from("JOHN SMITH").to_string(), "JOHN SMITH");
    }

    #[test]
    fn test_attributes_helper() {
        let attrs = attributes([("amount", "2501"), ("routing_number", "010010101")]);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["amount"], Value::from("2501"));
    }
}
