//! Input prefix values and their normalization to CIDR notation

use serde::{Deserialize, Serialize};
use std::fmt;

/// A prefix value exactly as it was read from the input table.
///
/// Numeric cells are kept apart from text cells: only text can name a
/// network, so numbers always fail normalization. The original cell text is
/// retained so the value can still be hashed, deduplicated and reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawPrefix {
    /// A text cell
    Text(String),
    /// A cell the reader recognised as a number
    Number(String),
}

impl RawPrefix {
    /// Classify a cell: anything that parses as a number is `Number`
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        // f64 parsing also accepts "inf" and "NaN", which are words here
        let numeric_start = trimmed
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
        if numeric_start && (trimmed.parse::<i64>().is_ok() || trimmed.parse::<f64>().is_ok()) {
            RawPrefix::Number(cell.to_string())
        } else {
            RawPrefix::Text(cell.to_string())
        }
    }

    /// The original cell text
    pub fn as_str(&self) -> &str {
        match self {
            RawPrefix::Text(s) | RawPrefix::Number(s) => s,
        }
    }
}

impl fmt::Display for RawPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RawPrefix {
    fn from(value: &str) -> Self {
        RawPrefix::Text(value.to_string())
    }
}

impl From<String> for RawPrefix {
    fn from(value: String) -> Self {
        RawPrefix::Text(value)
    }
}

/// A prefix in `address/len` form.
///
/// Only [`normalize`] constructs these, so every value carries a `/`. The
/// address part is not validated here; the resolver does that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPrefix(String);

impl NormalizedPrefix {
    /// The prefix as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the prefix, returning the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPrefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Clean up a raw input value into CIDR notation.
///
/// Returns `None` for non-text values and for text that is empty once
/// trimmed. A single trailing `/` is dropped, and a value without any mask
/// gets `/32`.
///
/// # Examples
///
/// ```
/// use pfx2asn::prefix::{normalize, RawPrefix};
///
/// let p = normalize(&RawPrefix::from("10.0.0.0")).unwrap();
/// assert_eq!(p.as_str(), "10.0.0.0/32");
/// assert!(normalize(&RawPrefix::from("   ")).is_none());
/// ```
pub fn normalize(raw: &RawPrefix) -> Option<NormalizedPrefix> {
    let RawPrefix::Text(text) = raw else {
        return None;
    };

    let mut prefix = text.trim();
    if prefix.is_empty() {
        return None;
    }
    if let Some(stripped) = prefix.strip_suffix('/') {
        prefix = stripped;
    }

    if prefix.contains('/') {
        Some(NormalizedPrefix(prefix.to_string()))
    } else {
        Some(NormalizedPrefix(format!("{prefix}/32")))
    }
}
