//! Output records, progress reporting and result collection

use crate::asn::lookup::LookupResult;
use serde::{Deserialize, Serialize};

/// One row of the output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Normalized prefix, or the raw input when it could not be normalized
    #[serde(rename = "Prefix")]
    pub prefix: String,
    /// Autonomous System Number, or `N/A`
    #[serde(rename = "ASN")]
    pub asn: String,
    /// Organization name, `N/A`, or an error description
    #[serde(rename = "Provider")]
    pub provider: String,
}

impl OutputRecord {
    /// Build a row from a prefix and its lookup result
    pub fn new(prefix: impl Into<String>, result: LookupResult) -> Self {
        Self {
            prefix: prefix.into(),
            asn: result.asn,
            provider: result.provider,
        }
    }

    /// Whether this row carries an error instead of registry data
    pub fn is_error(&self) -> bool {
        self.provider.starts_with("Error: ")
    }
}

/// Receives progress updates from the dispatcher
pub trait ProgressReporter: Send + Sync {
    /// Called once after each prefix finishes
    fn on_progress(&self, completed: usize, total: usize);
}

/// A reporter that ignores all updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total);
    }
}

/// Counts for the end-of-run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows produced
    pub total: usize,
    /// Rows with registry data
    pub resolved: usize,
    /// Rows carrying an error
    pub failed: usize,
}

/// Accumulates output rows in memory until the run is finished
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    records: Vec<OutputRecord>,
}

impl ResultCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector sized for `capacity` rows
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Add one row
    pub fn push(&mut self, record: OutputRecord) {
        self.records.push(record);
    }

    /// Number of rows collected
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no rows were collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows in their current order
    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    /// Order rows by prefix text; rows with equal prefixes keep their order
    pub fn sort_by_prefix(&mut self) {
        self.records.sort_by(|a, b| a.prefix.cmp(&b.prefix));
    }

    /// Count resolved and failed rows
    pub fn summary(&self) -> RunSummary {
        let failed = self.records.iter().filter(|r| r.is_error()).count();
        RunSummary {
            total: self.records.len(),
            resolved: self.records.len() - failed,
            failed,
        }
    }

    /// Consume the collector, returning the rows
    pub fn into_records(self) -> Vec<OutputRecord> {
        self.records
    }
}

impl Extend<OutputRecord> for ResultCollector {
    fn extend<T: IntoIterator<Item = OutputRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl FromIterator<OutputRecord> for ResultCollector {
    fn from_iter<T: IntoIterator<Item = OutputRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
