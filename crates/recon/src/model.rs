use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema version written into every persisted [`ReconciliationState`].
pub const STATE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One expected physical item from the inventory export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub stock_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl InventoryRecord {
    pub fn new(stock_id: impl Into<String>) -> Self {
        Self {
            stock_id: stock_id.into(),
            serial: None,
            make: None,
            model: None,
            calibre: None,
            condition: None,
        }
    }

    /// Condition lowercased and trimmed; empty when absent.
    pub fn normalized_condition(&self) -> String {
        self.condition
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything the engine owns between operations. This is the persisted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationState {
    pub version: u32,
    pub records: Vec<InventoryRecord>,
    pub scanned: BTreeSet<String>,
    pub filter_make: Option<String>,
    pub filter_model: Option<String>,
    pub last_scan: Option<String>,
    /// RFC 3339 timestamp of the last successful load.
    pub loaded_at: Option<String>,
    /// Label of the loaded source (usually a file name).
    pub source: Option<String>,
}

impl Default for ReconciliationState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            records: Vec::new(),
            scanned: BTreeSet::new(),
            filter_make: None,
            filter_model: None,
            last_scan: None,
            loaded_at: None,
            source: None,
        }
    }
}

impl ReconciliationState {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scan outcomes
// ---------------------------------------------------------------------------

/// Result of one `submit_scan` call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum ScanOutcome {
    Accepted(InventoryRecord),
    RejectedDuplicate(String),
    RejectedNotFound(String),
    RejectedEmpty,
}

impl ScanOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted(r) => write!(f, "accepted: {}", r.stock_id),
            Self::RejectedDuplicate(id) => write!(f, "duplicate: {id}"),
            Self::RejectedNotFound(id) => write!(f, "not found: {id}"),
            Self::RejectedEmpty => write!(f, "empty scan"),
        }
    }
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

/// A serial number booked against more than one distinct stock id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSerialGroup {
    pub serial: String,
    pub stock_ids: BTreeSet<String>,
    pub make: Option<String>,
    pub model: Option<String>,
}

impl fmt::Display for DuplicateSerialGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.stock_ids.iter().map(String::as_str).collect();
        write!(
            f,
            "serial {} booked to {} stock items ({}) - {} {}",
            self.serial,
            ids.len(),
            ids.join(", "),
            self.make.as_deref().unwrap_or("-"),
            self.model.as_deref().unwrap_or("-"),
        )
    }
}

// ---------------------------------------------------------------------------
// Load + progress
// ---------------------------------------------------------------------------

/// What `Engine::load` hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub records: Vec<InventoryRecord>,
    pub duplicates: Vec<DuplicateSerialGroup>,
    pub header_found: bool,
    /// Rows after the header that were discarded for lacking a stock id.
    pub dropped_rows: usize,
}

impl LoadReport {
    /// No usable data: either no header or no rows survived cleaning.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_double_bookings(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub expected: usize,
    pub scanned: usize,
    pub remaining: usize,
    pub percent: u32,
}

impl Progress {
    pub fn from_counts(expected: usize, scanned: usize) -> Self {
        let scanned = scanned.min(expected);
        let percent = if expected == 0 {
            0
        } else {
            (100.0 * scanned as f64 / expected as f64).round() as u32
        };
        Self {
            expected,
            scanned,
            remaining: expected - scanned,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.expected > 0 && self.remaining == 0
    }
}
