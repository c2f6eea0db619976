use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parse::parse_line;

// ---------------------------------------------------------------------------
// Canonical fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalField {
    Stock,
    Serial,
    Make,
    Model,
    Calibre,
    Condition,
}

impl CanonicalField {
    /// Export column order.
    pub const ALL: [CanonicalField; 6] = [
        Self::Stock,
        Self::Serial,
        Self::Make,
        Self::Model,
        Self::Calibre,
        Self::Condition,
    ];

    /// Groups that must all be present for a line to count as the header.
    pub const REQUIRED: [CanonicalField; 4] =
        [Self::Stock, Self::Make, Self::Model, Self::Condition];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stock => "Stock",
            Self::Serial => "Serial",
            Self::Make => "Make",
            Self::Model => "Model",
            Self::Calibre => "Calibre",
            Self::Condition => "Condition",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Header spellings
// ---------------------------------------------------------------------------

/// Accepted header spellings per canonical field.
///
/// `stock`, `serial` and `calibre` are substring needles ("Stock #" and
/// "Stock Number" both contain "stock"); `make`, `model` and `condition` must
/// equal the normalized cell exactly. Comparison is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderSchema {
    pub stock: Vec<String>,
    pub serial: Vec<String>,
    pub calibre: Vec<String>,
    pub make: Vec<String>,
    pub model: Vec<String>,
    pub condition: Vec<String>,
}

impl Default for HeaderSchema {
    fn default() -> Self {
        Self {
            stock: vec!["stock".into()],
            serial: vec!["serial".into()],
            calibre: vec!["cal".into()],
            make: vec!["make".into()],
            model: vec!["model".into()],
            condition: vec!["condition".into()],
        }
    }
}

fn normalize_cell(cell: &str) -> String {
    cell.trim().to_lowercase()
}

fn contains_any(cell: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| cell.contains(&n.trim().to_lowercase()))
}

fn equals_any(cell: &str, names: &[String]) -> bool {
    names.iter().any(|n| cell == n.trim().to_lowercase())
}

impl HeaderSchema {
    pub fn spellings(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Stock => &self.stock,
            CanonicalField::Serial => &self.serial,
            CanonicalField::Make => &self.make,
            CanonicalField::Model => &self.model,
            CanonicalField::Calibre => &self.calibre,
            CanonicalField::Condition => &self.condition,
        }
    }

    /// Does a header cell name this field?
    pub fn matches(&self, field: CanonicalField, cell: &str) -> bool {
        let cell = normalize_cell(cell);
        let spellings = self.spellings(field);
        match field {
            CanonicalField::Stock | CanonicalField::Serial | CanonicalField::Calibre => {
                contains_any(&cell, spellings)
            }
            CanonicalField::Make | CanonicalField::Model | CanonicalField::Condition => {
                equals_any(&cell, spellings)
            }
        }
    }

    /// Every canonical field a header cell names. A cell may name several.
    pub fn classify(&self, cell: &str) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| self.matches(*f, cell))
            .collect()
    }

    /// A row qualifies as the header iff every required group has a column.
    pub fn is_header(&self, cells: &[String]) -> bool {
        CanonicalField::REQUIRED
            .iter()
            .all(|f| cells.iter().any(|c| self.matches(*f, c)))
    }

    /// Index of the first line that qualifies as the header.
    pub fn locate_header(&self, lines: &[&str]) -> Option<usize> {
        lines.iter().position(|line| self.is_header(&parse_line(line)))
    }

    pub fn column_map(&self, header: &[String]) -> ColumnMap {
        let mut bindings = Vec::new();
        for (idx, cell) in header.iter().enumerate() {
            for field in self.classify(cell) {
                bindings.push((idx, field));
            }
        }
        ColumnMap { bindings }
    }
}

// ---------------------------------------------------------------------------
// Column map
// ---------------------------------------------------------------------------

/// Column index → canonical field bindings, in column order.
///
/// Applying bindings in order gives "last writer wins" when several columns
/// name the same field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    bindings: Vec<(usize, CanonicalField)>,
}

impl ColumnMap {
    pub fn bindings(&self) -> &[(usize, CanonicalField)] {
        &self.bindings
    }
}
