use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ExportError;
use crate::model::InventoryRecord;
use crate::schema::CanonicalField;

/// Which side of the expected view to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// Expected records already scanned.
    Scanned,
    /// Expected records not yet scanned.
    Missing,
}

impl ExportKind {
    /// Default file name, e.g. `scanned.csv`.
    pub fn file_name(&self) -> String {
        format!("{self}.csv")
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scanned => write!(f, "scanned"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scanned" => Ok(Self::Scanned),
            "missing" => Ok(Self::Missing),
            other => Err(format!("unknown export kind: {other} (expected scanned or missing)")),
        }
    }
}

fn cell(record: &InventoryRecord, field: CanonicalField) -> &str {
    match field {
        CanonicalField::Stock => &record.stock_id,
        CanonicalField::Serial => record.serial.as_deref().unwrap_or(""),
        CanonicalField::Make => record.make.as_deref().unwrap_or(""),
        CanonicalField::Model => record.model.as_deref().unwrap_or(""),
        CanonicalField::Calibre => record.calibre.as_deref().unwrap_or(""),
        CanonicalField::Condition => record.condition.as_deref().unwrap_or(""),
    }
}

/// Write records as CSV with the canonical field names as header.
///
/// Cells are quoted by the `csv` writer, so a `"` inside a value is written as
/// `""`. The loader only toggles on quotes, so loading the output back drops
/// every `"` from such a value: `12" Barrel` reloads as `12 Barrel`.
pub fn render<W: Write>(records: &[&InventoryRecord], sink: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink);

    writer.write_record(CanonicalField::ALL.iter().map(|f| f.name()))?;
    for record in records {
        writer.write_record(CanonicalField::ALL.iter().map(|f| cell(record, *f)))?;
    }

    writer.flush().map_err(|e| ExportError::Io(e.to_string()))?;
    Ok(())
}

pub fn render_to_string(records: &[&InventoryRecord]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    render(records, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ExportError::Csv(e.to_string()))
}
