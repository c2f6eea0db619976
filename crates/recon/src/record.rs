use crate::model::InventoryRecord;
use crate::parse::{parse_line, split_lines};
use crate::schema::{CanonicalField, ColumnMap, HeaderSchema};

/// Normalize a stock id (or a raw scan code) for matching.
///
/// Drops all whitespace, then strips trailing `.0` left by spreadsheet
/// exports of integer cells. Idempotent.
pub fn clean_stock(raw: &str) -> String {
    let mut cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    while cleaned.ends_with(".0") {
        let len = cleaned.len() - 2;
        cleaned.truncate(len);
    }
    cleaned
}

fn clean_field(raw: Option<&str>) -> Option<String> {
    raw.map(|v| v.trim().to_string())
}

/// Rows pulled out of one document.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub records: Vec<InventoryRecord>,
    pub header_found: bool,
    pub dropped_rows: usize,
}

/// Build one record from a parsed row. `None` when the cleaned stock id is empty.
pub fn build_record(fields: &[String], map: &ColumnMap) -> Option<InventoryRecord> {
    let mut record = InventoryRecord::new(String::new());

    for &(idx, field) in map.bindings() {
        let cell = fields.get(idx).map(String::as_str);
        match field {
            CanonicalField::Stock => record.stock_id = clean_stock(cell.unwrap_or("")),
            CanonicalField::Serial => record.serial = clean_field(cell),
            CanonicalField::Make => record.make = clean_field(cell),
            CanonicalField::Model => record.model = clean_field(cell),
            CanonicalField::Calibre => record.calibre = clean_field(cell),
            CanonicalField::Condition => record.condition = clean_field(cell),
        }
    }

    if record.stock_id.is_empty() {
        None
    } else {
        Some(record)
    }
}

/// Locate the header, then build records from every line after it.
pub fn ingest(schema: &HeaderSchema, text: &str) -> Ingested {
    let lines = split_lines(text);
    let Some(header_idx) = schema.locate_header(&lines) else {
        log::debug!("no header row among {} lines", lines.len());
        return Ingested::default();
    };

    let map = schema.column_map(&parse_line(lines[header_idx]));
    let mut records = Vec::new();
    let mut dropped_rows = 0;

    for line in &lines[header_idx + 1..] {
        match build_record(&parse_line(line), &map) {
            Some(record) => records.push(record),
            None => dropped_rows += 1,
        }
    }

    Ingested {
        records,
        header_found: true,
        dropped_rows,
    }
}
