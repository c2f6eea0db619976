// Inventory CSV import / export

use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::Path;

use stocktake_recon::export::{render, ExportKind};
use stocktake_recon::{Engine, InventoryRecord};

/// Read an inventory export as text, ready for `Engine::load`.
pub fn import(path: &Path) -> Result<String, String> {
    let text = read_file_as_utf8(path)?;
    log::debug!("read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(decode(bytes))
}

/// Decode raw bytes: UTF-8 (BOM stripped), falling back to Windows-1252.
pub fn decode(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Common for Excel-exported CSVs
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    // A BOM would glue itself to the first header cell
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Write records as CSV to `path`.
pub fn export(records: &[&InventoryRecord], path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    render(records, BufWriter::new(file)).map_err(|e| e.to_string())?;
    log::info!("wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Write the scanned or missing view of `engine` to `path`.
pub fn export_view(engine: &Engine, kind: ExportKind, path: &Path) -> Result<usize, String> {
    let records = engine.export_view(kind);
    export(&records, path)?;
    Ok(records.len())
}
