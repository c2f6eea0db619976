// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use stocktake_recon::InventoryRecord;

/// Export records as a JSON array of objects.
/// Absent fields are omitted from each object.
pub fn export(records: &[&InventoryRecord], path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, records).map_err(|e| e.to_string())?;

    Ok(())
}
