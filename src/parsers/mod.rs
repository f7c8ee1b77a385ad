mod builder;
mod csv;
mod delimiter;
mod excel;

use std::path::Path;

use tracing::info;

use crate::models::{AppError, ImportBatch, RawRow};

pub use builder::build_lot_batch;
pub use self::csv::{parse_csv_text, tokenize};
pub use delimiter::detect_delimiter;

/// Reads an inventory upload into a row matrix, choosing the reader by extension.
pub fn read_inventory_rows(path: &Path) -> Result<Vec<RawRow>, AppError> {
    if !path.exists() {
        return Err(AppError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }

    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .ok_or_else(|| AppError::UnsupportedFormat(path.display().to_string()))?;

    let rows = match ext.as_str() {
        "csv" | "txt" => self::csv::parse_csv_file(path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => excel::parse_excel_file(path)?,
        other => return Err(AppError::UnsupportedFormat(other.to_string())),
    };

    info!(path = %path.display(), rows = rows.len(), "inventory file read");
    Ok(rows)
}

/// Reads and normalizes an inventory upload in one step.
pub fn parse_inventory_file(path: &Path, max_scan: usize) -> Result<ImportBatch, AppError> {
    build_lot_batch(read_inventory_rows(path)?, max_scan)
}

/// Normalizes CSV text that is already in memory.
pub fn parse_inventory_text(text: &str, max_scan: usize) -> Result<ImportBatch, AppError> {
    build_lot_batch(parse_csv_text(text), max_scan)
}
