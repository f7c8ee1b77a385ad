use tracing::{debug, warn};

use crate::models::{AppError, ImportBatch, ImportWarning, RawRow};
use crate::processors::normalizer::normalize_row;
use crate::utils::header::{find_header_row_index, resolve_header_map, score_header_row};
use crate::utils::text::find_invalid_char;

/// Builds candidate lot records from a parsed row matrix.
///
/// # Arguments
/// * `rows` - cells from the CSV tokenizer or a converted worksheet
/// * `max_scan` - rows examined when locating the header
///
/// # Returns
/// The batch with its header resolution and any tolerated problems. An empty
/// matrix is the only hard failure.
pub fn build_lot_batch(rows: Vec<RawRow>, max_scan: usize) -> Result<ImportBatch, AppError> {
    if rows.is_empty() {
        return Err(AppError::EmptyInput);
    }

    // ------------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------------

    let header_row = find_header_row_index(&rows, max_scan);
    let headers = rows[header_row].clone();
    let header_map = resolve_header_map(&headers);

    let mut warnings = Vec::new();
    if score_header_row(&headers) == 0 {
        warn!(header_row, "no header aliases matched");
        warnings.push(ImportWarning::NoHeaderMatched { header_row });
    }
    for field in header_map.missing() {
        warnings.push(ImportWarning::MissingColumn { field });
    }
    debug!(header_row, ?header_map, "header resolved");

    // ------------------------------------------------------------------------
    // Data rows
    // ------------------------------------------------------------------------

    let mut records = Vec::new();
    let mut row_numbers = Vec::new();

    for (row_index, row) in rows.iter().enumerate().skip(header_row + 1) {
        let line_number = row_index + 1;

        let Some(record) = normalize_row(&header_map, row) else {
            warnings.push(ImportWarning::BlankRow { line: line_number });
            continue;
        };

        if record.lot_number.is_empty() {
            warnings.push(ImportWarning::MissingLotNumber { line: line_number });
            continue;
        }

        // A phase that does not fit would otherwise key the lot as phaseless.
        let phase_cell = header_map
            .phase
            .and_then(|idx| row.get(idx))
            .map(|cell| cell.trim())
            .unwrap_or_default();
        if record.phase.is_none() && phase_cell.contains(|c: char| c.is_ascii_digit()) {
            warn!(line = line_number, phase = phase_cell, "phase out of range");
            warnings.push(ImportWarning::PhaseOutOfRange {
                line: line_number,
                value: phase_cell.to_string(),
            });
            continue;
        }

        for (column, cell) in row.iter().enumerate() {
            if let Some(character) = find_invalid_char(cell) {
                warnings.push(ImportWarning::InvalidCharacter {
                    line: line_number,
                    column,
                    character,
                });
            }
        }

        records.push(record);
        row_numbers.push(line_number);
    }

    debug!(
        records = records.len(),
        warnings = warnings.len(),
        "lot batch built"
    );

    Ok(ImportBatch {
        header_row,
        headers,
        header_map,
        records,
        row_numbers,
        warnings,
    })
}
