use crate::models::{HeaderMap, LotField, LotRecord};
use crate::utils::canonical::{
    canonical_category, corner_variant, COMMERCIAL, COMMERCIAL_CORNER, PRIME, PRIME_CORNER,
    REGULAR, REGULAR_CORNER,
};
use crate::utils::text::{first_digit_run, parse_size};

/// Turns one data row into a lot record using the resolved header columns.
///
/// Returns `None` when every cell is blank. Columns the header did not
/// resolve read as empty text.
pub fn normalize_row(header_map: &HeaderMap, row: &[String]) -> Option<LotRecord> {
    if row.iter().all(|cell| cell.trim().is_empty()) {
        return None;
    }

    let value = |field: LotField| -> String {
        header_map
            .get(field)
            .and_then(|idx| row.get(idx))
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default()
    };

    let phase_raw = value(LotField::Phase);
    let rsv_date = value(LotField::RsvDate);

    let mut record = LotRecord::new(value(LotField::Lot), first_digit_run(&phase_raw));
    record.size = parse_size(&value(LotField::Size));
    record.category = resolve_category(&value(LotField::Category), &phase_raw);
    record.status = value(LotField::Status);
    record.last_updated = if rsv_date.is_empty() {
        None
    } else {
        Some(rsv_date)
    };

    Some(record)
}

/// Category for a row: the explicit column when filled, else letters in the
/// phase code; a `K` in the phase code then upgrades to the corner variant.
pub fn resolve_category(category_cell: &str, phase_raw: &str) -> String {
    let explicit = category_cell.trim();
    let category = if explicit.is_empty() {
        category_from_phase_code(phase_raw).to_string()
    } else {
        canonical_category(explicit)
    };

    apply_corner_marker(category, phase_raw)
}

/// Phase codes carry the category as letters, e.g. `2-PC` or `1C`.
pub fn category_from_phase_code(phase_raw: &str) -> &'static str {
    let code = phase_raw.to_uppercase();
    if code.contains("PC") {
        PRIME_CORNER
    } else if code.contains("CC") {
        COMMERCIAL_CORNER
    } else if code.contains("RC") {
        REGULAR_CORNER
    } else if code.contains('C') {
        COMMERCIAL
    } else if code.contains('P') {
        PRIME
    } else {
        REGULAR
    }
}

fn apply_corner_marker(category: String, phase_raw: &str) -> String {
    if !phase_raw.to_uppercase().contains('K') || category.to_lowercase().contains("corner") {
        return category;
    }
    match corner_variant(&category) {
        Some(corner) => corner.to_string(),
        None => category,
    }
}
