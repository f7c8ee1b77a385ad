use crate::models::{HeaderMap, LotField, RawRow};

/// Rows examined when looking for the header row.
pub const DEFAULT_HEADER_SCAN: usize = 20;

const LOT_ALIASES: &[&str] = &[
    "lot",
    "lot #",
    "lot no",
    "lot number",
    "lot#",
    "lot_num",
    "lotnum",
    "lot code",
];
const PHASE_ALIASES: &[&str] = &["phase", "phases"];
const SIZE_ALIASES: &[&str] = &["lot area", "size (sqm)", "size", "sqm"];
const STATUS_ALIASES: &[&str] = &["status"];
const CATEGORY_ALIASES: &[&str] = &["category", "cat"];
const DATE_ALIASES: &[&str] = &[
    "rsv date",
    "reservation date",
    "last updated",
    "updated",
    "date",
];

/// Normalizes a header cell (trim, lowercase).
///
/// Inner spaces are kept: the alias tables rely on them ("lot no", "size (sqm)").
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Accepted spellings for a field, in lookup priority order.
pub fn aliases(field: LotField) -> &'static [&'static str] {
    match field {
        LotField::Lot => LOT_ALIASES,
        LotField::Phase => PHASE_ALIASES,
        LotField::Size => SIZE_ALIASES,
        LotField::Status => STATUS_ALIASES,
        LotField::Category => CATEGORY_ALIASES,
        LotField::RsvDate => DATE_ALIASES,
    }
}

/// Number of field groups with at least one alias present in the row.
pub fn score_header_row(row: &[String]) -> usize {
    let normalized: Vec<String> = row.iter().map(|cell| normalize_header(cell)).collect();

    LotField::ALL
        .iter()
        .filter(|field| {
            aliases(**field)
                .iter()
                .any(|alias| normalized.iter().any(|cell| cell == alias))
        })
        .count()
}

/// Picks the header row among the first `max_scan` rows.
///
/// The highest score wins and the earliest row wins a tie, so a sheet whose
/// scanned rows match nothing falls back to row 0.
pub fn find_header_row_index(rows: &[RawRow], max_scan: usize) -> usize {
    let limit = rows.len().min(max_scan);
    let mut best = 0;
    let mut best_score: Option<usize> = None;

    for (idx, row) in rows.iter().take(limit).enumerate() {
        let score = score_header_row(row);
        if best_score.map_or(true, |current| score > current) {
            best_score = Some(score);
            best = idx;
        }
    }

    best
}

/// Column index for one field: the first alias (in priority order) present in
/// the header wins, and among equal cells the leftmost column.
pub fn find_column(headers: &[String], field: LotField) -> Option<usize> {
    aliases(field)
        .iter()
        .find_map(|alias| headers.iter().position(|header| header == alias))
}

/// Resolves every canonical field against one header row.
pub fn resolve_header_map(header_row: &[String]) -> HeaderMap {
    let headers: Vec<String> = header_row.iter().map(|h| normalize_header(h)).collect();
    let mut map = HeaderMap::default();
    for field in LotField::ALL {
        map.set(field, find_column(&headers, field));
    }
    map
}
