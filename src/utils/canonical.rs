//! Category and status canonicalization shared by the import, pricing and
//! display paths.

use super::text::to_title_case;

/// Category labels as they are stored on an imported lot.
pub const REGULAR: &str = "Regular";
pub const REGULAR_CORNER: &str = "Regular Corner";
pub const PRIME: &str = "Prime";
pub const PRIME_CORNER: &str = "Prime Corner";
pub const COMMERCIAL: &str = "Commercial";
pub const COMMERCIAL_CORNER: &str = "Commercial Corner";

const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("regular", REGULAR),
    ("regular corner", REGULAR_CORNER),
    ("prime", PRIME),
    ("prime corner", PRIME_CORNER),
    ("commercial", COMMERCIAL),
    ("commercial corner", COMMERCIAL_CORNER),
    ("premium", "Premium"),
    ("standard", "Standard"),
];

const STATUS_LABELS: &[(&str, &str)] = &[
    ("open", "Open"),
    ("available", "Open"),
    ("reserved", "Reserved"),
    ("sold", "Sold"),
];

/// Lowercase, NBSP/underscore/hyphen to space, whitespace collapsed, trimmed.
pub fn normalize_category_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{00a0}' | '_' | '-' => ' ',
            other => other,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_category_label(value: &str) -> String {
    let key = normalize_category_key(value);
    lookup(CATEGORY_LABELS, &key)
        .map(str::to_string)
        .unwrap_or_else(|| to_title_case(&key))
}

/// Canonical label for a value typed into a category column.
///
/// Short codes (`c`, `cc`, `p`, `pc`, `rc`, `r`) are expanded; unknown text is
/// returned trimmed but otherwise untouched.
pub fn canonical_category(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.to_lowercase().as_str() {
        "commercial" | "c" => COMMERCIAL.to_string(),
        "commercial corner" | "commercial_corner" | "cc" => COMMERCIAL_CORNER.to_string(),
        "prime" | "p" => PRIME.to_string(),
        "prime corner" | "prime_corner" | "pc" => PRIME_CORNER.to_string(),
        "regular corner" | "regular_corner" | "rc" => REGULAR_CORNER.to_string(),
        "regular" | "r" | "" => REGULAR.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Category stored in the lots table: snake_case keys, unknown values with
/// spaces replaced by underscores.
pub fn category_storage_key(value: &str) -> String {
    let key = canonical_category(value).trim().to_lowercase();
    key.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Corner counterpart of a base category; `None` when there is none.
pub fn corner_variant(category: &str) -> Option<&'static str> {
    match category.to_lowercase().as_str() {
        "commercial" => Some(COMMERCIAL_CORNER),
        "prime" => Some(PRIME_CORNER),
        "regular" | "" => Some(REGULAR_CORNER),
        _ => None,
    }
}

/// Lowercase, underscores to spaces, trimmed.
pub fn normalize_status_key(value: &str) -> String {
    value.to_lowercase().replace('_', " ").trim().to_string()
}

/// Status key for comparisons: `available` and `open` are the same state.
pub fn status_compare_key(value: &str) -> String {
    let key = normalize_status_key(value);
    if key == "available" {
        "open".to_string()
    } else {
        key
    }
}

pub fn format_status_label(value: &str) -> String {
    let key = normalize_status_key(value);
    lookup(STATUS_LABELS, &key)
        .map(str::to_string)
        .unwrap_or_else(|| to_title_case(&key))
}

/// Status stored in the lots table; `None` for an empty value.
pub fn status_storage_value(value: &str) -> Option<String> {
    let key = value.trim().to_lowercase();
    let canonical = match key.as_str() {
        "rsv" | "reserved" => "reserved".to_string(),
        "open" | "available" => "available".to_string(),
        "sold" => "sold".to_string(),
        "" => return None,
        _ => key,
    };
    Some(canonical)
}

/// Status applied by an explicit status change; unknown values reset to available.
pub fn status_update_value(value: &str) -> &'static str {
    match value.trim().to_lowercase().as_str() {
        "rsv" | "reserved" => "reserved",
        "sold" => "sold",
        _ => "available",
    }
}

fn lookup<'a>(table: &'a [(&str, &'a str)], key: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, label)| *label)
}
