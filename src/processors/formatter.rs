use chrono::NaiveDate;

use crate::utils::text::parse_loose_date;

/// Philippine peso amount, e.g. `₱1,234.50`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = group_thousands(&(cents / 100).to_string());
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}₱{whole}.{:02}", cents % 100)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Long date as shown in the inventory table, e.g. `October 18, 2026`.
///
/// Values that cannot be read as a date are shown unchanged.
pub fn format_date(value: &str) -> String {
    parse_loose_date(value)
        .and_then(|iso| NaiveDate::parse_from_str(&iso, "%Y-%m-%d").ok())
        .map(|date| date.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| value.to_string())
}
