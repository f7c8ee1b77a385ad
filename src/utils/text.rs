use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Upper-cases the first letter of each space-separated word.
pub fn to_title_case(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First run of ASCII digits in the text, parsed as an integer.
///
/// `None` also when the run does not fit in a `u32`.
pub fn first_digit_run(input: &str) -> Option<u32> {
    let start = input.find(|c: char| c.is_ascii_digit())?;
    let digits: String = input[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parses a numeric cell such as `"1,250.5 sqm"`.
///
/// Everything except digits, `.` and `-` is dropped, then the longest leading
/// decimal literal is read. Anything unreadable becomes `0`.
pub fn parse_size(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    parse_leading_float(&cleaned).unwrap_or(0.0)
}

fn parse_leading_float(input: &str) -> Option<f64> {
    let bytes = input.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    input[..end].trim_end_matches('.').parse().ok()
}

/// Reads the date formats spreadsheets and people tend to type and returns
/// it as `YYYY-MM-DD`.
pub fn parse_loose_date(input: &str) -> Option<String> {
    let value = input.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive().format("%Y-%m-%d").to_string());
    }

    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.date().format("%Y-%m-%d").to_string());
        }
    }

    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%m-%d-%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%d %b %Y",
    ];
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Control characters other than tab and newline usually mean a broken export.
pub fn find_invalid_char(cell: &str) -> Option<char> {
    cell.chars()
        .find(|c| c.is_control() && *c != '\t' && *c != '\n')
}
