use std::fs;
use std::path::Path;

use tracing::debug;

use crate::models::{AppError, RawRow};

use super::delimiter::detect_delimiter;

/// Reads a CSV file as UTF-8 text (a leading byte-order mark is dropped) and
/// splits it into rows.
pub fn parse_csv_file(path: &Path) -> Result<Vec<RawRow>, AppError> {
    let bytes = fs::read(path).map_err(|err| AppError::io(path, err))?;
    let text = String::from_utf8(bytes)?;
    Ok(parse_csv_text(&text))
}

/// Splits CSV text into rows using the sniffed delimiter.
pub fn parse_csv_text(text: &str) -> Vec<RawRow> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let delimiter = detect_delimiter(text);
    let rows = tokenize(text, delimiter);
    debug!(delimiter = ?delimiter, rows = rows.len(), "csv tokenized");
    rows
}

/// RFC 4180 style tokenizer.
///
/// * `"` enters or leaves quoted mode; `""` inside quotes is a literal quote.
/// * Outside quotes the delimiter ends a field and `\n` ends a row.
/// * `\r` is dropped everywhere, including inside quoted fields.
/// * An unterminated quote keeps the rest of the input in the last field.
/// * A trailing field or row without a final newline is kept; a final newline
///   does not produce an extra empty row.
pub fn tokenize(text: &str, delimiter: char) -> Vec<RawRow> {
    let mut rows: Vec<RawRow> = Vec::new();
    let mut row: RawRow = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        // TODO: confirm with the sales team whether literal CR inside quoted
        // cells should survive once Mac-exported files are seen in practice.
        if ch == '\r' {
            continue;
        }

        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        if ch == '"' {
            in_quotes = true;
        } else if ch == delimiter {
            row.push(std::mem::take(&mut field));
        } else if ch == '\n' {
            row.push(std::mem::take(&mut field));
            rows.push(std::mem::take(&mut row));
        } else {
            field.push(ch);
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
