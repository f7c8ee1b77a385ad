use std::path::Path;

use calamine::{open_workbook_auto, DataType, Reader};
use chrono::{NaiveDate, TimeDelta};
use tracing::debug;

use crate::models::{AppError, RawRow};

/// Converts the first worksheet into a matrix of display strings.
pub fn parse_excel_file(path: &Path) -> Result<Vec<RawRow>, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| AppError::Spreadsheet(format!("failed to open workbook: {err}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|err| AppError::Spreadsheet(format!("failed to read worksheet: {err}")))?;

    let rows: Vec<RawRow> = range
        .rows()
        .map(|row| row.iter().map(data_type_to_string).collect())
        .collect();

    debug!(rows = rows.len(), path = %path.display(), "worksheet loaded");
    Ok(rows)
}

fn data_type_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.clone(),
        DataType::Float(f) => format_number(*f),
        DataType::Int(v) => v.to_string(),
        DataType::Bool(v) => v.to_string(),
        DataType::DateTime(serial) => {
            excel_serial_to_date(*serial).unwrap_or_else(|| format_number(*serial))
        }
        DataType::Error(_) => String::new(),
        _ => cell.to_string(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// Excel serial day (1900 date system) to `YYYY-MM-DD`.
fn excel_serial_to_date(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Day 0 is 1899-12-30 once the phantom 1900-02-29 is accounted for.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(TimeDelta::try_days(serial.trunc() as i64)?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_render_like_the_sheet() {
        assert_eq!(data_type_to_string(&DataType::Float(120.0)), "120");
        assert_eq!(data_type_to_string(&DataType::Float(120.25)), "120.25");
        assert_eq!(data_type_to_string(&DataType::Int(3)), "3");
        assert_eq!(data_type_to_string(&DataType::Empty), "");
        assert_eq!(
            data_type_to_string(&DataType::String(" Lot # ".to_string())),
            " Lot # "
        );
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(excel_serial_to_date(45292.0).as_deref(), Some("2024-01-01"));
        assert_eq!(excel_serial_to_date(45292.75).as_deref(), Some("2024-01-01"));
        assert_eq!(excel_serial_to_date(0.5), None);
    }
}
