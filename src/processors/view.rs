use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::LotRecord;
use crate::utils::canonical::{normalize_category_key, status_compare_key};

/// Inventory table filters; `None` means "all".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryFilter {
    pub category: Option<String>,
    pub status: Option<String>,
    /// `phase-N` as offered by the phase selector.
    pub phase: Option<String>,
}

impl InventoryFilter {
    pub fn matches(&self, record: &LotRecord) -> bool {
        self.category_matches(record) && self.status_matches(record) && self.phase_matches(record)
    }

    fn category_matches(&self, record: &LotRecord) -> bool {
        let Some(wanted) = selected(&self.category) else {
            return true;
        };
        let wanted = normalize_category_key(wanted);
        let actual = normalize_category_key(&record.category);
        actual == wanted
            || (wanted == "commercial"
                && actual.starts_with("commercial")
                && actual != "commercial corner")
    }

    fn status_matches(&self, record: &LotRecord) -> bool {
        match selected(&self.status) {
            Some(wanted) => status_compare_key(&record.status) == status_compare_key(wanted),
            None => true,
        }
    }

    fn phase_matches(&self, record: &LotRecord) -> bool {
        let Some(wanted) = selected(&self.phase) else {
            return true;
        };
        match record.phase {
            Some(phase) if phase > 0 => format!("phase-{phase}") == wanted.to_lowercase(),
            _ => false,
        }
    }
}

fn selected(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

pub fn filter_lots<'a>(records: &'a [LotRecord], filter: &InventoryFilter) -> Vec<&'a LotRecord> {
    records.iter().filter(|record| filter.matches(record)).collect()
}

/// Phase ascending (lots without a phase last), then natural lot-number order.
pub fn sort_for_display(records: &mut [&LotRecord]) {
    records.sort_by(|a, b| {
        let phase_a = a.phase.unwrap_or(u32::MAX);
        let phase_b = b.phase.unwrap_or(u32::MAX);
        phase_a
            .cmp(&phase_b)
            .then_with(|| natural_cmp(&a.lot_number, &b.lot_number))
    });
}

/// Case-insensitive comparison where digit runs compare by value (`A-2` < `A-10`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_digits(&mut left);
                let rn = take_digits(&mut right);
                let by_value = ln
                    .trim_start_matches('0')
                    .len()
                    .cmp(&rn.trim_start_matches('0').len())
                    .then_with(|| ln.trim_start_matches('0').cmp(rn.trim_start_matches('0')));
                if by_value != Ordering::Equal {
                    return by_value;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

/// Dashboard figures for one inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub available: usize,
    pub reserved: usize,
    pub sold: usize,
    pub other: usize,
    /// Sum of totals of sold lots.
    pub revenue: f64,
}

pub fn summarize(records: &[LotRecord]) -> InventorySummary {
    let mut summary = InventorySummary::default();
    for record in records {
        match status_compare_key(&record.status).as_str() {
            "open" => summary.available += 1,
            "reserved" | "rsv" => summary.reserved += 1,
            "sold" => {
                summary.sold += 1;
                summary.revenue += record.total.unwrap_or(0.0);
            }
            _ => summary.other += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(number: &str, phase: Option<u32>, category: &str, status: &str) -> LotRecord {
        let mut record = LotRecord::new(number, phase);
        record.category = category.to_string();
        record.status = status.to_string();
        record
    }

    #[test]
    fn test_filter_by_status_treats_available_as_open() {
        let records = vec![
            lot("A-1", Some(1), "Regular", "available"),
            lot("A-2", Some(1), "Regular", "Sold"),
        ];
        let filter = InventoryFilter {
            status: Some("open".to_string()),
            ..InventoryFilter::default()
        };
        let shown = filter_lots(&records, &filter);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].lot_number, "A-1");
    }

    #[test]
    fn test_commercial_filter_excludes_commercial_corner() {
        let records = vec![
            lot("C-1", Some(2), "Commercial", "Open"),
            lot("C-2", Some(2), "commercial_corner", "Open"),
            lot("C-3", Some(2), "Commercial Lot", "Open"),
            lot("C-4", Some(2), "Prime", "Open"),
        ];
        let filter = InventoryFilter {
            category: Some("Commercial".to_string()),
            ..InventoryFilter::default()
        };
        let shown: Vec<&str> = filter_lots(&records, &filter)
            .iter()
            .map(|r| r.lot_number.as_str())
            .collect();
        assert_eq!(shown, vec!["C-1", "C-3"]);
    }

    #[test]
    fn test_phase_filter() {
        let records = vec![lot("A-1", Some(1), "", ""), lot("A-2", Some(2), "", "")];
        let filter = InventoryFilter {
            phase: Some("Phase-2".to_string()),
            ..InventoryFilter::default()
        };
        assert_eq!(filter_lots(&records, &filter)[0].lot_number, "A-2");
        assert_eq!(filter_lots(&records, &InventoryFilter::default()).len(), 2);
    }

    #[test]
    fn test_sort_for_display() {
        let records = vec![
            lot("A-10", Some(2), "", ""),
            lot("A-2", Some(2), "", ""),
            lot("Z-1", None, "", ""),
            lot("b-1", Some(1), "", ""),
        ];
        let mut view: Vec<&LotRecord> = records.iter().collect();
        sort_for_display(&mut view);
        let order: Vec<&str> = view.iter().map(|r| r.lot_number.as_str()).collect();
        assert_eq!(order, vec!["b-1", "A-2", "A-10", "Z-1"]);
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("A-2", "a-10"), Ordering::Less);
        assert_eq!(natural_cmp("A-010", "a-10"), Ordering::Equal);
        assert_eq!(natural_cmp("B", "A"), Ordering::Greater);
    }

    #[test]
    fn test_summarize() {
        let mut sold = lot("A-1", Some(1), "Regular", "Sold");
        sold.total = Some(100_000.0);
        let records = vec![
            sold,
            lot("A-2", Some(1), "Regular", "Open"),
            lot("A-3", Some(1), "Regular", "available"),
            lot("A-4", Some(1), "Regular", "Reserved"),
            lot("A-5", Some(1), "Regular", "On Hold"),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.available, 2);
        assert_eq!(summary.reserved, 1);
        assert_eq!(summary.sold, 1);
        assert_eq!(summary.other, 1);
        assert_eq!(summary.revenue, 100_000.0);
    }
}
