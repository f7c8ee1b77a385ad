use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::merge::Inventory;
use crate::models::{AppError, LotRecord, PriceMap};
use crate::utils::canonical::normalize_category_key;

/// Price table group for projects that price each phase separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseGroup {
    Phase1,
    Phase2,
    Phase3,
}

impl PhaseGroup {
    /// Phase 1 and 2 have their own tables; every other phase uses phase 3's.
    pub fn for_phase(phase: u32) -> Self {
        match phase {
            1 => PhaseGroup::Phase1,
            2 => PhaseGroup::Phase2,
            _ => PhaseGroup::Phase3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseGroup::Phase1 => "phase1",
            PhaseGroup::Phase2 => "phase2",
            PhaseGroup::Phase3 => "phase3",
        }
    }

    pub fn phase_number(&self) -> u32 {
        match self {
            PhaseGroup::Phase1 => 1,
            PhaseGroup::Phase2 => 2,
            PhaseGroup::Phase3 => 3,
        }
    }

    /// Groups addressed by a scope slug; the legacy `phase13` means 1 and 3.
    pub fn parse_slug(slug: &str) -> Result<Vec<PhaseGroup>, AppError> {
        match slug.trim().to_lowercase().as_str() {
            "phase1" => Ok(vec![PhaseGroup::Phase1]),
            "phase2" => Ok(vec![PhaseGroup::Phase2]),
            "phase3" => Ok(vec![PhaseGroup::Phase3]),
            "phase13" => Ok(vec![PhaseGroup::Phase1, PhaseGroup::Phase3]),
            other => Err(AppError::UnknownScope(other.to_string())),
        }
    }
}

/// Which price table applies: a project, and for phase-priced projects a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceScope {
    pub project: String,
    pub group: Option<PhaseGroup>,
}

impl PriceScope {
    pub fn project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            group: None,
        }
    }

    pub fn phase(project: impl Into<String>, group: PhaseGroup) -> Self {
        Self {
            project: project.into(),
            group: Some(group),
        }
    }

    /// Scope of a lot: phase-priced projects use the lot's phase group (a lot
    /// without a phase falls into phase 3), others the project table.
    pub fn for_lot(project: &str, phase_priced: bool, phase: Option<u32>) -> Self {
        if phase_priced {
            Self::phase(project, PhaseGroup::for_phase(phase.unwrap_or(0)))
        } else {
            Self::project(project)
        }
    }

    pub fn contains(&self, project: &str, phase_priced: bool, record: &LotRecord) -> bool {
        *self == Self::for_lot(project, phase_priced, record.phase)
    }
}

impl fmt::Display for PriceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.group {
            Some(group) => write!(f, "{}_{}", self.project, group.as_str()),
            None => write!(f, "{}", self.project),
        }
    }
}

/// Row shape of the per-phase price table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrices {
    pub regular: Option<f64>,
    pub prime: Option<f64>,
    pub regular_corner: Option<f64>,
    pub prime_corner: Option<f64>,
    pub commercial: Option<f64>,
    pub commercial_corner: Option<f64>,
}

impl CategoryPrices {
    fn columns(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("regular", self.regular),
            ("prime", self.prime),
            ("regular corner", self.regular_corner),
            ("prime corner", self.prime_corner),
            ("commercial", self.commercial),
            ("commercial corner", self.commercial_corner),
        ]
    }

    pub fn to_price_map(&self) -> PriceMap {
        self.columns()
            .into_iter()
            .filter_map(|(key, value)| value.map(|price| (key.to_string(), price)))
            .collect()
    }

    /// Only the six table columns are kept; other categories stay local.
    pub fn from_price_map(map: &PriceMap) -> Self {
        let price = |key: &str| map.get(key).copied();
        Self {
            regular: price("regular"),
            prime: price("prime"),
            regular_corner: price("regular corner"),
            prime_corner: price("prime corner"),
            commercial: price("commercial"),
            commercial_corner: price("commercial corner"),
        }
    }
}

/// Re-keys a price map with normalized category keys, dropping negative or
/// non-finite prices.
pub fn normalize_price_map(map: &PriceMap) -> PriceMap {
    map.iter()
        .filter(|(_, price)| price.is_finite() && **price >= 0.0)
        .map(|(key, price)| (normalize_category_key(key), *price))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Price per square metre of a lot's category, when the table has one.
pub fn price_for(record: &LotRecord, prices: &PriceMap) -> Option<f64> {
    prices.get(&normalize_category_key(&record.category)).copied()
}

/// Total contract price; `None` without a price or a usable size.
pub fn total_for(price_per_sqm: Option<f64>, size: f64) -> Option<f64> {
    match price_per_sqm {
        Some(price) if size > 0.0 => Some(price * size),
        _ => None,
    }
}

/// Sets price and total on every record in `scope` whose category is priced.
/// Records in `scope` whose category has no price lose their stored price.
///
/// # Returns
/// Number of records that received a price.
pub fn apply_prices(
    inventory: &mut Inventory,
    project: &str,
    phase_priced: bool,
    scope: &PriceScope,
    prices: &PriceMap,
) -> usize {
    let mut priced = 0;
    for record in inventory.records_mut() {
        if !scope.contains(project, phase_priced, record) {
            continue;
        }
        let price = price_for(record, prices);
        record.price_per_sqm = price;
        record.total = total_for(price, record.size);
        if price.is_some() {
            priced += 1;
        }
    }
    priced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(number: &str, phase: Option<u32>, category: &str, size: f64) -> LotRecord {
        let mut record = LotRecord::new(number, phase);
        record.category = category.to_string();
        record.size = size;
        record
    }

    #[test]
    fn test_phase_groups() {
        assert_eq!(PhaseGroup::for_phase(1), PhaseGroup::Phase1);
        assert_eq!(PhaseGroup::for_phase(2), PhaseGroup::Phase2);
        assert_eq!(PhaseGroup::for_phase(7), PhaseGroup::Phase3);
        assert_eq!(
            PhaseGroup::parse_slug("phase13").unwrap(),
            vec![PhaseGroup::Phase1, PhaseGroup::Phase3]
        );
        assert!(PhaseGroup::parse_slug("phase9").is_err());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(
            PriceScope::phase("MVLC", PhaseGroup::Phase2).to_string(),
            "MVLC_phase2"
        );
        assert_eq!(PriceScope::project("SRH").to_string(), "SRH");
    }

    #[test]
    fn test_category_prices_round_trip_through_map() {
        let prices = CategoryPrices {
            regular: Some(1000.0),
            prime_corner: Some(1500.0),
            ..CategoryPrices::default()
        };
        let map = prices.to_price_map();
        assert_eq!(map.get("prime corner"), Some(&1500.0));
        assert_eq!(map.len(), 2);
        assert_eq!(CategoryPrices::from_price_map(&map), prices);
    }

    #[test]
    fn test_normalize_price_map() {
        let map: PriceMap = [
            ("Prime_Corner".to_string(), 1500.0),
            ("regular".to_string(), -1.0),
            ("".to_string(), 10.0),
        ]
        .into_iter()
        .collect();
        let normalized = normalize_price_map(&map);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized.get("prime corner"), Some(&1500.0));
    }

    #[test]
    fn test_apply_prices_only_in_scope() {
        let mut inventory = Inventory::from(vec![
            lot("A-1", Some(1), "Regular Corner", 100.0),
            lot("A-2", Some(2), "Regular Corner", 100.0),
            lot("A-3", Some(1), "Golf View", 100.0),
        ]);
        let prices: PriceMap = [("regular corner".to_string(), 2000.0)].into_iter().collect();
        let scope = PriceScope::phase("MVLC", PhaseGroup::Phase1);

        let priced = apply_prices(&mut inventory, "MVLC", true, &scope, &prices);

        assert_eq!(priced, 1);
        let first = inventory.get("A-1", Some(1)).unwrap();
        assert_eq!(first.price_per_sqm, Some(2000.0));
        assert_eq!(first.total, Some(200_000.0));
        assert_eq!(inventory.get("A-2", Some(2)).unwrap().price_per_sqm, None);
    }

    #[test]
    fn test_apply_prices_clears_unpriced_categories_in_scope() {
        let mut stale = lot("A-1", Some(1), "Golf View", 200.0);
        stale.price_per_sqm = Some(1000.0);
        stale.total = Some(100_000.0);
        let mut other_phase = lot("A-2", Some(2), "Golf View", 100.0);
        other_phase.price_per_sqm = Some(800.0);
        other_phase.total = Some(80_000.0);
        let mut inventory = Inventory::from(vec![stale, other_phase]);
        let prices: PriceMap = [("regular".to_string(), 1000.0)].into_iter().collect();
        let scope = PriceScope::phase("MVLC", PhaseGroup::Phase1);

        assert_eq!(apply_prices(&mut inventory, "MVLC", true, &scope, &prices), 0);

        let cleared = inventory.get("A-1", Some(1)).unwrap();
        assert_eq!(cleared.price_per_sqm, None);
        assert_eq!(cleared.total, None);
        assert_eq!(inventory.get("A-2", Some(2)).unwrap().total, Some(80_000.0));
    }

    #[test]
    fn test_project_scope_prices_every_phase() {
        let mut inventory = Inventory::from(vec![
            lot("B-1", Some(1), "Prime", 50.0),
            lot("B-2", None, "prime", 0.0),
        ]);
        let prices: PriceMap = [("prime".to_string(), 900.0)].into_iter().collect();
        let scope = PriceScope::project("SRH");

        assert_eq!(apply_prices(&mut inventory, "SRH", false, &scope, &prices), 2);
        assert_eq!(inventory.get("B-1", Some(1)).unwrap().total, Some(45_000.0));
        assert_eq!(inventory.get("B-2", None).unwrap().total, None);
    }
}
