use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{lot_key, LotRecord, MergeCounts};
use crate::processors::pricing::total_for;
use crate::utils::canonical::normalize_category_key;

/// A project's lots, at most one per (lowercased lot number, phase).
///
/// Order follows first insertion; it only matters for stable rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LotRecord>", into = "Vec<LotRecord>")]
pub struct Inventory {
    records: Vec<LotRecord>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Updated,
    Inserted,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LotRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LotRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<LotRecord> {
        self.records
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, lot_number: &str, phase: Option<u32>) -> Option<&LotRecord> {
        self.index
            .get(&lot_key(lot_number, phase))
            .map(|&idx| &self.records[idx])
    }

    pub fn get_mut(&mut self, lot_number: &str, phase: Option<u32>) -> Option<&mut LotRecord> {
        let idx = *self.index.get(&lot_key(lot_number, phase))?;
        self.records.get_mut(idx)
    }

    /// Mutable access to every record. Lot numbers and phases must not be
    /// changed through it; the key index is not rebuilt.
    pub fn records_mut(&mut self) -> std::slice::IterMut<'_, LotRecord> {
        self.records.iter_mut()
    }

    /// Shallow-merges onto the record with the same key, or appends.
    pub fn upsert(&mut self, candidate: LotRecord) -> UpsertAction {
        let key = candidate.key();
        match self.index.get(&key) {
            Some(&idx) => {
                merge_record(&mut self.records[idx], candidate);
                UpsertAction::Updated
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(candidate);
                UpsertAction::Inserted
            }
        }
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.index.clear();
        removed
    }
}

impl From<Vec<LotRecord>> for Inventory {
    /// Records sharing a key collapse into the first one, later values winning.
    fn from(records: Vec<LotRecord>) -> Self {
        let mut inventory = Inventory::new();
        for record in records {
            inventory.upsert(record);
        }
        inventory
    }
}

impl From<Inventory> for Vec<LotRecord> {
    fn from(inventory: Inventory) -> Self {
        inventory.records
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a LotRecord;
    type IntoIter = std::slice::Iter<'a, LotRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Copies the imported fields of `candidate` over `target`.
///
/// Imported fields are taken as they are, empty values included. Derived
/// prices and unmodelled fields are only replaced when the candidate has them;
/// otherwise a category change drops the stored price and a size change
/// recomputes the total.
pub fn merge_record(target: &mut LotRecord, candidate: LotRecord) {
    let category_changed =
        normalize_category_key(&target.category) != normalize_category_key(&candidate.category);
    let size_changed = target.size != candidate.size;

    target.lot_number = candidate.lot_number;
    target.phase = candidate.phase;
    target.size = candidate.size;
    target.category = candidate.category;
    target.status = candidate.status;
    target.last_updated = candidate.last_updated;

    if candidate.price_per_sqm.is_some() {
        target.price_per_sqm = candidate.price_per_sqm;
    } else if category_changed {
        target.price_per_sqm = None;
    }
    if candidate.total.is_some() {
        target.total = candidate.total;
    } else if category_changed || size_changed {
        target.total = total_for(target.price_per_sqm, target.size);
    }
    target.extra.extend(candidate.extra);
}

/// Folds an import batch into an inventory.
///
/// # Arguments
/// * `inventory` - current inventory of the project
/// * `candidates` - normalized records from the upload
///
/// # Returns
/// Update and insert counts; `inventory` holds the merged state. Re-applying
/// the same candidates reports every record as updated and changes nothing.
pub fn reconcile(inventory: &mut Inventory, candidates: &[LotRecord]) -> MergeCounts {
    let mut counts = MergeCounts::default();

    for candidate in candidates {
        match inventory.upsert(candidate.clone()) {
            UpsertAction::Updated => counts.updated += 1,
            UpsertAction::Inserted => counts.inserted += 1,
        }
    }

    debug!(
        updated = counts.updated,
        inserted = counts.inserted,
        total = inventory.len(),
        "inventory reconciled"
    );
    counts
}
