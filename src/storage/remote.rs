use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::merge::UpsertAction;
use crate::models::LotRecord;
use crate::processors::pricing::{CategoryPrices, PriceScope};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not signed in")]
    Unauthenticated,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

/// One row of the lots table as written by an upsert, keyed by
/// (`lot_no`, `phase`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotUpsert {
    pub lot_no: String,
    pub phase: Option<u32>,
    pub size_sqm: Option<f64>,
    pub price_per_sqm: Option<f64>,
    pub total: Option<f64>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub last_updated: Option<String>,
    pub user_id: Option<String>,
}

impl LotUpsert {
    /// Lot record view of a stored row, as the inventory table reads it.
    pub fn to_record(&self) -> LotRecord {
        let mut record = LotRecord::new(self.lot_no.clone(), self.phase);
        record.size = self.size_sqm.unwrap_or(0.0);
        record.category = self.category.clone().unwrap_or_default();
        record.status = self.status.clone().unwrap_or_default();
        record.last_updated = self.last_updated.clone();
        record.price_per_sqm = self.price_per_sqm;
        record.total = self.total;
        record
    }
}

/// Hosted record store: session lookup, the lots table and the price tables.
///
/// Calls are blocking; callers that need to stay responsive run them off the
/// thread that drives the import.
pub trait RemoteStore {
    fn current_user(&self) -> Result<Option<SessionUser>, StoreError>;

    fn fetch_lots(&self, project: &str) -> Result<Vec<LotRecord>, StoreError>;

    /// `None` when no price row exists for the scope yet.
    fn fetch_prices(&self, scope: &PriceScope) -> Result<Option<CategoryPrices>, StoreError>;

    fn save_prices(&self, scope: &PriceScope, prices: &CategoryPrices) -> Result<(), StoreError>;

    /// Updates the row matching (`lot_no`, `phase`) or inserts a new one.
    fn upsert_lot(&self, project: &str, lot: &LotUpsert) -> Result<UpsertAction, StoreError>;

    fn update_lot_status(
        &self,
        project: &str,
        lot_no: &str,
        phase: Option<u32>,
        status: &str,
        day: &str,
    ) -> Result<(), StoreError>;

    /// Deletes every lot of the project and returns how many were removed.
    fn clear_lots(&self, project: &str) -> Result<usize, StoreError>;
}
