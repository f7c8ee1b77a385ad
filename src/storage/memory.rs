use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::diff::merge::UpsertAction;
use crate::models::LotRecord;
use crate::processors::pricing::{CategoryPrices, PriceScope};
use crate::storage::remote::{LotUpsert, RemoteStore, SessionUser, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    user: Option<SessionUser>,
    lots: HashMap<String, Vec<LotUpsert>>,
    prices: HashMap<String, CategoryPrices>,
    fail_upsert_at: Option<usize>,
    upsert_calls: usize,
}

/// In-process [`RemoteStore`], used offline and in tests.
///
/// Rows are matched on the exact `lot_no` and `phase`, as the hosted
/// table's equality filters do.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.user = Some(SessionUser {
                id: user_id.into(),
                name: None,
                role: None,
            });
        }
        store
    }

    /// Makes the `n`-th upsert (0-based, counted from now) fail.
    pub fn fail_upsert_at(&self, n: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_upsert_at = Some(state.upsert_calls + n);
        }
    }

    pub fn rows(&self, project: &str) -> Vec<LotUpsert> {
        self.state
            .lock()
            .map(|state| state.lots.get(project).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn set_prices(&self, scope: &PriceScope, prices: CategoryPrices) {
        if let Ok(mut state) = self.state.lock() {
            state.prices.insert(scope.to_string(), prices);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl RemoteStore for MemoryStore {
    fn current_user(&self) -> Result<Option<SessionUser>, StoreError> {
        Ok(self.lock()?.user.clone())
    }

    fn fetch_lots(&self, project: &str) -> Result<Vec<LotRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .lots
            .get(project)
            .map(|rows| rows.iter().map(LotUpsert::to_record).collect())
            .unwrap_or_default())
    }

    fn fetch_prices(&self, scope: &PriceScope) -> Result<Option<CategoryPrices>, StoreError> {
        Ok(self.lock()?.prices.get(&scope.to_string()).cloned())
    }

    fn save_prices(&self, scope: &PriceScope, prices: &CategoryPrices) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.user.is_none() {
            return Err(StoreError::Unauthenticated);
        }
        state.prices.insert(scope.to_string(), prices.clone());
        Ok(())
    }

    fn upsert_lot(&self, project: &str, lot: &LotUpsert) -> Result<UpsertAction, StoreError> {
        let mut state = self.lock()?;
        let call = state.upsert_calls;
        state.upsert_calls += 1;
        if state.fail_upsert_at == Some(call) {
            return Err(StoreError::Rejected(format!(
                "upsert of lot '{}' refused",
                lot.lot_no
            )));
        }

        let rows = state.lots.entry(project.to_string()).or_default();
        match rows
            .iter_mut()
            .find(|row| row.lot_no == lot.lot_no && row.phase == lot.phase)
        {
            Some(row) => {
                *row = lot.clone();
                Ok(UpsertAction::Updated)
            }
            None => {
                rows.push(lot.clone());
                Ok(UpsertAction::Inserted)
            }
        }
    }

    fn update_lot_status(
        &self,
        project: &str,
        lot_no: &str,
        phase: Option<u32>,
        status: &str,
        day: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let row = state
            .lots
            .get_mut(project)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row.lot_no == lot_no && row.phase == phase)
            })
            .ok_or_else(|| StoreError::Rejected(format!("lot '{lot_no}' does not exist")))?;
        row.status = Some(status.to_string());
        row.last_updated = Some(day.to_string());
        Ok(())
    }

    fn clear_lots(&self, project: &str) -> Result<usize, StoreError> {
        let mut state = self.lock()?;
        Ok(state.lots.remove(project).map(|rows| rows.len()).unwrap_or(0))
    }
}
