use std::collections::HashMap;

use tracing::{info, warn};

use crate::diff::merge::UpsertAction;
use crate::models::{LotRecord, PriceMap, RemoteSync};
use crate::processors::pricing::{normalize_price_map, price_for, total_for, PriceScope};
use crate::storage::remote::{LotUpsert, RemoteStore};
use crate::utils::canonical::{category_storage_key, status_storage_value};
use crate::utils::text::parse_loose_date;

/// Converts a record into the lots-table row written for it.
///
/// # Arguments
/// * `record` - merged lot record
/// * `prices` - price table of the record's scope, if one was fetched
/// * `user_id` - id of the signed-in user
///
/// # Returns
/// `None` for a record without a lot number.
pub fn build_upsert(
    record: &LotRecord,
    prices: Option<&PriceMap>,
    user_id: &str,
) -> Option<LotUpsert> {
    let lot_no = record.lot_number.trim();
    if lot_no.is_empty() {
        return None;
    }

    let price_per_sqm = prices
        .and_then(|map| price_for(record, map))
        .or(record.price_per_sqm);
    let category = category_storage_key(&record.category);

    Some(LotUpsert {
        lot_no: lot_no.to_string(),
        phase: record.phase,
        size_sqm: (record.size.is_finite() && record.size > 0.0).then_some(record.size),
        price_per_sqm,
        total: total_for(price_per_sqm, record.size),
        category: (!category.is_empty()).then_some(category),
        status: status_storage_value(&record.status),
        last_updated: record.last_updated.as_deref().and_then(parse_loose_date),
        user_id: Some(user_id.to_string()),
    })
}

/// Pushes records to the remote store one at a time.
///
/// Skipped without a signed-in session. Price tables are fetched once per
/// scope before any row is written; a failed fetch leaves those rows with
/// their local prices. The first failing upsert stops the run, and the rows
/// written before it stay written.
pub fn push_lots(
    store: &dyn RemoteStore,
    project: &str,
    phase_priced: bool,
    records: &[LotRecord],
) -> RemoteSync {
    let user = match store.current_user() {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!(project, "no signed-in session, remote sync skipped");
            return RemoteSync::Skipped;
        }
        Err(err) => {
            warn!(project, error = %err, "session lookup failed, remote sync skipped");
            return RemoteSync::Skipped;
        }
    };

    let mut tables: HashMap<PriceScope, Option<PriceMap>> = HashMap::new();
    for record in records {
        let scope = PriceScope::for_lot(project, phase_priced, record.phase);
        if tables.contains_key(&scope) {
            continue;
        }
        let table = match store.fetch_prices(&scope) {
            Ok(prices) => prices.map(|row| normalize_price_map(&row.to_price_map())),
            Err(err) => {
                warn!(scope = %scope, error = %err, "price table unavailable");
                None
            }
        };
        tables.insert(scope, table);
    }

    let mut updated = 0;
    let mut inserted = 0;
    for record in records {
        let scope = PriceScope::for_lot(project, phase_priced, record.phase);
        let prices = tables.get(&scope).and_then(Option::as_ref);
        let Some(row) = build_upsert(record, prices, &user.id) else {
            continue;
        };

        match store.upsert_lot(project, &row) {
            Ok(UpsertAction::Updated) => updated += 1,
            Ok(UpsertAction::Inserted) => inserted += 1,
            Err(err) => {
                warn!(
                    project,
                    lot = %row.lot_no,
                    completed = updated + inserted,
                    error = %err,
                    "remote sync stopped"
                );
                return RemoteSync::Failed {
                    completed: updated + inserted,
                    error: err.to_string(),
                };
            }
        }
    }

    info!(project, updated, inserted, "remote sync finished");
    RemoteSync::Completed { updated, inserted }
}
