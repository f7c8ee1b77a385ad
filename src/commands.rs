use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::diff::merge::{reconcile, Inventory};
use crate::models::{
    AppError, ImportBatch, ImportReport, LotRecord, PriceMap, PriceSaveReport, RawRow,
    RemoteSync, StatusChange,
};
use crate::parsers;
use crate::processors::pricing::{
    apply_prices, normalize_price_map, CategoryPrices, PhaseGroup, PriceScope,
};
use crate::processors::view::{
    filter_lots, sort_for_display, summarize, InventoryFilter, InventorySummary,
};
use crate::storage::sync::push_lots;
use crate::storage::{LocalCache, RemoteStore};
use crate::utils::canonical::status_update_value;

/// Entry points used by the command line and by embedding applications.
///
/// Local state lives in the [`LocalCache`]; the remote store is optional and
/// only written when it reports a signed-in session.
pub struct Workspace<'a> {
    config: AppConfig,
    cache: LocalCache,
    remote: Option<&'a dyn RemoteStore>,
}

impl<'a> Workspace<'a> {
    pub fn new(config: AppConfig, remote: Option<&'a dyn RemoteStore>) -> Self {
        let cache = config.local_cache();
        Self {
            config,
            cache,
            remote,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    // ------------------------------------------------------------------------
    // Import
    // ------------------------------------------------------------------------

    /// Imports a CSV or spreadsheet upload into a project's inventory.
    ///
    /// # Arguments
    /// * `project` - project code, e.g. `MVLC`
    /// * `path` - uploaded file
    ///
    /// # Returns
    /// Merge counts, the merged inventory and the remote outcome. The local
    /// inventory is saved before the remote store is contacted.
    pub fn import_file(&self, project: &str, path: &Path) -> Result<ImportReport, AppError> {
        let rows = parsers::read_inventory_rows(path)?;
        self.import_rows(project, rows)
    }

    pub fn import_text(&self, project: &str, text: &str) -> Result<ImportReport, AppError> {
        self.import_rows(project, parsers::parse_csv_text(text))
    }

    pub fn import_rows(&self, project: &str, rows: Vec<RawRow>) -> Result<ImportReport, AppError> {
        let batch = parsers::build_lot_batch(rows, self.config.import.header_scan_limit)?;
        self.import_batch(project, batch)
    }

    fn import_batch(&self, project: &str, batch: ImportBatch) -> Result<ImportReport, AppError> {
        for warning in &batch.warnings {
            warn!(project, "{}", warning.message());
        }

        let mut inventory = self.cache.load_inventory(project)?;
        let counts = reconcile(&mut inventory, &batch.records);
        self.apply_cached_prices(project, &mut inventory)?;
        self.cache.save_inventory(project, &inventory)?;

        let remote = match self.remote {
            Some(store) => {
                let merged: Vec<_> = batch
                    .records
                    .iter()
                    .filter_map(|record| inventory.get(&record.lot_number, record.phase))
                    .cloned()
                    .collect();
                push_lots(store, project, self.is_phase_priced(project), &merged)
            }
            None => RemoteSync::Skipped,
        };

        let report = ImportReport {
            project: project.to_string(),
            batch,
            counts,
            merged: inventory.into_records(),
            remote,
        };
        info!(project, "{}", report.summary());
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------------

    pub fn inventory(&self, project: &str) -> Result<Inventory, AppError> {
        self.cache.load_inventory(project)
    }

    /// Folds the remote lots table into the local inventory.
    ///
    /// Without a session the local inventory is returned unchanged.
    pub fn pull_remote(&self, project: &str) -> Result<Inventory, AppError> {
        let mut inventory = self.cache.load_inventory(project)?;
        let Some(store) = self.signed_in_store()? else {
            return Ok(inventory);
        };

        let lots = store.fetch_lots(project)?;
        let counts = reconcile(&mut inventory, &lots);
        self.cache.save_inventory(project, &inventory)?;
        info!(
            project,
            updated = counts.updated,
            inserted = counts.inserted,
            "remote lots pulled"
        );
        Ok(inventory)
    }

    /// Lots matching `filter`, in display order.
    pub fn list(
        &self,
        project: &str,
        filter: &InventoryFilter,
    ) -> Result<Vec<LotRecord>, AppError> {
        let inventory = self.cache.load_inventory(project)?;
        let mut shown = filter_lots(inventory.records(), filter);
        sort_for_display(&mut shown);
        Ok(shown.into_iter().cloned().collect())
    }

    pub fn summary(&self, project: &str) -> Result<InventorySummary, AppError> {
        Ok(summarize(self.cache.load_inventory(project)?.records()))
    }

    /// Sets one lot's status and stamps it with `day`.
    ///
    /// Unknown statuses become `available`. A remote failure leaves the local
    /// change in place and is reported in [`StatusChange::remote`].
    pub fn update_lot_status(
        &self,
        project: &str,
        lot_number: &str,
        phase: Option<u32>,
        status: &str,
        day: NaiveDate,
    ) -> Result<StatusChange, AppError> {
        let mut inventory = self.cache.load_inventory(project)?;
        let status = status_update_value(status);
        let day = day.format("%Y-%m-%d").to_string();

        let record = inventory
            .get_mut(lot_number, phase)
            .ok_or_else(|| AppError::LotNotFound {
                lot_number: lot_number.to_string(),
                phase,
            })?;
        record.status = status.to_string();
        record.last_updated = Some(day.clone());
        let record = record.clone();
        self.cache.save_inventory(project, &inventory)?;

        let remote = match self.signed_in_store() {
            Ok(Some(store)) => match store.update_lot_status(
                project,
                record.lot_number.trim(),
                phase,
                status,
                &day,
            ) {
                Ok(()) => RemoteSync::Completed {
                    updated: 1,
                    inserted: 0,
                },
                Err(err) => {
                    warn!(
                        project,
                        lot = %record.lot_number,
                        error = %err,
                        "remote status update failed"
                    );
                    RemoteSync::Failed {
                        completed: 0,
                        error: err.to_string(),
                    }
                }
            },
            Ok(None) => RemoteSync::Skipped,
            Err(err) => RemoteSync::Failed {
                completed: 0,
                error: err.to_string(),
            },
        };

        Ok(StatusChange { record, remote })
    }

    /// Deletes a project's inventory locally and, with a session, remotely.
    ///
    /// # Returns
    /// Number of lots removed from the local inventory.
    pub fn clear_inventory(&self, project: &str) -> Result<usize, AppError> {
        let removed = self.cache.clear_inventory(project)?;
        if let Some(store) = self.signed_in_store()? {
            let remote_removed = store.clear_lots(project)?;
            info!(project, remote_removed, "remote lots cleared");
        }
        info!(project, removed, "inventory cleared");
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Prices
    // ------------------------------------------------------------------------

    /// Scopes addressed by a save request; phase-priced projects need a slug.
    pub fn price_scopes(
        &self,
        project: &str,
        slug: Option<&str>,
    ) -> Result<Vec<PriceScope>, AppError> {
        if !self.is_phase_priced(project) {
            return Ok(vec![PriceScope::project(project)]);
        }
        let slug = slug.ok_or_else(|| AppError::UnknownScope(String::new()))?;
        Ok(PhaseGroup::parse_slug(slug)?
            .into_iter()
            .map(|group| PriceScope::phase(project, group))
            .collect())
    }

    /// Saves a category price table, prices the matching lots and syncs it.
    pub fn save_category_prices(
        &self,
        project: &str,
        slug: Option<&str>,
        prices: &PriceMap,
    ) -> Result<PriceSaveReport, AppError> {
        let scopes = self.price_scopes(project, slug)?;
        let prices = normalize_price_map(prices);
        let phase_priced = self.is_phase_priced(project);

        let mut inventory = self.cache.load_inventory(project)?;
        let mut priced = 0;
        for scope in &scopes {
            self.cache.save_prices(scope, &prices)?;
            priced += apply_prices(&mut inventory, project, phase_priced, scope, &prices);
        }
        self.cache.save_inventory(project, &inventory)?;

        let remote = match self.signed_in_store() {
            Ok(Some(store)) => {
                let row = CategoryPrices::from_price_map(&prices);
                let mut saved = 0;
                let mut failure = None;
                for scope in &scopes {
                    match store.save_prices(scope, &row) {
                        Ok(()) => saved += 1,
                        Err(err) => {
                            warn!(scope = %scope, error = %err, "remote price save failed");
                            failure = Some(err.to_string());
                            break;
                        }
                    }
                }
                match failure {
                    Some(error) => RemoteSync::Failed {
                        completed: saved,
                        error,
                    },
                    None => RemoteSync::Completed {
                        updated: saved,
                        inserted: 0,
                    },
                }
            }
            Ok(None) => RemoteSync::Skipped,
            Err(err) => RemoteSync::Failed {
                completed: 0,
                error: err.to_string(),
            },
        };

        let report = PriceSaveReport {
            scopes: scopes.iter().map(PriceScope::to_string).collect(),
            priced,
            remote,
        };
        info!(project, priced, "{}", report.summary());
        Ok(report)
    }

    pub fn is_phase_priced(&self, project: &str) -> bool {
        self.config.is_phase_priced(project)
    }

    fn apply_cached_prices(
        &self,
        project: &str,
        inventory: &mut Inventory,
    ) -> Result<(), AppError> {
        let phase_priced = self.is_phase_priced(project);
        let scopes = if phase_priced {
            vec![
                PriceScope::phase(project, PhaseGroup::Phase1),
                PriceScope::phase(project, PhaseGroup::Phase2),
                PriceScope::phase(project, PhaseGroup::Phase3),
            ]
        } else {
            vec![PriceScope::project(project)]
        };
        for scope in &scopes {
            let prices = self.cache.load_prices(scope)?;
            if !prices.is_empty() {
                apply_prices(inventory, project, phase_priced, scope, &prices);
            }
        }
        Ok(())
    }

    fn signed_in_store(&self) -> Result<Option<&'a dyn RemoteStore>, AppError> {
        match self.remote {
            Some(store) => Ok(store.current_user()?.map(|_| store)),
            None => Ok(None),
        }
    }
}
