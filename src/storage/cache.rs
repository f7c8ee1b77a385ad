use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::diff::merge::Inventory;
use crate::models::{AppError, PriceMap};
use crate::processors::pricing::PriceScope;

/// Per-project JSON files that hold the working inventory and price tables
/// between runs. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn inventory_path(&self, project: &str) -> PathBuf {
        self.dir
            .join(format!("inventory_{}.json", sanitize_label(project)))
    }

    pub fn prices_path(&self, scope: &PriceScope) -> PathBuf {
        let name = match scope.group {
            Some(group) => format!("prices_{}_{}.json", sanitize_label(&scope.project), group.as_str()),
            None => format!("prices_{}.json", sanitize_label(&scope.project)),
        };
        self.dir.join(name)
    }

    pub fn load_inventory(&self, project: &str) -> Result<Inventory, AppError> {
        Ok(read_json(&self.inventory_path(project))?.unwrap_or_default())
    }

    pub fn save_inventory(&self, project: &str, inventory: &Inventory) -> Result<(), AppError> {
        write_json(&self.inventory_path(project), inventory)
    }

    /// Removes the project's inventory file, returning how many lots it held.
    pub fn clear_inventory(&self, project: &str) -> Result<usize, AppError> {
        let path = self.inventory_path(project);
        let removed = self.load_inventory(project)?.len();
        match fs::remove_file(&path) {
            Ok(()) => Ok(removed),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
            Err(err) => Err(AppError::io(path, err)),
        }
    }

    pub fn load_prices(&self, scope: &PriceScope) -> Result<PriceMap, AppError> {
        Ok(read_json(&self.prices_path(scope))?.unwrap_or_default())
    }

    pub fn save_prices(&self, scope: &PriceScope, prices: &PriceMap) -> Result<(), AppError> {
        write_json(&self.prices_path(scope), prices)
    }
}

/// Keeps ASCII alphanumerics and replaces everything else with `-`.
fn sanitize_label(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .trim_matches('-')
        .to_owned();

    if sanitized.is_empty() {
        "project".to_string()
    } else {
        sanitized
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AppError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(AppError::io(path, err)),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&content)?))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| AppError::io(parent, err))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).map_err(|err| AppError::io(path, err))?;
    debug!(path = %path.display(), "cache written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LotRecord;
    use crate::processors::pricing::PhaseGroup;

    #[test]
    fn test_missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        assert!(cache.load_inventory("MVLC").unwrap().is_empty());
        assert!(cache
            .load_prices(&PriceScope::project("MVLC"))
            .unwrap()
            .is_empty());
        assert_eq!(cache.clear_inventory("MVLC").unwrap(), 0);
    }

    #[test]
    fn test_inventory_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("nested"));
        let inventory = Inventory::from(vec![
            LotRecord::new("A-1", Some(1)),
            LotRecord::new("A-2", None),
        ]);

        cache.save_inventory("MVLC", &inventory).unwrap();
        assert_eq!(cache.load_inventory("MVLC").unwrap(), inventory);
        assert!(cache.load_inventory("SRH").unwrap().is_empty());

        assert_eq!(cache.clear_inventory("MVLC").unwrap(), 2);
        assert!(cache.load_inventory("MVLC").unwrap().is_empty());
    }

    #[test]
    fn test_file_names() {
        let cache = LocalCache::new("/tmp/lotsync");
        assert!(cache.inventory_path("MVLC").ends_with("inventory_MVLC.json"));
        assert!(cache
            .prices_path(&PriceScope::phase("MVLC", PhaseGroup::Phase2))
            .ends_with("prices_MVLC_phase2.json"));
        assert!(cache
            .inventory_path("../Sta Rosa")
            .ends_with("inventory_Sta-Rosa.json"));
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        fs::write(cache.inventory_path("MVLC"), "{not json").unwrap();
        assert!(matches!(cache.load_inventory("MVLC"), Err(AppError::Json(_))));
    }
}
