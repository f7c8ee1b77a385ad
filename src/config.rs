//! Configuration loading and the default cache location.

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::models::AppError;
use crate::storage::LocalCache;
use crate::utils::header::DEFAULT_HEADER_SCAN;

const CONFIG_FILE: &str = "config/settings";
const DEFAULT_PROJECT: &str = "MVLC";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub import: ImportConfig,
    pub projects: ProjectsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Rows scanned when looking for the header row.
    pub header_scan_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectsConfig {
    pub default: String,
    /// Projects whose prices are kept per phase group.
    pub phase_priced: Vec<String>,
}

impl AppConfig {
    /// Defaults, then `config/settings.*` if present, then `LOTSYNC__*` variables.
    pub fn load() -> Result<Self, AppError> {
        let default_cache = default_cache_dir()?;
        let builder = Config::builder()
            .set_default("cache.dir", default_cache.to_string_lossy().to_string())?
            .set_default("import.header_scan_limit", DEFAULT_HEADER_SCAN as u64)?
            .set_default("projects.default", DEFAULT_PROJECT)?
            .set_default("projects.phase_priced", vec![DEFAULT_PROJECT])?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix("LOTSYNC")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("projects.phase_priced"),
            );

        let cfg = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Built-in defaults with an explicit cache directory.
    pub fn with_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cache: CacheConfig { dir: dir.into() },
            import: ImportConfig {
                header_scan_limit: DEFAULT_HEADER_SCAN,
            },
            projects: ProjectsConfig {
                default: DEFAULT_PROJECT.to_string(),
                phase_priced: vec![DEFAULT_PROJECT.to_string()],
            },
        }
    }

    pub fn is_phase_priced(&self, project: &str) -> bool {
        self.projects
            .phase_priced
            .iter()
            .any(|code| code.eq_ignore_ascii_case(project.trim()))
    }

    pub fn local_cache(&self) -> LocalCache {
        LocalCache::new(&self.cache.dir)
    }
}

pub fn project_dirs() -> Result<ProjectDirs, AppError> {
    ProjectDirs::from("dev", "vhbc", "lotsync").ok_or(AppError::MissingProjectDirs)
}

fn default_cache_dir() -> Result<PathBuf, AppError> {
    Ok(project_dirs()?.data_dir().join("cache"))
}
