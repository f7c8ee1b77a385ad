use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::remote::StoreError;

/// One parsed row of cells; position maps to the header position.
pub type RawRow = Vec<String>;

/// Lowercase category key → price per square metre.
pub type PriceMap = HashMap<String, f64>;

/// Canonical columns the header locator resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LotField {
    Lot,
    Phase,
    Size,
    Status,
    Category,
    RsvDate,
}

impl LotField {
    pub const ALL: [LotField; 6] = [
        LotField::Lot,
        LotField::Phase,
        LotField::Size,
        LotField::Status,
        LotField::Category,
        LotField::RsvDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LotField::Lot => "lot",
            LotField::Phase => "phase",
            LotField::Size => "size",
            LotField::Status => "status",
            LotField::Category => "category",
            LotField::RsvDate => "rsvDate",
        }
    }
}

/// Column index per canonical field; `None` when the header has no matching column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMap {
    pub lot: Option<usize>,
    pub phase: Option<usize>,
    pub size: Option<usize>,
    pub status: Option<usize>,
    pub category: Option<usize>,
    pub rsv_date: Option<usize>,
}

impl HeaderMap {
    pub fn get(&self, field: LotField) -> Option<usize> {
        match field {
            LotField::Lot => self.lot,
            LotField::Phase => self.phase,
            LotField::Size => self.size,
            LotField::Status => self.status,
            LotField::Category => self.category,
            LotField::RsvDate => self.rsv_date,
        }
    }

    pub fn set(&mut self, field: LotField, index: Option<usize>) {
        let slot = match field {
            LotField::Lot => &mut self.lot,
            LotField::Phase => &mut self.phase,
            LotField::Size => &mut self.size,
            LotField::Status => &mut self.status,
            LotField::Category => &mut self.category,
            LotField::RsvDate => &mut self.rsv_date,
        };
        *slot = index;
    }

    pub fn missing(&self) -> Vec<LotField> {
        LotField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }
}

/// A lot as imported, cached and rendered.
///
/// Field names follow the camelCase shape the inventory cache has always used;
/// the snake_case column names of the lots table are accepted on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotRecord {
    #[serde(alias = "lot_no", default, deserialize_with = "null_as_default")]
    pub lot_number: String,
    #[serde(default)]
    pub phase: Option<u32>,
    #[serde(alias = "size_sqm", default, deserialize_with = "null_as_default")]
    pub size: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(alias = "last_updated", default)]
    pub last_updated: Option<String>,
    #[serde(
        alias = "price_per_sqm",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price_per_sqm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// Fields this crate does not model (ids, owner columns) survive a round trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LotRecord {
    pub fn new(lot_number: impl Into<String>, phase: Option<u32>) -> Self {
        Self {
            lot_number: lot_number.into(),
            phase,
            size: 0.0,
            category: String::new(),
            status: String::new(),
            last_updated: None,
            price_per_sqm: None,
            total: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Composite inventory key: lowercased lot number and phase joined by `||`.
    pub fn key(&self) -> String {
        lot_key(&self.lot_number, self.phase)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn lot_key(lot_number: &str, phase: Option<u32>) -> String {
    let phase = phase.map(|p| p.to_string()).unwrap_or_default();
    format!("{}||{}", lot_number.trim().to_lowercase(), phase)
}

/// Something the builder noticed but tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ImportWarning {
    /// No scanned row matched any header alias; row 0 was used.
    NoHeaderMatched { header_row: usize },
    MissingColumn { field: LotField },
    BlankRow { line: usize },
    MissingLotNumber { line: usize },
    /// The phase cell holds a number too large to be a phase; row skipped.
    PhaseOutOfRange { line: usize, value: String },
    InvalidCharacter { line: usize, column: usize, character: char },
}

impl ImportWarning {
    pub fn message(&self) -> String {
        match self {
            ImportWarning::NoHeaderMatched { header_row } => format!(
                "No header row recognised; treating line {} as the header.",
                header_row + 1
            ),
            ImportWarning::MissingColumn { field } => {
                format!("Column '{}' was not found.", field.as_str())
            }
            ImportWarning::BlankRow { line } => format!("Line {line}: blank row skipped."),
            ImportWarning::MissingLotNumber { line } => {
                format!("Line {line}: lot number is empty; row skipped.")
            }
            ImportWarning::PhaseOutOfRange { line, value } => {
                format!("Line {line}: phase '{value}' is out of range; row skipped.")
            }
            ImportWarning::InvalidCharacter {
                line,
                column,
                character,
            } => format!(
                "Line {line} (column {}): invalid character {:?}.",
                column + 1,
                character
            ),
        }
    }

    /// Blank rows are expected noise and do not make an import degraded.
    pub fn is_degrading(&self) -> bool {
        !matches!(self, ImportWarning::BlankRow { .. })
    }
}

/// Candidate records produced from one uploaded file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub header_row: usize,
    pub headers: Vec<String>,
    pub header_map: HeaderMap,
    pub records: Vec<LotRecord>,
    /// 1-based source line for each record.
    pub row_numbers: Vec<usize>,
    pub warnings: Vec<ImportWarning>,
}

impl ImportBatch {
    pub fn is_clean(&self) -> bool {
        !self.warnings.iter().any(ImportWarning::is_degrading)
    }
}

/// Result of folding a batch into an inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeCounts {
    pub updated: usize,
    pub inserted: usize,
}

/// Outcome of pushing records to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RemoteSync {
    /// No remote store configured or no signed-in session.
    Skipped,
    Completed { updated: usize, inserted: usize },
    /// Upserts before the failing record stay applied.
    Failed { completed: usize, error: String },
}

/// What a caller needs to report an import and re-render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub project: String,
    pub batch: ImportBatch,
    pub counts: MergeCounts,
    pub merged: Vec<LotRecord>,
    pub remote: RemoteSync,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        format!(
            "Imported {} rows for {}: updated {}, added {}",
            self.batch.records.len(),
            self.project,
            self.counts.updated,
            self.counts.inserted
        )
    }
}

/// Result of an explicit status change on one lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub record: LotRecord,
    pub remote: RemoteSync,
}

/// Result of saving a category price table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSaveReport {
    /// Table names written, e.g. `MVLC_phase1`.
    pub scopes: Vec<String>,
    /// Lots that received a price.
    pub priced: usize,
    pub remote: RemoteSync,
}

impl PriceSaveReport {
    pub fn summary(&self) -> String {
        match self.remote {
            RemoteSync::Completed { .. } => format!("Prices saved for {}", self.scopes.join(", ")),
            _ => format!("Prices saved for {} (local only)", self.scopes.join(", ")),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("import failed: the file contains no rows")]
    EmptyInput,
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("unable to resolve project directories")]
    MissingProjectDirs,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("lot '{lot_number}' (phase {phase:?}) not found")]
    LotNotFound {
        lot_number: String,
        phase: Option<u32>,
    },
    #[error("unknown price scope: {0}")]
    UnknownScope(String),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}
