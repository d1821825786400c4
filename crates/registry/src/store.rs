//! Saving training outcomes and loading them back as a registry.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use models::{FittedModel, Predictor};
use serde::Serialize;
use tracing::{debug, info, warn};
use training::TrainingOutcome;
use types::{LAG_DAYS, ModelMetrics, Ticker};

use crate::{BestModelRecord, ModelBlob, PerformanceRecord, RegistryError, TickerRecord};

// =============================================================================
// Entries
// =============================================================================

/// A ticker's selected model, ready for inference.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub ticker: Ticker,
    /// Candidate display name.
    pub model_name: String,
    /// Held-out metrics recorded at training time.
    pub metrics: ModelMetrics,
    /// Blob path as recorded.
    pub filename: String,
    /// Loaded model.
    pub model: FittedModel,
}

/// Immutable ticker -> model mapping.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    entries: BTreeMap<Ticker, RegistryEntry>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("tickers", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelRegistry {
    /// Build a registry from entries already in memory.
    ///
    /// A later entry for the same ticker replaces an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.ticker.clone(), e))
                .collect(),
        }
    }

    /// Read the performance record and every blob it references.
    ///
    /// A missing or unparsable record is an error. A ticker whose blob is
    /// missing, corrupt, or has the wrong input width is dropped with a
    /// warning and the rest still load.
    pub fn load(record_path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let record_path = record_path.as_ref();
        let record: PerformanceRecord = read_json(record_path)?;
        let base_dir = record_path.parent().unwrap_or_else(|| Path::new(""));

        let mut entries = BTreeMap::new();
        for (ticker, ticker_record) in record.tickers {
            let Some(best) = ticker_record.best_model else {
                debug!(ticker = %ticker, "no best model recorded");
                continue;
            };
            match load_entry(&ticker, &best, base_dir) {
                Ok(entry) => {
                    info!(ticker = %ticker, model = %entry.model_name, file = %best.filename, "loaded model");
                    entries.insert(ticker, entry);
                }
                Err(e) => warn!(ticker = %ticker, error = %e, "dropping ticker"),
            }
        }

        Ok(Self { entries })
    }

    /// Entry for `ticker`.
    pub fn get(&self, ticker: &str) -> Option<&RegistryEntry> {
        self.entries.get(ticker)
    }

    /// True when `ticker` has a loaded model.
    pub fn contains(&self, ticker: &str) -> bool {
        self.entries.contains_key(ticker)
    }

    /// Registered tickers, sorted.
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries, sorted by ticker.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn load_entry(
    ticker: &str,
    best: &BestModelRecord,
    base_dir: &Path,
) -> Result<RegistryEntry, RegistryError> {
    let path = resolve_blob_path(&best.filename, base_dir);
    let blob: ModelBlob = read_json(&path)?;

    blob.model
        .validate()
        .map_err(|reason| RegistryError::InvalidModel {
            path: path.clone(),
            reason,
        })?;
    if blob.n_features != blob.model.n_features() {
        return Err(RegistryError::InvalidModel {
            path,
            reason: format!(
                "header says {} features, model has {}",
                blob.n_features,
                blob.model.n_features()
            ),
        });
    }
    if blob.model.n_features() != LAG_DAYS {
        return Err(RegistryError::ArityMismatch {
            ticker: ticker.to_string(),
            expected: LAG_DAYS,
            got: blob.model.n_features(),
        });
    }

    Ok(RegistryEntry {
        ticker: ticker.to_string(),
        model_name: best.name.clone(),
        metrics: ModelMetrics {
            mse: best.mse,
            r2: best.r2,
        },
        filename: best.filename.clone(),
        model: blob.model,
    })
}

/// Recorded paths are used as-is when they exist, otherwise relative to the
/// record's directory.
fn resolve_blob_path(filename: &str, base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(filename);
    if path.is_absolute() || path.exists() {
        path
    } else {
        base_dir.join(path)
    }
}

// =============================================================================
// Saving
// =============================================================================

/// Blob path for a ticker: `{models_dir}/{ticker}_best_model.json`, with path
/// separators in the ticker replaced.
pub fn blob_filename(models_dir: &Path, ticker: &str) -> PathBuf {
    let safe: String = ticker
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    models_dir.join(format!("{}_best_model.json", safe))
}

/// Write one blob per outcome into `models_dir` and the performance record
/// to `record_path`. Returns the record that was written.
///
/// Fails with [`RegistryError::FilenameCollision`] before writing anything
/// when two tickers sanitize to the same blob file (`BRK/B` and `BRK_B`).
pub fn save(
    models_dir: impl AsRef<Path>,
    record_path: impl AsRef<Path>,
    outcomes: &[TrainingOutcome],
) -> Result<PerformanceRecord, RegistryError> {
    let models_dir = models_dir.as_ref();
    let record_path = record_path.as_ref();

    let mut claimed: HashMap<PathBuf, &str> = HashMap::with_capacity(outcomes.len());
    for outcome in outcomes {
        let path = blob_filename(models_dir, &outcome.ticker);
        if let Some(first) = claimed.get(&path) {
            return Err(RegistryError::FilenameCollision {
                path,
                first: (*first).to_string(),
                second: outcome.ticker.clone(),
            });
        }
        claimed.insert(path, &outcome.ticker);
    }

    fs::create_dir_all(models_dir).map_err(|source| RegistryError::Io {
        path: models_dir.to_path_buf(),
        source,
    })?;

    let mut record = PerformanceRecord::default();
    for outcome in outcomes {
        let best = &outcome.best;
        let path = blob_filename(models_dir, &outcome.ticker);
        write_json(
            &path,
            &ModelBlob {
                model_name: best.name.clone(),
                n_features: best.model.n_features(),
                model: best.model.clone(),
            },
        )?;
        info!(ticker = %outcome.ticker, model = %best.name, file = %path.display(), "saved best model");

        let candidates = outcome
            .report
            .iter()
            .filter_map(|line| line.metrics().map(|m| (line.name().to_string(), m)))
            .collect();
        record.tickers.insert(
            outcome.ticker.clone(),
            TickerRecord {
                candidates,
                best_model: Some(BestModelRecord {
                    name: best.name.clone(),
                    mse: best.metrics.mse,
                    r2: best.metrics.r2,
                    filename: path.to_string_lossy().into_owned(),
                }),
            },
        );
    }

    if let Some(parent) = record_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| RegistryError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write_json(record_path, &record)?;
    info!(path = %record_path.display(), tickers = record.len(), "saved performance record");

    Ok(record)
}

// =============================================================================
// JSON Helpers
// =============================================================================

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RegistryError> {
    let content = fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RegistryError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_filename_sanitizes_separators() {
        let dir = Path::new("models");
        assert_eq!(
            blob_filename(dir, "RELIANCE.NS"),
            Path::new("models/RELIANCE.NS_best_model.json")
        );
        assert_eq!(
            blob_filename(dir, "BRK/B"),
            Path::new("models/BRK_B_best_model.json")
        );
        assert_eq!(
            blob_filename(dir, r"A\B"),
            Path::new("models/A_B_best_model.json")
        );
    }

    #[test]
    fn test_resolve_relative_to_record_dir() {
        let resolved = resolve_blob_path("no/such/dir/x.json", Path::new("/srv/app"));
        assert_eq!(resolved, Path::new("/srv/app/no/such/dir/x.json"));
    }

    #[test]
    fn test_load_missing_record_is_error() {
        let err = ModelRegistry::load("/definitely/not/here/model_performance.json").unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }
}
