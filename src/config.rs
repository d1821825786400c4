//! Central configuration for training runs and the prediction server.
//!
//! Defaults reproduce the stock catalogue and training setup the web front-end
//! expects. CLI flags override individual fields through the builder setters.

use std::path::PathBuf;
use std::time::Duration;

use training::{TickerSpec, TrainerConfig};
use types::LAG_DAYS;

/// Master configuration for a training run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // Catalogue
    // ─────────────────────────────────────────────────────────────────────────
    /// Tickers to train, with display names.
    pub tickers: Vec<TickerSpec>,

    // ─────────────────────────────────────────────────────────────────────────
    // Training
    // ─────────────────────────────────────────────────────────────────────────
    /// Feature window width.
    pub lag_days: usize,
    /// History range downloaded per ticker.
    pub history_period: String,
    /// Bar interval downloaded per ticker.
    pub interval: String,
    /// Share of examples held out for evaluation.
    pub test_fraction: f64,
    /// Fit candidates one at a time.
    pub sequential_candidates: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Market data
    // ─────────────────────────────────────────────────────────────────────────
    /// Timeout for one price history request.
    pub fetch_timeout: Duration,

    // ─────────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────────
    /// Directory receiving one model blob per ticker.
    pub models_dir: PathBuf,
    /// Performance record path.
    pub performance_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tickers: default_catalogue(),
            lag_days: LAG_DAYS,
            history_period: "18mo".to_string(),
            interval: "1d".to_string(),
            test_fraction: 0.2,
            sequential_candidates: false,
            fetch_timeout: Duration::from_secs(30),
            models_dir: PathBuf::from("models"),
            performance_path: PathBuf::from("model_performance.json"),
        }
    }
}

/// Stocks offered by the front-end.
pub fn default_catalogue() -> Vec<TickerSpec> {
    vec![
        TickerSpec::new("Google", "GOOGL"),
        TickerSpec::new("NVIDIA", "NVDA"),
        TickerSpec::new("Citi", "C"),
        TickerSpec::new("Reliance Industries", "RELIANCE.NS"),
        TickerSpec::new("HCL India", "HCLTECH.NS"),
        TickerSpec::new("Tesla", "TSLA"),
    ]
}

impl AppConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the run to the given symbols.
    ///
    /// Symbols from the default catalogue keep their display names; others
    /// are named after the symbol.
    pub fn tickers<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let catalogue = default_catalogue();
        self.tickers = symbols
            .into_iter()
            .map(|s| {
                let symbol = s.as_ref().trim();
                catalogue
                    .iter()
                    .find(|spec| spec.symbol.eq_ignore_ascii_case(symbol))
                    .cloned()
                    .unwrap_or_else(|| TickerSpec::from_symbol(symbol))
            })
            .collect();
        self
    }

    /// Set the history range.
    pub fn history_period(mut self, period: impl Into<String>) -> Self {
        self.history_period = period.into();
        self
    }

    /// Set the model blob directory.
    pub fn models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    /// Set the performance record path.
    pub fn performance_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.performance_path = path.into();
        self
    }

    /// Fit candidates one at a time.
    pub fn sequential_candidates(mut self, sequential: bool) -> Self {
        self.sequential_candidates = sequential;
        self
    }

    /// Set the price history request timeout in seconds.
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout = Duration::from_secs(secs);
        self
    }

    /// Trainer settings derived from this config.
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            lag: self.lag_days,
            test_fraction: self.test_fraction,
            period: self.history_period.clone(),
            interval: self.interval.clone(),
            force_sequential: self.sequential_candidates,
        }
    }
}
