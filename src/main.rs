//! Stock Predictor - Main binary
//!
//! Two subcommands share one registry layout on disk:
//!
//! ```text
//! train:  Yahoo chart API -> features -> 6 candidates -> best per ticker
//!         -> models/{TICKER}_best_model.json + model_performance.json
//! serve:  model_performance.json -> registry -> HTTP (predict, chart, models)
//! ```
//!
//! `train` is a blocking batch run. `serve` starts a multi-threaded Tokio
//! runtime and blocks until Ctrl-C.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use market_data::YahooSource;
use registry::ModelRegistry;
use server::{ServerConfig, ServerState};
use tracing::{info, warn};

use config::AppConfig;

/// Stock Predictor - next-day closing price models and prediction API
#[derive(Parser, Debug)]
#[command(name = "stock-predictor")]
#[command(about = "Train next-day closing price models and serve predictions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download history, fit every candidate and save the best model per ticker
    Train {
        /// Symbols to train (defaults to the built-in catalogue)
        #[arg(long, value_delimiter = ',', env = "PREDICTOR_TICKERS")]
        tickers: Vec<String>,

        /// History range to download (e.g. 18mo, 2y)
        #[arg(long, env = "PREDICTOR_PERIOD")]
        period: Option<String>,

        /// Directory receiving the model blobs
        #[arg(long, env = "PREDICTOR_MODELS_DIR")]
        models_dir: Option<PathBuf>,

        /// Performance record path
        #[arg(long, env = "PREDICTOR_PERFORMANCE_PATH")]
        performance_path: Option<PathBuf>,

        /// Fit candidates one at a time
        #[arg(long, env = "PREDICTOR_SEQUENTIAL")]
        sequential: bool,

        /// Price history request timeout in seconds
        #[arg(long, env = "PREDICTOR_FETCH_TIMEOUT")]
        timeout_secs: Option<u64>,
    },
    /// Load the saved models and serve the prediction API
    Serve {
        /// Host to bind to
        #[arg(long, env = "PREDICTOR_SERVER_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, env = "PREDICTOR_SERVER_PORT")]
        port: Option<u16>,

        /// Performance record path
        #[arg(long, env = "PREDICTOR_PERFORMANCE_PATH")]
        performance_path: Option<PathBuf>,

        /// Directory with the front-end's static files
        #[arg(long, env = "PREDICTOR_STATIC_DIR")]
        static_dir: Option<PathBuf>,

        /// Chart history request timeout in seconds
        #[arg(long, env = "PREDICTOR_FETCH_TIMEOUT")]
        timeout_secs: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            tickers,
            period,
            models_dir,
            performance_path,
            sequential,
            timeout_secs,
        } => {
            let mut config = AppConfig::new().sequential_candidates(sequential);
            if !tickers.is_empty() {
                config = config.tickers(&tickers);
            }
            if let Some(period) = period {
                config = config.history_period(period);
            }
            if let Some(dir) = models_dir {
                config = config.models_dir(dir);
            }
            if let Some(path) = performance_path {
                config = config.performance_path(path);
            }
            if let Some(secs) = timeout_secs {
                config = config.fetch_timeout_secs(secs);
            }
            train(&config)
        }
        Commands::Serve {
            host,
            port,
            performance_path,
            static_dir,
            timeout_secs,
        } => {
            let defaults = ServerConfig::from_env();
            let server_config = ServerConfig {
                host: host.unwrap_or(defaults.host),
                port: port.unwrap_or(defaults.port),
                static_dir: static_dir.or(defaults.static_dir),
            };
            let mut config = AppConfig::new();
            if let Some(path) = performance_path {
                config = config.performance_path(path);
            }
            if let Some(secs) = timeout_secs {
                config = config.fetch_timeout_secs(secs);
            }
            serve(&server_config, &config)
        }
    }
}

fn train(config: &AppConfig) -> anyhow::Result<()> {
    info!(
        tickers = config.tickers.len(),
        period = %config.history_period,
        parallel = parallel::is_parallel_build() && !config.sequential_candidates,
        "starting training run"
    );

    let source = YahooSource::new().with_timeout(config.fetch_timeout);
    let candidates = models::default_candidates();
    let report = training::train_all(
        &config.tickers,
        &source,
        &candidates,
        &config.trainer_config(),
    );

    for skipped in &report.skipped {
        warn!(ticker = %skipped.ticker, reason = %skipped.reason, "no model saved");
    }
    if report.is_empty() {
        bail!("no ticker produced a model");
    }

    let record = registry::save(&config.models_dir, &config.performance_path, &report.outcomes)
        .with_context(|| format!("failed to save models to {}", config.models_dir.display()))?;

    info!(
        saved = record.len(),
        record = %config.performance_path.display(),
        "training complete"
    );
    Ok(())
}

fn serve(config: &ServerConfig, app_config: &AppConfig) -> anyhow::Result<()> {
    let record_path = &app_config.performance_path;
    let registry = ModelRegistry::load(record_path)
        .with_context(|| format!("failed to load models from {}", record_path.display()))?;
    if registry.is_empty() {
        warn!(record = %record_path.display(), "no models loaded, predictions will be rejected");
    } else {
        info!(models = registry.len(), "models loaded");
    }

    let prices = YahooSource::new().with_timeout(app_config.fetch_timeout);
    let state = ServerState::new(Arc::new(registry), Arc::new(prices));

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime
        .block_on(server::serve(config, state))
        .with_context(|| format!("server on {} failed", config.bind_addr()))
}
