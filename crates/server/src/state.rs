//! Shared server state.
//!
//! Everything here is read-only after startup, so handlers share it through
//! `Arc` without locks.

use std::sync::Arc;
use std::time::Instant;

use market_data::PriceSource;
use registry::{InferenceService, ModelRegistry};

/// Shared state for all route handlers.
///
/// Cloned into each handler via Axum's State extractor.
#[derive(Clone)]
pub struct ServerState {
    /// Predictions over the loaded registry.
    pub inference: InferenceService,

    /// Source for chart history.
    pub prices: Arc<dyn PriceSource>,

    /// Bar interval requested for charts.
    pub chart_interval: String,

    /// Server start time.
    pub start_time: Instant,
}

impl ServerState {
    /// Create state over a loaded registry and a price source.
    pub fn new(registry: Arc<ModelRegistry>, prices: Arc<dyn PriceSource>) -> Self {
        Self {
            inference: InferenceService::new(registry),
            prices,
            chart_interval: "1d".into(),
            start_time: Instant::now(),
        }
    }

    /// The loaded registry.
    pub fn registry(&self) -> &ModelRegistry {
        self.inference.registry()
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
