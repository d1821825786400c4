//! Route handlers for the server.
//!
//! # Modules
//!
//! - [`health`]: Liveness endpoint
//! - [`predict`]: Next-day close prediction
//! - [`chart`]: Price history for the chart front-end
//! - [`models`]: Registered models and their metrics

pub mod chart;
pub mod health;
pub mod models;
pub mod predict;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use market_data::InMemorySource;
    use models::{FittedModel, LinearModel};
    use registry::{ModelRegistry, RegistryEntry};
    use types::{LAG_DAYS, ModelMetrics, PriceBar, PriceSeries};

    use crate::state::ServerState;

    /// Linear model returning the newest input plus one.
    fn newest_plus_one() -> FittedModel {
        let mut coefficients = vec![0.0; LAG_DAYS];
        coefficients[LAG_DAYS - 1] = 1.0;
        FittedModel::Linear(LinearModel {
            n_features: LAG_DAYS,
            coefficients,
            intercept: 1.0,
        })
    }

    fn entry(ticker: &str, model: FittedModel) -> RegistryEntry {
        RegistryEntry {
            ticker: ticker.into(),
            model_name: "Linear Regression".into(),
            metrics: ModelMetrics { mse: 2.0, r2: 0.9 },
            filename: format!("models/{}_best_model.json", ticker),
            model,
        }
    }

    /// GOOGL and TSLA registered; GOOGL has chart data, TSLA has none.
    /// BROKEN's model overflows on any input.
    pub fn state() -> ServerState {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut bars: Vec<PriceBar> = PriceSeries::from_closes(start, &[170.0, 171.5, 169.0, 172.0])
            .bars()
            .to_vec();
        bars[2] = PriceBar::missing_close(bars[2].date);
        let googl = PriceSeries::new(bars).unwrap();

        let broken = FittedModel::Linear(LinearModel {
            n_features: LAG_DAYS,
            coefficients: vec![f64::MAX; LAG_DAYS],
            intercept: 0.0,
        });

        let registry = ModelRegistry::from_entries([
            entry("GOOGL", newest_plus_one()),
            entry("TSLA", newest_plus_one()),
            entry("BROKEN", broken),
        ]);
        let prices = InMemorySource::new().with_series("GOOGL", googl);

        ServerState::new(Arc::new(registry), Arc::new(prices))
    }
}
