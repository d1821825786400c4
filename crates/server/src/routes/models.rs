//! Registered models endpoint.
//!
//! - `GET /api/models` - best model name and held-out metrics per ticker

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::ServerState;

/// One registered ticker.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub ticker: String,
    pub model_name: String,
    pub mse: f64,
    pub r2: f64,
}

/// Response for /api/models.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    /// Summaries sorted by ticker.
    pub models: Vec<ModelSummary>,
    pub total: usize,
}

/// List registered models: `GET /api/models`
pub async fn get_models(State(state): State<ServerState>) -> Json<ModelsResponse> {
    let models: Vec<ModelSummary> = state
        .registry()
        .iter()
        .map(|entry| ModelSummary {
            ticker: entry.ticker.clone(),
            model_name: entry.model_name.clone(),
            mse: entry.metrics.mse,
            r2: entry.metrics.r2,
        })
        .collect();

    Json(ModelsResponse {
        total: models.len(),
        models,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::fixtures;

    #[tokio::test]
    async fn test_models_sorted_by_ticker() {
        let Json(response) = get_models(State(fixtures::state())).await;
        let tickers: Vec<&str> = response.models.iter().map(|m| m.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["BROKEN", "GOOGL", "TSLA"]);
        assert_eq!(response.total, 3);
        assert_eq!(response.models[1].mse, 2.0);
    }
}
