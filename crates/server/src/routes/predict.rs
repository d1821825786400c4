//! Prediction endpoint.
//!
//! - `POST /predict` - `{ticker, recent_data}` -> `{predicted_price, model_name}`
//!
//! `recent_data` holds the last [`LAG_DAYS`] closes, oldest first.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use registry::Prediction;
use serde::Deserialize;
use types::LAG_DAYS;

use crate::error::{AppError, AppResult};
use crate::state::ServerState;

/// Prediction request body.
///
/// Fields are optional so a missing one is reported as a 400 with a useful
/// message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub ticker: Option<String>,
    pub recent_data: Option<Vec<f64>>,
}

/// Predict the next close: `POST /predict`
pub async fn predict(
    State(state): State<ServerState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<Prediction>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let ticker = request
        .ticker
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("No model loaded for ticker: None".into()))?;
    let recent_data = request.recent_data.ok_or_else(|| {
        AppError::BadRequest(format!(
            "Prediction requires exactly {} days of recent_data.",
            LAG_DAYS
        ))
    })?;

    let prediction = state.inference.predict(&ticker, &recent_data)?;
    tracing::debug!(
        ticker = %ticker,
        model = %prediction.model_name,
        price = prediction.predicted_price,
        "prediction served"
    );
    Ok(Json(prediction))
}
