//! Chart data endpoint.
//!
//! - `GET /get_stock_data?ticker=X&period=1mo` - OHLC columns for the chart
//!
//! Only tickers with a loaded model can be charted. History is fetched on
//! each request on the blocking pool.

use axum::Json;
use axum::extract::{Query, State};
use market_data::{ChartData, FetchError};
use serde::Deserialize;
use tracing::error;

use crate::error::{AppError, AppResult};
use crate::state::ServerState;

const DEFAULT_PERIOD: &str = "1mo";

/// Query parameters for the chart endpoint.
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    /// Ticker to chart.
    pub ticker: Option<String>,
    /// Relative range (default: `1mo`).
    pub period: Option<String>,
}

/// Fetch chart history: `GET /get_stock_data`
pub async fn get_stock_data(
    State(state): State<ServerState>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<ChartData>> {
    let ticker = query
        .ticker
        .filter(|t| state.registry().contains(t))
        .ok_or_else(|| AppError::BadRequest("Invalid ticker".into()))?;
    let period = query.period.unwrap_or_else(|| DEFAULT_PERIOD.to_string());

    let prices = state.prices.clone();
    let interval = state.chart_interval.clone();
    let fetch_ticker = ticker.clone();
    let fetched = tokio::task::spawn_blocking(move || {
        prices.fetch(&fetch_ticker, &period, &interval)
    })
    .await
    .map_err(|e| {
        error!(ticker = %ticker, error = %e, "chart fetch task failed");
        AppError::internal()
    })?;

    let series = match fetched {
        Ok(series) => series,
        Err(e) if e.is_not_found() => {
            return Err(AppError::NotFound("No data found for ticker".into()));
        }
        Err(FetchError::InvalidPeriod(period)) => {
            return Err(AppError::BadRequest(format!("Invalid period: {}", period)));
        }
        Err(e) => {
            error!(ticker = %ticker, error = %e, "chart fetch failed");
            return Err(AppError::internal());
        }
    };

    let chart = ChartData::from_series(&series);
    if chart.is_empty() {
        return Err(AppError::NotFound("No data found for ticker".into()));
    }
    Ok(Json(chart))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::fixtures;
    use axum::http::StatusCode;

    async fn call(ticker: Option<&str>, period: Option<&str>) -> AppResult<Json<ChartData>> {
        let query = ChartQuery {
            ticker: ticker.map(String::from),
            period: period.map(String::from),
        };
        get_stock_data(State(fixtures::state()), Query(query)).await
    }

    #[tokio::test]
    async fn test_chart_flattens_and_drops_missing_close() {
        let Json(chart) = call(Some("GOOGL"), None).await.unwrap();
        assert_eq!(chart.dates, vec!["2024-05-01", "2024-05-02", "2024-05-04"]);
        assert_eq!(chart.close_prices, vec![170.0, 171.5, 172.0]);
        assert_eq!(chart.open_prices.len(), 3);
    }

    #[tokio::test]
    async fn test_unregistered_ticker_is_bad_request() {
        let err = call(Some("AAPL"), None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = call(None, None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_no_history_is_not_found() {
        let err = call(Some("TSLA"), Some("5d")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_period_is_bad_request() {
        let err = call(Some("GOOGL"), Some("forever")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
