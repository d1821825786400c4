//! Fit, score and select candidates for a single ticker.

use models::{Predictor, RegressionMetrics, Regressor};
use ndarray::{Array1, Array2};
use tracing::{info, warn};
use types::{ModelMetrics, PriceSeries};

use crate::{CandidateOutcome, CandidateResult, TrainerConfig, TrainingError, TrainingOutcome};

/// Train every candidate on `history` and pick the lowest held-out MSE.
///
/// A candidate that fails to fit, or predicts a non-finite value, is kept in
/// the report as [`CandidateOutcome::Failed`] and never aborts the run.
pub fn train_ticker(
    ticker: &str,
    history: &PriceSeries,
    candidates: &[Box<dyn Regressor>],
    config: &TrainerConfig,
) -> Result<TrainingOutcome, TrainingError> {
    let table = features::build(history, config.lag);
    let (train, test) = features::chronological_split(&table, config.test_fraction);

    if train.is_empty() || test.is_empty() {
        return Err(TrainingError::InsufficientData {
            ticker: ticker.to_string(),
            examples: table.len(),
        });
    }

    let invalid = |e: ndarray::ShapeError| TrainingError::InvalidFeatures {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    };
    let (x_train, y_train) = train.to_xy().map_err(invalid)?;
    let (x_test, y_test) = test.to_xy().map_err(invalid)?;

    let evaluated = parallel::map_slice(
        candidates,
        |candidate| evaluate(candidate.as_ref(), &x_train, &y_train, &x_test, &y_test),
        config.force_sequential,
    );

    let mut report = Vec::with_capacity(candidates.len());
    let mut fitted = Vec::with_capacity(candidates.len());
    for (candidate, result) in candidates.iter().zip(evaluated) {
        match result {
            Ok(result) => {
                info!(
                    ticker,
                    model = %result.name,
                    mse = result.metrics.mse,
                    r2 = result.metrics.r2,
                    "candidate evaluated"
                );
                report.push(CandidateOutcome::Fitted {
                    name: result.name.clone(),
                    metrics: result.metrics,
                });
                fitted.push(result);
            }
            Err(reason) => {
                warn!(ticker, model = candidate.name(), %reason, "candidate failed");
                report.push(CandidateOutcome::Failed {
                    name: candidate.name().to_string(),
                    reason,
                });
            }
        }
    }

    let best = select_best(fitted).ok_or_else(|| TrainingError::NoViableModel {
        ticker: ticker.to_string(),
        candidates: candidates.len(),
    })?;

    info!(ticker, model = %best.name, "{}", best.metrics);

    Ok(TrainingOutcome {
        ticker: ticker.to_string(),
        best,
        report,
        n_train: train.len(),
        n_test: test.len(),
    })
}

/// Fit one candidate and score it on the evaluation rows.
fn evaluate(
    candidate: &dyn Regressor,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<CandidateResult, String> {
    let model = candidate.fit(x_train, y_train).map_err(|e| e.to_string())?;
    let predictions = model.predict_batch(x_test).map_err(|e| e.to_string())?;
    let metrics = RegressionMetrics::calculate(y_test, &predictions);
    if !metrics.mse.is_finite() {
        return Err(format!("evaluation MSE is {}", metrics.mse));
    }
    Ok(CandidateResult {
        name: candidate.name().to_string(),
        model,
        metrics: ModelMetrics {
            mse: metrics.mse,
            r2: metrics.r2,
        },
    })
}

/// Strictly lowest MSE wins; on an exact tie the earlier result is kept.
pub fn select_best(results: impl IntoIterator<Item = CandidateResult>) -> Option<CandidateResult> {
    results.into_iter().fold(None, |best, next| match best {
        Some(current) if next.metrics.mse < current.metrics.mse => Some(next),
        Some(current) => Some(current),
        None => Some(next),
    })
}
