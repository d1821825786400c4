//! Sliding-window feature builder.

use types::{LagVector, PriceSeries, TrainingExample, TrainingTable};

use crate::FeatureError;

/// Build a lag vector from prices ordered oldest to newest.
///
/// `closes.len()` must equal `lag` and every price must be finite.
pub fn lag_vector(closes: &[f64], lag: usize) -> Result<LagVector, FeatureError> {
    if closes.len() != lag {
        return Err(FeatureError::WrongLength {
            expected: lag,
            got: closes.len(),
        });
    }
    if let Some(index) = closes.iter().position(|c| !c.is_finite()) {
        return Err(FeatureError::NonFinite { index });
    }
    Ok(LagVector::from_oldest_first(closes.to_vec()))
}

/// Build the supervised table for a series.
///
/// Targets run from row `lag` to the second-to-last row inclusive; each takes
/// the `lag` closes immediately before it as features. The final row is never
/// a target, so a series of length `L` yields at most `L - lag - 1` examples.
/// Windows touching a missing close are dropped. Fewer than `lag + 2` rows
/// (or `lag == 0`) yields an empty table.
pub fn build(series: &PriceSeries, lag: usize) -> TrainingTable {
    let bars = series.bars();
    if lag == 0 || bars.len() < lag + 2 {
        return TrainingTable::empty(lag);
    }

    let examples = (lag..=bars.len() - 2)
        .filter_map(|t| {
            let window = &bars[t - lag..=t];
            let closes: Option<Vec<f64>> = window.iter().map(|b| b.usable_close()).collect();
            let mut closes = closes?;
            let target = closes.pop()?;
            let features = lag_vector(&closes, lag).ok()?;

            Some(TrainingExample {
                features,
                target,
                newest_feature_date: bars[t - 1].date,
                target_date: bars[t].date,
            })
        })
        .collect();

    TrainingTable::new(lag, examples)
}
