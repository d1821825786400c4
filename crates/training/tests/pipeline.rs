//! End-to-end training over an in-memory price source.

use chrono::NaiveDate;
use market_data::InMemorySource;
use models::{CANDIDATE_NAMES, Predictor, default_candidates};
use training::{CandidateOutcome, TickerSpec, TrainerConfig, train_all};
use types::{LAG_DAYS, PriceBar, PriceSeries};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// Upward drift with deterministic jitter, enough rows for every candidate.
fn noisy_trend(n: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..n)
        .map(|i| 150.0 + i as f64 * 0.3 + ((i * 7919) % 101) as f64 / 20.0)
        .collect();
    PriceSeries::from_closes(start(), &closes)
}

fn source() -> InMemorySource {
    let mut gappy: Vec<PriceBar> = noisy_trend(80).bars().to_vec();
    gappy[40] = PriceBar::missing_close(gappy[40].date);

    InMemorySource::new()
        .with_series("TREND", noisy_trend(120))
        .with_series("GAPPY", PriceSeries::new(gappy).unwrap())
        .with_series("SHORT", noisy_trend(LAG_DAYS + 1))
}

fn catalogue() -> Vec<TickerSpec> {
    vec![
        TickerSpec::new("Trend Corp", "TREND"),
        TickerSpec::from_symbol("MISSING"),
        TickerSpec::from_symbol("SHORT"),
        TickerSpec::new("Gappy Inc", "GAPPY"),
    ]
}

#[test]
fn test_batch_trains_viable_tickers_and_skips_the_rest() {
    let report = train_all(
        &catalogue(),
        &source(),
        &default_candidates(),
        &TrainerConfig::default(),
    );

    let trained: Vec<&str> = report.outcomes.iter().map(|o| o.ticker.as_str()).collect();
    assert_eq!(trained, vec!["TREND", "GAPPY"]);

    let skipped: Vec<&str> = report.skipped.iter().map(|s| s.ticker.as_str()).collect();
    assert_eq!(skipped, vec!["MISSING", "SHORT"]);

    for outcome in &report.outcomes {
        let names: Vec<&str> = outcome.report.iter().map(CandidateOutcome::name).collect();
        assert_eq!(names, CANDIDATE_NAMES);
        assert_eq!(outcome.best.model.n_features(), LAG_DAYS);

        let best_mse = outcome.best.metrics.mse;
        for line in &outcome.report {
            if let Some(metrics) = line.metrics() {
                assert!(best_mse <= metrics.mse);
            }
        }
    }
}

#[test]
fn test_missing_close_drops_windows() {
    let report = train_all(
        &[TickerSpec::from_symbol("GAPPY")],
        &source(),
        &default_candidates(),
        &TrainerConfig::default(),
    );
    let outcome = &report.outcomes[0];
    // 80 rows give 72 windows; the gap at row 40 touches 8 of them.
    assert_eq!(outcome.n_train + outcome.n_test, 64);
}

#[test]
fn test_selection_is_deterministic() {
    let config = TrainerConfig::default();
    let run = || {
        train_all(
            &[TickerSpec::from_symbol("TREND")],
            &source(),
            &default_candidates(),
            &config,
        )
    };

    let first = run();
    let second = run();
    assert_eq!(first.outcomes[0].best.name, second.outcomes[0].best.name);
    assert_eq!(first.outcomes[0].best.metrics, second.outcomes[0].best.metrics);
    assert_eq!(first.outcomes[0].report, second.outcomes[0].report);
}

#[test]
fn test_sequential_matches_parallel() {
    let parallel = train_all(
        &[TickerSpec::from_symbol("TREND")],
        &source(),
        &default_candidates(),
        &TrainerConfig::default(),
    );
    let sequential = train_all(
        &[TickerSpec::from_symbol("TREND")],
        &source(),
        &default_candidates(),
        &TrainerConfig {
            force_sequential: true,
            ..TrainerConfig::default()
        },
    );
    assert_eq!(parallel.outcomes[0].report, sequential.outcomes[0].report);
}
