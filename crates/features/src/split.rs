//! Chronological train/evaluation split.

use types::TrainingTable;

/// Split a table into a leading training part and a trailing evaluation part.
///
/// The evaluation part holds `ceil(len * test_fraction)` examples taken from
/// the end of the table; nothing is shuffled, so every training target
/// precedes every evaluation target. `test_fraction` is clamped to `[0, 1]`.
pub fn chronological_split(
    table: &TrainingTable,
    test_fraction: f64,
) -> (TrainingTable, TrainingTable) {
    let fraction = if test_fraction.is_nan() {
        0.0
    } else {
        test_fraction.clamp(0.0, 1.0)
    };
    let n_test = (table.len() as f64 * fraction).ceil() as usize;
    table.split_at(table.len() - n_test.min(table.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;
    use chrono::NaiveDate;
    use types::{LAG_DAYS, PriceSeries};

    fn table(n_examples: usize) -> TrainingTable {
        let closes: Vec<f64> = (0..n_examples + LAG_DAYS + 1)
            .map(|i| 50.0 + (i as f64).sin())
            .collect();
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        build(&PriceSeries::from_closes(start, &closes), LAG_DAYS)
    }

    #[test]
    fn test_eighty_twenty_sizes() {
        let (train, test) = chronological_split(&table(100), 0.2);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn test_test_size_rounds_up() {
        // ceil(11 * 0.2) = 3
        let (train, test) = chronological_split(&table(11), 0.2);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 3);
    }

    #[test]
    fn test_training_targets_precede_evaluation_targets() {
        let (train, test) = chronological_split(&table(57), 0.2);
        let last_train = train.examples().last().unwrap().target_date;
        for example in test.examples() {
            assert!(last_train < example.target_date);
        }
    }

    #[test]
    fn test_split_keeps_order() {
        let full = table(30);
        let (train, test) = chronological_split(&full, 0.2);
        let rejoined: Vec<_> = train
            .examples()
            .iter()
            .chain(test.examples())
            .cloned()
            .collect();
        assert_eq!(rejoined.as_slice(), full.examples());
    }

    #[test]
    fn test_degenerate_fractions() {
        let full = table(10);
        let (train, test) = chronological_split(&full, 0.0);
        assert_eq!((train.len(), test.len()), (10, 0));

        let (train, test) = chronological_split(&full, 1.5);
        assert_eq!((train.len(), test.len()), (0, 10));

        let (train, test) = chronological_split(&TrainingTable::empty(LAG_DAYS), 0.2);
        assert!(train.is_empty() && test.is_empty());
    }
}
