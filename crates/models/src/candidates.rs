//! The fixed candidate set evaluated for every ticker.

use crate::{
    DecisionTreeRegressor, GradientBoosting, LassoRegression, LinearRegression, Regressor,
    RidgeRegression, SupportVectorRegression,
};

/// Candidate names in declared order. Earlier names win exact MSE ties.
pub const CANDIDATE_NAMES: [&str; 6] = [
    "Linear Regression",
    "Lasso Regression",
    "Ridge Regression",
    "SVM Regression",
    "Decision Tree",
    "Gradient Boosting",
];

/// Fresh instances of every candidate, in [`CANDIDATE_NAMES`] order.
pub fn default_candidates() -> Vec<Box<dyn Regressor>> {
    vec![
        Box::new(LinearRegression::default()),
        Box::new(LassoRegression::default()),
        Box::new(RidgeRegression::default()),
        Box::new(SupportVectorRegression::default()),
        Box::new(DecisionTreeRegressor::default()),
        Box::new(GradientBoosting::default()),
    ]
}
