//! CART regression tree.
//!
//! Grows a binary tree that minimizes squared error, one axis-aligned split at
//! a time. Used directly as the decision tree candidate and as the weak
//! learner inside gradient boosting.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "model_type": "decision_tree",
//!   "n_features": 7,
//!   "nodes": [
//!     { "feature": 6, "threshold": 151.2, "left": 1, "right": 2, "value": null },
//!     { "feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": 149.8 },
//!     { "feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": 153.1 }
//!   ]
//! }
//! ```
//!
//! # Tree Traversal
//!
//! - Start at node 0 (root)
//! - If `feature == -1`, this is a leaf node; return `value`
//! - Else: compare `features[node.feature]` to `node.threshold`
//!   - If `<= threshold` or `NaN`, go to `left` child
//!   - Else go to `right` child
//! - Repeat until reaching a leaf

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{FitError, FittedModel, Predictor, Regressor, mean, validate_training_set};

/// A single node in a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index to split on (-1 for leaf nodes).
    pub feature: i32,
    /// Threshold value for the split.
    pub threshold: f64,
    /// Index of left child (-1 for leaf nodes).
    pub left: i32,
    /// Index of right child (-1 for leaf nodes).
    pub right: i32,
    /// Prediction for leaf nodes (None for internal nodes).
    pub value: Option<f64>,
}

impl TreeNode {
    fn leaf(value: f64) -> Self {
        Self {
            feature: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            value: Some(value),
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.feature == -1
    }
}

/// Fitted regression tree, nodes in pre-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    /// Number of features expected.
    pub n_features: usize,
    /// Tree nodes; index 0 is the root.
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub(crate) fn validate(&self) -> Result<(), String> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err("Tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.value.is_none() {
                    return Err(format!("Leaf node {} missing value", i));
                }
                continue;
            }
            // Children always come after their parent in pre-order, which
            // also rules out cycles.
            if node.left <= i as i32 || node.left as usize >= n_nodes {
                return Err(format!("Node {} has invalid left child {}", i, node.left));
            }
            if node.right <= i as i32 || node.right as usize >= n_nodes {
                return Err(format!("Node {} has invalid right child {}", i, node.right));
            }
            if node.feature < 0 || node.feature as usize >= self.n_features {
                return Err(format!(
                    "Node {} has invalid feature index {}",
                    i, node.feature
                ));
            }
        }
        Ok(())
    }

    /// Traverse the tree for given features and return leaf node index.
    #[inline]
    fn traverse(&self, features: ArrayView1<f64>) -> usize {
        let mut node_idx = 0usize;

        loop {
            let node = &self.nodes[node_idx];

            if node.is_leaf() {
                return node_idx;
            }

            let feature_val = features
                .get(node.feature as usize)
                .copied()
                .unwrap_or(f64::NAN);

            // NaN or <= threshold goes left
            if feature_val.is_nan() || feature_val <= node.threshold {
                node_idx = node.left as usize;
            } else {
                node_idx = node.right as usize;
            }
        }
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Grow a tree on every row of `x`/`y`.
    pub(crate) fn grow(x: &Array2<f64>, y: &Array1<f64>, params: &TreeParams) -> RegressionTree {
        let mut builder = Builder {
            x,
            y,
            params,
            nodes: Vec::new(),
        };
        let mut indices: Vec<usize> = (0..x.nrows()).collect();
        builder.grow_node(&mut indices, 0);
        RegressionTree {
            n_features: x.ncols(),
            nodes: builder.nodes,
        }
    }
}

impl Predictor for RegressionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, features: ArrayView1<f64>) -> f64 {
        let leaf = self.traverse(features);
        self.nodes[leaf].value.unwrap_or(f64::NAN)
    }
}

// =============================================================================
// Growing
// =============================================================================

/// Stopping rules for tree growth.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

struct Split {
    feature: usize,
    threshold: f64,
    /// Rows going left after sorting by the split feature.
    n_left: usize,
    sse: f64,
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    params: &'a TreeParams,
    nodes: Vec<TreeNode>,
}

impl Builder<'_> {
    fn grow_node(&mut self, indices: &mut [usize], depth: usize) -> i32 {
        let idx = self.nodes.len();
        let targets: Vec<f64> = indices.iter().map(|&i| self.y[i]).collect();
        let value = mean(&targets);
        self.nodes.push(TreeNode::leaf(value));

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || indices.len() < self.params.min_samples_split {
            return idx as i32;
        }
        let node_sse: f64 = targets.iter().map(|t| (t - value) * (t - value)).sum();
        if node_sse <= 1e-12 * (1.0 + value * value) {
            return idx as i32;
        }

        let Some(split) = self.best_split(indices) else {
            return idx as i32;
        };

        let feature = split.feature;
        indices.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));
        let (left_rows, right_rows) = indices.split_at_mut(split.n_left);

        let left = self.grow_node(left_rows, depth + 1);
        let right = self.grow_node(right_rows, depth + 1);
        self.nodes[idx] = TreeNode {
            feature: feature as i32,
            threshold: split.threshold,
            left,
            right,
            value: None,
        };
        idx as i32
    }

    /// Lowest-SSE split over all features; first found wins ties.
    fn best_split(&self, indices: &[usize]) -> Option<Split> {
        let n = indices.len();
        let total: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| self.y[i] * self.y[i]).sum();

        let mut best: Option<Split> = None;
        let mut order = indices.to_vec();

        for feature in 0..self.x.ncols() {
            order.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..n {
                let prev = order[k - 1];
                left_sum += self.y[prev];
                left_sq += self.y[prev] * self.y[prev];

                let lo = self.x[[prev, feature]];
                let hi = self.x[[order[k], feature]];
                if lo >= hi {
                    continue;
                }

                let n_left = k as f64;
                let n_right = (n - k) as f64;
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left)
                    + (right_sq - right_sum * right_sum / n_right);

                if best.as_ref().is_none_or(|b| sse < b.sse) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        n_left: k,
                        sse,
                    });
                }
            }
        }

        best
    }
}

// =============================================================================
// Candidate
// =============================================================================

/// Decision tree candidate (unlimited depth by default).
#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    name: String,
    params: TreeParams,
}

impl DecisionTreeRegressor {
    /// Tree capped at `max_depth` levels below the root.
    pub fn with_max_depth(max_depth: usize) -> Self {
        let mut tree = Self::default();
        tree.params.max_depth = Some(max_depth);
        tree
    }
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self {
            name: "Decision Tree".into(),
            params: TreeParams {
                max_depth: None,
                min_samples_split: 2,
            },
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel, FitError> {
        validate_training_set(x, y)?;
        Ok(FittedModel::DecisionTree(RegressionTree::grow(
            x,
            y,
            &self.params,
        )))
    }
}
