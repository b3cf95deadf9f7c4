//! Bagged regression trees.
//!
//! Each tree is a CART regressor grown on a bootstrap resample of the
//! training set, splitting on the threshold that minimizes the summed
//! squared error of its two children. The forest predicts the mean of its
//! trees. Small, noisy, nonlinear windows of a few dozen samples are the
//! intended input.

use rand::Rng;

use crate::error::{ForecastError, ForecastResult};

/// Number of input features: tick, total load, load trend.
pub const FEATURE_COUNT: usize = 3;

pub type Features = [f64; FEATURE_COUNT];

/// Shape of the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub trees: usize,
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves.
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 20,
            max_depth: 8,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Arena-allocated tree; node 0 is the root.
#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct Split {
    feature: usize,
    threshold: f64,
}

impl RegressionTree {
    fn fit(x: &[Features], y: &[f64], sample: &[usize], params: &ForestParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, sample, 0, params);
        tree
    }

    /// Grow the subtree for `sample` and return its node index.
    fn grow(
        &mut self,
        x: &[Features],
        y: &[f64],
        sample: &[usize],
        depth: usize,
        params: &ForestParams,
    ) -> usize {
        let slot = self.nodes.len();
        let mean = sample.iter().map(|&i| y[i]).sum::<f64>() / sample.len() as f64;
        self.nodes.push(TreeNode::Leaf(mean));

        if depth >= params.max_depth || sample.len() < params.min_samples_split.max(2) {
            return slot;
        }
        let Some(split) = best_split(x, y, sample) else {
            return slot;
        };

        let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
            .iter()
            .copied()
            .partition(|&i| x[i][split.feature] <= split.threshold);
        if left_sample.is_empty() || right_sample.is_empty() {
            return slot;
        }

        let left = self.grow(x, y, &left_sample, depth + 1, params);
        let right = self.grow(x, y, &right_sample, depth + 1, params);
        self.nodes[slot] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        slot
    }

    fn predict(&self, features: &Features) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf(value) => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Find the split with the lowest child SSE, if any improves on the parent.
fn best_split(x: &[Features], y: &[f64], sample: &[usize]) -> Option<Split> {
    let n = sample.len() as f64;
    let total_sum: f64 = sample.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = sample.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n;
    if parent_sse <= 0.0 {
        return None;
    }

    let mut best: Option<(f64, Split)> = None;
    let mut order = sample.to_vec();

    for feature in 0..FEATURE_COUNT {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for pos in 1..order.len() {
            let prev = order[pos - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let lo = x[prev][feature];
            let hi = x[order[pos]][feature];
            if lo >= hi {
                continue;
            }

            let left_n = pos as f64;
            let right_n = n - left_n;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().is_none_or(|(best_sse, _)| sse < *best_sse) {
                best = Some((
                    sse,
                    Split {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                    },
                ));
            }
        }
    }

    best.filter(|(sse, _)| *sse < parent_sse).map(|(_, split)| split)
}

/// An ensemble of regression trees fitted on bootstrap resamples.
#[derive(Debug, Clone)]
pub struct RegressionForest {
    trees: Vec<RegressionTree>,
}

impl RegressionForest {
    /// Fit a forest on paired features `x` and labels `y`.
    ///
    /// Rejects an empty set and any sample containing NaN or infinity.
    pub fn fit(
        x: &[Features],
        y: &[f64],
        params: &ForestParams,
        rng: &mut impl Rng,
    ) -> ForecastResult<Self> {
        debug_assert_eq!(x.len(), y.len(), "features and labels must pair up");
        if x.is_empty() || y.is_empty() {
            return Err(ForecastError::EmptyTrainingSet);
        }
        for (i, (features, label)) in x.iter().zip(y).enumerate() {
            if !label.is_finite() || features.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::NonFiniteSample(i));
            }
        }

        let n = x.len().min(y.len());
        let trees = (0..params.trees.max(1))
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::fit(x, y, &bootstrap, params)
            })
            .collect();

        Ok(Self { trees })
    }

    /// Mean prediction across all trees.
    pub fn predict(&self, features: &Features) -> ForecastResult<f64> {
        if features.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFiniteInput);
        }
        let total: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        Ok(total / self.trees.len() as f64)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}
