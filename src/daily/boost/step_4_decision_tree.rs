// External crates
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Growth limits and regularization for a single boosted tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum number of splits from root to any leaf
    pub max_depth: usize,
    /// L2 penalty on leaf weights
    pub lambda: f64,
    /// Minimum loss reduction needed to keep a split
    pub gamma: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
}

/// Node stored in the tree arena
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        gain: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Regression tree fitted to first and second order gradients
///
/// Node 0 is the root. Rows whose feature value is below a split threshold
/// go left.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

fn leaf_weight(grad_sum: f64, hess_sum: f64, lambda: f64) -> f64 {
    -grad_sum / (hess_sum + lambda)
}

fn node_score(grad_sum: f64, hess_sum: f64, lambda: f64) -> f64 {
    grad_sum * grad_sum / (hess_sum + lambda)
}

// Exact greedy scan of one feature over the rows in a node
fn best_split_for_feature(
    features: ArrayView2<f64>,
    feature: usize,
    rows: &[usize],
    grad: &[f64],
    hess: &[f64],
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let mut order = rows.to_vec();
    order.sort_by(|&a, &b| features[[a, feature]].total_cmp(&features[[b, feature]]));

    let grad_total: f64 = rows.iter().map(|&i| grad[i]).sum();
    let hess_total: f64 = rows.iter().map(|&i| hess[i]).sum();
    let parent = node_score(grad_total, hess_total, params.lambda);

    let mut best: Option<SplitCandidate> = None;
    let (mut grad_left, mut hess_left) = (0.0, 0.0);
    for pos in 0..order.len().saturating_sub(1) {
        let row = order[pos];
        grad_left += grad[row];
        hess_left += hess[row];

        let value = features[[row, feature]];
        let next = features[[order[pos + 1], feature]];
        if value == next {
            continue;
        }

        let grad_right = grad_total - grad_left;
        let hess_right = hess_total - hess_left;
        if hess_left < params.min_child_weight || hess_right < params.min_child_weight {
            continue;
        }

        let gain = 0.5
            * (node_score(grad_left, hess_left, params.lambda)
                + node_score(grad_right, hess_right, params.lambda)
                - parent)
            - params.gamma;
        if gain <= 0.0 || best.is_some_and(|b| gain <= b.gain) {
            continue;
        }

        let mut threshold = value + (next - value) / 2.0;
        if threshold <= value {
            threshold = next;
        }
        best = Some(SplitCandidate {
            feature,
            threshold,
            gain,
        });
    }
    best
}

impl RegressionTree {
    /// Grows a tree greedily on the given gradient statistics
    ///
    /// # Arguments
    ///
    /// * `features` - Row-major feature matrix
    /// * `grad` - First-order gradient per row
    /// * `hess` - Second-order gradient per row
    /// * `params` - Depth and regularization limits
    ///
    /// # Returns
    ///
    /// Returns the fitted tree with unshrunk leaf weights
    pub fn fit(
        features: ArrayView2<f64>,
        grad: &[f64],
        hess: &[f64],
        params: &TreeParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let rows: Vec<usize> = (0..features.nrows()).collect();
        tree.grow(features, grad, hess, rows, 0, params);
        tree
    }

    fn grow(
        &mut self,
        features: ArrayView2<f64>,
        grad: &[f64],
        hess: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let id = self.nodes.len();
        let grad_sum: f64 = rows.iter().map(|&i| grad[i]).sum();
        let hess_sum: f64 = rows.iter().map(|&i| hess[i]).sum();
        self.nodes.push(TreeNode::Leaf {
            weight: leaf_weight(grad_sum, hess_sum, params.lambda),
        });

        if depth >= params.max_depth || rows.len() < 2 {
            return id;
        }

        // Candidates come back in feature order, so ties go to the lowest index
        let candidates: Vec<Option<SplitCandidate>> = (0..features.ncols())
            .into_par_iter()
            .map(|feature| best_split_for_feature(features, feature, &rows, grad, hess, params))
            .collect();
        let best = candidates
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, candidate| match best {
                Some(b) if b.gain >= candidate.gain => Some(b),
                _ => Some(candidate),
            });

        let Some(split) = best else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| features[[i, split.feature]] < split.threshold);

        let left = self.grow(features, grad, hess, left_rows, depth + 1, params);
        let right = self.grow(features, grad, hess, right_rows, depth + 1, params);
        self.nodes[id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            gain: split.gain,
            left,
            right,
        };
        id
    }

    /// Multiplies every leaf weight by `factor`
    pub fn shrink(&mut self, factor: f64) {
        for node in self.nodes.iter_mut() {
            if let TreeNode::Leaf { weight } = node {
                *weight *= factor;
            }
        }
    }

    /// Leaf weight reached by one feature row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                TreeNode::Leaf { weight } => return weight,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    id = if row[feature] < threshold { left } else { right };
                }
            }
        }
    }

    /// Number of split levels on the longest path
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], id: usize) -> usize {
            match nodes[id] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// `(feature, gain)` for every split in the tree
    pub fn split_gains(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            TreeNode::Split { feature, gain, .. } => Some((*feature, *gain)),
            TreeNode::Leaf { .. } => None,
        })
    }
}
