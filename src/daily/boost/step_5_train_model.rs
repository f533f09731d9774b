// External crates
use log::{debug, info};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

// Internal modules
use super::step_3_split_normalize::FeatureMatrix;
use super::step_4_decision_tree::{RegressionTree, TreeParams};
use crate::constants::{
    BASE_SCORE, L2_REGULARIZATION, LEARNING_RATE, MAX_TREE_DEPTH, MIN_CHILD_WEIGHT,
    MIN_SPLIT_LOSS, NUM_BOOST_ROUNDS,
};
use crate::error::{PipelineError, PipelineResult};

/// Hyperparameters for the boosted classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub num_rounds: usize,
    pub lambda: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
    /// Initial probability before any tree is added
    pub base_score: f64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            max_depth: MAX_TREE_DEPTH,
            learning_rate: LEARNING_RATE,
            num_rounds: NUM_BOOST_ROUNDS,
            lambda: L2_REGULARIZATION,
            gamma: MIN_SPLIT_LOSS,
            min_child_weight: MIN_CHILD_WEIGHT,
            base_score: BASE_SCORE,
        }
    }
}

impl BoosterParams {
    pub fn validate(&self) -> PipelineResult<()> {
        let invalid = |msg: String| Err(PipelineError::InvalidParameter(msg));
        if self.max_depth == 0 {
            return invalid("max_depth must be at least 1".to_string());
        }
        if self.num_rounds == 0 {
            return invalid("num_rounds must be at least 1".to_string());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid(format!("learning_rate {} is outside (0, 1]", self.learning_rate));
        }
        if !(self.base_score > 0.0 && self.base_score < 1.0) {
            return invalid(format!("base_score {} is outside (0, 1)", self.base_score));
        }
        for (name, value) in [
            ("lambda", self.lambda),
            ("gamma", self.gamma),
            ("min_child_weight", self.min_child_weight),
        ] {
            if !(value >= 0.0) {
                return invalid(format!("{} must be non-negative, got {}", name, value));
            }
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            lambda: self.lambda,
            gamma: self.gamma,
            min_child_weight: self.min_child_weight,
        }
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Mean binary cross-entropy of probabilities against 0/1 labels
pub fn log_loss(probabilities: &[f64], labels: &[f64]) -> f64 {
    const EPS: f64 = 1e-15;
    let total: f64 = probabilities
        .iter()
        .zip(labels)
        .map(|(&p, &y)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / labels.len().max(1) as f64
}

/// Additive ensemble of regression trees with a logistic link
#[derive(Debug, Clone)]
pub struct GradientBoostedClassifier {
    params: BoosterParams,
    base_margin: f64,
    trees: Vec<RegressionTree>,
    feature_names: Vec<String>,
    train_log_loss: Vec<f64>,
}

impl GradientBoostedClassifier {
    /// Fits the ensemble by gradient boosting on the logistic loss
    ///
    /// Each round computes `g = p - y` and `h = p (1 - p)` from the current
    /// margins, grows one tree on them and adds its shrunk leaf weights to
    /// the margins. There is no early stopping.
    ///
    /// # Arguments
    ///
    /// * `train` - Scaled training features with 0/1 labels
    /// * `params` - Booster hyperparameters
    ///
    /// # Returns
    ///
    /// Returns the trained classifier
    pub fn fit(train: &FeatureMatrix, params: BoosterParams) -> PipelineResult<Self> {
        params.validate()?;
        if train.n_rows() == 0 {
            return Err(PipelineError::empty("train"));
        }
        if let Some(&bad) = train.labels.iter().find(|&&y| y != 0.0 && y != 1.0) {
            return Err(PipelineError::InvalidLabel(bad));
        }

        info!(
            "Training boosted trees on {} rows and {} features: {:?}",
            train.n_rows(),
            train.n_features(),
            params
        );

        let labels = train.labels.to_vec();
        let base_margin = logit(params.base_score);
        let tree_params = params.tree_params();
        let mut margins = vec![base_margin; train.n_rows()];
        let mut trees = Vec::with_capacity(params.num_rounds);
        let mut train_log_loss = Vec::with_capacity(params.num_rounds);

        for round in 0..params.num_rounds {
            let probabilities: Vec<f64> = margins.iter().map(|&m| sigmoid(m)).collect();
            let grad: Vec<f64> = probabilities.iter().zip(&labels).map(|(p, y)| p - y).collect();
            let hess: Vec<f64> = probabilities.iter().map(|p| p * (1.0 - p)).collect();

            let mut tree = RegressionTree::fit(train.values.view(), &grad, &hess, &tree_params);
            tree.shrink(params.learning_rate);

            for (margin, row) in margins.iter_mut().zip(train.values.rows()) {
                *margin += tree.predict_row(row);
            }
            trees.push(tree);

            let probabilities: Vec<f64> = margins.iter().map(|&m| sigmoid(m)).collect();
            let loss = log_loss(&probabilities, &labels);
            train_log_loss.push(loss);
            if (round + 1) % 10 == 0 || round == 0 {
                debug!("Round {}/{}: train logloss = {:.6}", round + 1, params.num_rounds, loss);
            }
        }

        if let Some(last) = train_log_loss.last() {
            info!("Finished {} rounds, final train logloss = {:.6}", trees.len(), last);
        }

        Ok(Self {
            params,
            base_margin,
            trees,
            feature_names: train.names.clone(),
            train_log_loss,
        })
    }

    fn check_width(&self, features: ArrayView2<f64>) -> PipelineResult<()> {
        if features.ncols() != self.feature_names.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.feature_names.len(),
                actual: features.ncols(),
            });
        }
        Ok(())
    }

    /// Raw additive scores before the logistic link
    pub fn predict_margin(&self, features: ArrayView2<f64>) -> PipelineResult<Array1<f64>> {
        self.check_width(features)?;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| {
                self.base_margin + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }

    /// Probability of label 1 for every row
    pub fn predict_proba(&self, features: ArrayView2<f64>) -> PipelineResult<Array1<f64>> {
        Ok(self.predict_margin(features)?.mapv(sigmoid))
    }

    pub fn num_rounds(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Train logloss after each round
    pub fn train_log_loss(&self) -> &[f64] {
        &self.train_log_loss
    }

    /// Total split gain per feature, normalized to sum to 1, highest first
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let mut totals = vec![0.0; self.feature_names.len()];
        for tree in &self.trees {
            for (feature, gain) in tree.split_gains() {
                totals[feature] += gain;
            }
        }

        let sum: f64 = totals.iter().sum();
        let mut importance: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(totals)
            .map(|(name, gain)| (name, if sum > 0.0 { gain / sum } else { 0.0 }))
            .collect();
        importance.sort_by(|a, b| b.1.total_cmp(&a.1));
        importance
    }
}
