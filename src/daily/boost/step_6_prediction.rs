// External crates
use log::info;
use serde::{Deserialize, Serialize};

// Internal modules
use super::step_3_split_normalize::FeatureMatrix;
use super::step_5_train_model::GradientBoostedClassifier;
use crate::error::{PipelineError, PipelineResult};

/// Converts scores to 0/1 predictions; a score equal to the threshold is 1
pub fn threshold_scores(scores: &[f64], threshold: f64) -> Vec<u8> {
    scores.iter().map(|&s| u8::from(s >= threshold)).collect()
}

fn check_lengths(predictions: &[u8], labels: &[u8]) -> PipelineResult<()> {
    if predictions.len() != labels.len() {
        return Err(PipelineError::LengthMismatch {
            predictions: predictions.len(),
            labels: labels.len(),
        });
    }
    if labels.is_empty() {
        return Err(PipelineError::empty("test"));
    }
    Ok(())
}

/// Fraction of predictions equal to their label, in `[0, 1]`
pub fn accuracy(predictions: &[u8], labels: &[u8]) -> PipelineResult<f64> {
    check_lengths(predictions, labels)?;
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, y)| p == y)
        .count();
    Ok(correct as f64 / labels.len() as f64)
}

/// Binary confusion counts with label 1 as the positive class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(predictions: &[u8], labels: &[u8]) -> PipelineResult<Self> {
        check_lengths(predictions, labels)?;
        let mut matrix = Self::default();
        for (&p, &y) in predictions.iter().zip(labels) {
            match (p, y) {
                (1, 1) => matrix.true_positive += 1,
                (0, 0) => matrix.true_negative += 1,
                (1, _) => matrix.false_positive += 1,
                _ => matrix.false_negative += 1,
            }
        }
        Ok(matrix)
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    /// `None` when nothing was predicted positive
    pub fn precision(&self) -> Option<f64> {
        let predicted = self.true_positive + self.false_positive;
        (predicted > 0).then(|| self.true_positive as f64 / predicted as f64)
    }

    /// `None` when there are no positive labels
    pub fn recall(&self) -> Option<f64> {
        let actual = self.true_positive + self.false_negative;
        (actual > 0).then(|| self.true_positive as f64 / actual as f64)
    }
}

/// Held-out evaluation of a trained classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub scores: Vec<f64>,
    pub predictions: Vec<u8>,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub threshold: f64,
}

impl EvaluationReport {
    /// Builds the report from raw scores and true labels
    pub fn from_scores(scores: Vec<f64>, labels: &[u8], threshold: f64) -> PipelineResult<Self> {
        let predictions = threshold_scores(&scores, threshold);
        let accuracy = accuracy(&predictions, labels)?;
        let confusion = ConfusionMatrix::from_predictions(&predictions, labels)?;
        Ok(Self {
            scores,
            predictions,
            accuracy,
            confusion,
            threshold,
        })
    }
}

/// Scores the test matrix and compares thresholded predictions to its labels
///
/// # Arguments
///
/// * `model` - Trained classifier
/// * `test` - Test matrix scaled with the training scaler
/// * `threshold` - Score at or above which a row is predicted 1
///
/// # Returns
///
/// Returns the evaluation report
pub fn evaluate_model(
    model: &GradientBoostedClassifier,
    test: &FeatureMatrix,
    threshold: f64,
) -> PipelineResult<EvaluationReport> {
    let scores = model.predict_proba(test.values.view())?.to_vec();
    let labels: Vec<u8> = test.labels.iter().map(|&y| y as u8).collect();
    let report = EvaluationReport::from_scores(scores, &labels, threshold)?;

    let confusion = &report.confusion;
    info!(
        "Evaluated {} test rows: accuracy {:.4}, tp {}, tn {}, fp {}, fn {}, precision {:?}, recall {:?}",
        confusion.total(),
        report.accuracy,
        confusion.true_positive,
        confusion.true_negative,
        confusion.false_positive,
        confusion.false_negative,
        confusion.precision(),
        confusion.recall()
    );
    Ok(report)
}
