pub mod step_1_data_preparation;
pub mod step_2_feature_labels;
pub mod step_3_split_normalize;
pub mod step_4_decision_tree;
pub mod step_5_train_model;
pub mod step_6_prediction;

// External crates
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Internal modules
use crate::constants::{
    LABELED_FILE_SUFFIX, PREDICTION_THRESHOLD, TEST_END_DATE, TEST_START_DATE, TRAIN_END_DATE,
    TRAIN_START_DATE,
};
use crate::error::PipelineResult;
use crate::util::file_utils::write_labeled_csv;
use step_1_data_preparation::load_price_bars;
use step_2_feature_labels::{build_derived_rows, label_balance};
use step_3_split_normalize::{split_by_date, DateRange, FeatureMatrix, MinMaxScaler};
use step_5_train_model::{BoosterParams, GradientBoostedClassifier};
use step_6_prediction::{evaluate_model, EvaluationReport};

/// Everything one pipeline run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub train: DateRange,
    pub test: DateRange,
    pub booster: BoosterParams,
    pub threshold: f64,
}

impl PipelineConfig {
    /// Default configuration for one input file
    pub fn new<P: AsRef<Path>>(input_path: P) -> PipelineResult<Self> {
        let input_path = input_path.as_ref().to_path_buf();
        Ok(Self {
            output_path: labeled_output_path(&input_path),
            input_path,
            train: DateRange::parse(TRAIN_START_DATE, TRAIN_END_DATE)?,
            test: DateRange::parse(TEST_START_DATE, TEST_END_DATE)?,
            booster: BoosterParams::default(),
            threshold: PREDICTION_THRESHOLD,
        })
    }

    pub fn with_output<P: AsRef<Path>>(mut self, output_path: P) -> Self {
        self.output_path = output_path.as_ref().to_path_buf();
        self
    }

    /// Instrument name taken from the file stem, e.g. `AAPL` for `AAPL_daily_ohlcv.csv`
    pub fn ticker(&self) -> String {
        self.input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.split('_').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("UNKNOWN")
            .to_string()
    }
}

/// `data/AAPL.csv` becomes `data/AAPL_labeled.csv`
pub fn labeled_output_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("prices");
    let extension = input_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("csv");
    input_path.with_file_name(format!("{}{}.{}", stem, LABELED_FILE_SUFFIX, extension))
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub config: PipelineConfig,
    pub clean_bars: usize,
    pub derived_rows: usize,
    pub label_balance: (usize, usize),
    pub train_rows: usize,
    pub test_rows: usize,
    pub scaler: MinMaxScaler,
    pub model: GradientBoostedClassifier,
    pub evaluation: EvaluationReport,
}

impl PipelineReport {
    pub fn accuracy(&self) -> f64 {
        self.evaluation.accuracy
    }

    /// The single console line printed at the end of a run
    pub fn summary_line(&self) -> String {
        format!(
            "Test accuracy: {:.2}% after {} boosting rounds",
            self.accuracy() * 100.0,
            self.model.num_rounds()
        )
    }
}

/// Runs load, label, export, split, scale, train and evaluate in order
///
/// Each stage takes the previous stage's output by value or reference, so a
/// failure stops the run before any later stage starts.
///
/// # Arguments
///
/// * `config` - Paths, date ranges and hyperparameters for the run
///
/// # Returns
///
/// Returns the run report with the trained model and its evaluation
pub fn run_pipeline(config: &PipelineConfig) -> PipelineResult<PipelineReport> {
    config.booster.validate()?;

    let bars = load_price_bars(&config.input_path)?;
    let rows = build_derived_rows(&bars)?;

    write_labeled_csv(&rows, &config.output_path)?;

    let split = split_by_date(&rows, config.train, config.test)?;
    let train = FeatureMatrix::from_rows(&split.train);
    let test = FeatureMatrix::from_rows(&split.test);

    let scaler = MinMaxScaler::fit(&train)?;
    let train = scaler.transform(&train)?;
    let test = scaler.transform(&test)?;

    println!(
        "Training on {} rows, testing on {} rows",
        train.n_rows(),
        test.n_rows()
    );
    let model = GradientBoostedClassifier::fit(&train, config.booster)?;
    let evaluation = evaluate_model(&model, &test, config.threshold)?;
    info!(
        "Pipeline finished for {}: {} rounds, test accuracy {:.4}",
        config.ticker(),
        model.num_rounds(),
        evaluation.accuracy
    );

    Ok(PipelineReport {
        config: config.clone(),
        clean_bars: bars.len(),
        derived_rows: rows.len(),
        label_balance: label_balance(&rows),
        train_rows: train.n_rows(),
        test_rows: test.n_rows(),
        scaler,
        model,
        evaluation,
    })
}
