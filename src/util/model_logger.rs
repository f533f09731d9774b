use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::build_info;
use crate::daily::boost::step_3_split_normalize::DateRange;
use crate::daily::boost::step_5_train_model::BoosterParams;
use crate::daily::boost::step_6_prediction::ConfusionMatrix;
use crate::daily::boost::PipelineReport;

/// Raw train range of one feature, recovered from the fitted scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

/// JSON record of a single pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelExperiment {
    pub timestamp: String,
    pub ticker: String,
    pub model_type: String,
    pub input_path: String,
    pub output_path: String,
    pub train_range: DateRange,
    pub test_range: DateRange,
    pub params: BoosterParams,
    pub threshold: f64,
    pub clean_bars: usize,
    pub derived_rows: usize,
    pub label_zero: usize,
    pub label_one: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub final_train_log_loss: Option<f64>,
    pub test_accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub feature_importance: Vec<(String, f64)>,
    pub feature_ranges: Vec<FeatureRange>,
    pub training_time_seconds: Option<f64>,
    pub crate_version: String,
    pub rustc_version: String,
    pub notes: String,
}

impl ModelExperiment {
    pub fn from_report(report: &PipelineReport) -> Self {
        let scaler = &report.scaler;
        let feature_ranges = scaler
            .names
            .iter()
            .zip(scaler.mins.iter().zip(&scaler.maxs))
            .map(|(name, (&min, &max))| FeatureRange {
                name: name.clone(),
                min,
                max,
            })
            .collect();
        let (label_zero, label_one) = report.label_balance;

        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            ticker: report.config.ticker(),
            model_type: "gradient_boosted_trees".to_string(),
            input_path: report.config.input_path.display().to_string(),
            output_path: report.config.output_path.display().to_string(),
            train_range: report.config.train,
            test_range: report.config.test,
            params: *report.model.params(),
            threshold: report.config.threshold,
            clean_bars: report.clean_bars,
            derived_rows: report.derived_rows,
            label_zero,
            label_one,
            train_rows: report.train_rows,
            test_rows: report.test_rows,
            final_train_log_loss: report.model.train_log_loss().last().copied(),
            test_accuracy: report.evaluation.accuracy,
            confusion: report.evaluation.confusion,
            precision: report.evaluation.confusion.precision(),
            recall: report.evaluation.confusion.recall(),
            feature_importance: report.model.feature_importance(),
            feature_ranges,
            training_time_seconds: None,
            crate_version: build_info::PKG_VERSION.to_string(),
            rustc_version: build_info::RUSTC_VERSION.to_string(),
            notes: "".to_string(),
        }
    }

    pub fn set_training_time(&mut self, seconds: f64) {
        self.training_time_seconds = Some(seconds);
    }

    pub fn add_note(&mut self, note: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
    }

    pub fn save(&self, experiment_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(experiment_dir)?;

        let filename = format!(
            "{}_{}_d{}_r{}_experiment.json",
            self.ticker, self.model_type, self.params.max_depth, self.params.num_rounds,
        );
        let file_path = experiment_dir.join(filename);

        let json = serde_json::to_string_pretty(&self)?;
        let mut file = fs::File::create(&file_path)?;
        file.write_all(json.as_bytes())?;

        Ok(file_path)
    }
}

/// Creates `<base>/<YYYYmmdd_HHMMSS>` for one run
pub fn create_experiment_dir(base: &Path) -> Result<PathBuf> {
    let dir = base.join(Local::now().format("%Y%m%d_%H%M%S").to_string());
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
