// External crates
use chrono::NaiveDate;
use log::info;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

// Internal modules
use super::step_1_data_preparation::parse_date;
use super::step_2_feature_labels::DerivedRow;
use crate::constants::FEATURE_COLUMNS;
use crate::error::{PipelineError, PipelineResult};

/// Inclusive calendar range used to select train or test rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> PipelineResult<Self> {
        if start > end {
            return Err(PipelineError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from two `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> PipelineResult<Self> {
        let parse = |value: &str| {
            parse_date(value).ok_or_else(|| PipelineError::InvalidDate {
                row: 0,
                value: value.to_string(),
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Train and test rows, train strictly before test
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Vec<DerivedRow>,
    pub test: Vec<DerivedRow>,
}

/// Splits rows by fixed date boundaries without shuffling
///
/// # Arguments
///
/// * `rows` - Derived rows in date order
/// * `train` - Training date range
/// * `test` - Testing date range, must start after `train` ends
///
/// # Returns
///
/// Returns the split, or `EmptySplit` when either side selects no rows
pub fn split_by_date(
    rows: &[DerivedRow],
    train: DateRange,
    test: DateRange,
) -> PipelineResult<DatasetSplit> {
    if train.end >= test.start {
        return Err(PipelineError::OverlappingSplits {
            train_end: train.end,
            test_start: test.start,
        });
    }

    let train_rows: Vec<DerivedRow> = rows
        .iter()
        .filter(|r| train.contains(r.bar.date))
        .copied()
        .collect();
    let test_rows: Vec<DerivedRow> = rows
        .iter()
        .filter(|r| test.contains(r.bar.date))
        .copied()
        .collect();

    for (split, range, selected) in [("train", train, &train_rows), ("test", test, &test_rows)] {
        if selected.is_empty() {
            return Err(PipelineError::EmptySplit {
                split,
                start: range.start.to_string(),
                end: range.end.to_string(),
            });
        }
    }

    info!(
        "Split {} rows into {} train ({} to {}) and {} test ({} to {})",
        rows.len(),
        train_rows.len(),
        train.start,
        train.end,
        test_rows.len(),
        test.start,
        test.end
    );

    Ok(DatasetSplit {
        train: train_rows,
        test: test_rows,
    })
}

/// Dense feature matrix with labels, one row per trading day
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub values: Array2<f64>,
    pub labels: Array1<f64>,
}

impl FeatureMatrix {
    pub fn from_rows(rows: &[DerivedRow]) -> Self {
        let n_features = FEATURE_COLUMNS.len();
        let mut values = Array2::<f64>::zeros((rows.len(), n_features));
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.features().into_iter().enumerate() {
                values[[i, j]] = value;
            }
        }

        Self {
            names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            dates: rows.iter().map(|r| r.bar.date).collect(),
            values,
            labels: rows.iter().map(|r| r.label as f64).collect(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    fn with_values(&self, values: Array2<f64>) -> Self {
        Self {
            names: self.names.clone(),
            dates: self.dates.clone(),
            values,
            labels: self.labels.clone(),
        }
    }
}

/// Per-column min-max scaler, fitted once on training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub names: Vec<String>,
    pub mins: Vec<f64>,
    pub maxs: Vec<f64>,
}

impl MinMaxScaler {
    /// Records each column's observed minimum and maximum
    ///
    /// Fails with `EmptySplit` when there are no rows to fit on.
    pub fn fit(train: &FeatureMatrix) -> PipelineResult<Self> {
        if train.n_rows() == 0 {
            return Err(PipelineError::empty("train"));
        }

        let mut mins = Vec::with_capacity(train.n_features());
        let mut maxs = Vec::with_capacity(train.n_features());
        for column in train.values.axis_iter(Axis(1)) {
            mins.push(column.iter().copied().fold(f64::INFINITY, f64::min));
            maxs.push(column.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        }

        Ok(Self {
            names: train.names.clone(),
            mins,
            maxs,
        })
    }

    // Constant columns keep a unit range so they map to 0
    fn range(&self, column: usize) -> f64 {
        let range = self.maxs[column] - self.mins[column];
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }

    fn check_width(&self, matrix: &FeatureMatrix) -> PipelineResult<()> {
        if matrix.n_features() != self.mins.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.mins.len(),
                actual: matrix.n_features(),
            });
        }
        Ok(())
    }

    /// Applies the frozen train parameters; values may leave `[0, 1]`
    pub fn transform(&self, matrix: &FeatureMatrix) -> PipelineResult<FeatureMatrix> {
        self.check_width(matrix)?;
        let mut values = matrix.values.clone();
        for (j, mut column) in values.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.mins[j], self.range(j));
            column.mapv_inplace(|v| (v - min) / range);
        }
        Ok(matrix.with_values(values))
    }

    /// Maps scaled values back to the original units
    pub fn inverse_transform(&self, matrix: &FeatureMatrix) -> PipelineResult<FeatureMatrix> {
        self.check_width(matrix)?;
        let mut values = matrix.values.clone();
        for (j, mut column) in values.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.mins[j], self.range(j));
            column.mapv_inplace(|v| v * range + min);
        }
        Ok(matrix.with_values(values))
    }
}
