// External crates
use log::info;
use serde::{Deserialize, Serialize};

// Internal modules
use super::step_1_data_preparation::PriceBar;
use crate::error::{PipelineError, PipelineResult};
use crate::util::feature_engineering::{calculate_close_returns, calculate_direction_labels};

/// A price bar with its derived return and direction label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    pub bar: PriceBar,
    /// Percent change from the prior close, as a fraction
    pub close_return: f64,
    /// 1 when the next close is not higher than this close, else 0
    pub label: u8,
}

impl DerivedRow {
    /// Model inputs in `FEATURE_COLUMNS` order
    pub fn features(&self) -> [f64; 6] {
        [
            self.bar.open,
            self.bar.high,
            self.bar.low,
            self.bar.close,
            self.bar.volume,
            self.close_return,
        ]
    }
}

/// Derives returns and labels, keeping only rows where both are defined
///
/// The first bar (no prior close) and the last bar (no next close) are always
/// dropped, so `N` clean bars give `N - 2` rows.
///
/// # Arguments
///
/// * `bars` - Complete bars in date order
///
/// # Returns
///
/// Returns the derived rows in date order
pub fn build_derived_rows(bars: &[PriceBar]) -> PipelineResult<Vec<DerivedRow>> {
    if bars.len() < 3 {
        return Err(PipelineError::InsufficientData(format!(
            "need at least 3 bars to derive a labeled row, got {}",
            bars.len()
        )));
    }

    let returns = calculate_close_returns(bars);
    let labels = calculate_direction_labels(bars);

    let rows: Vec<DerivedRow> = bars
        .iter()
        .zip(returns)
        .zip(labels)
        .filter_map(|((bar, close_return), label)| {
            Some(DerivedRow {
                bar: *bar,
                close_return: close_return?,
                label: label?,
            })
        })
        .collect();

    let (down, up) = label_balance(&rows);
    info!(
        "Derived {} labeled rows from {} bars (label 0: {}, label 1: {})",
        rows.len(),
        bars.len(),
        down,
        up
    );
    Ok(rows)
}

/// Counts rows labeled 0 and 1
pub fn label_balance(rows: &[DerivedRow]) -> (usize, usize) {
    let ones = rows.iter().filter(|r| r.label == 1).count();
    (rows.len() - ones, ones)
}
