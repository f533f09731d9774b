// External crates
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{info, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Internal modules
use crate::constants::DATE_COLUMN;
use crate::error::{PipelineError, PipelineResult};
use crate::util::pre_processor::load_and_preprocess;

/// One trading day of OHLCV data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// True when every numeric field is finite
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Parses a date cell, accepting plain dates, datetimes and RFC 3339 stamps
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.date());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    NaiveDate::parse_from_str(value, "%m/%d/%Y").ok()
}

/// Converts a preprocessed DataFrame into price bars in file order
///
/// Rows with a NaN or infinite price/volume are skipped as missing. A date
/// that cannot be parsed is an error.
pub fn dataframe_to_bars(df: &DataFrame) -> PipelineResult<Vec<PriceBar>> {
    let dates = df.column(DATE_COLUMN)?.cast(&DataType::String)?;
    let dates = dates.str()?;
    let open = df.column("open")?.f64()?;
    let high = df.column("high")?.f64()?;
    let low = df.column("low")?.f64()?;
    let close = df.column("close")?.f64()?;
    let volume = df.column("volume")?.f64()?;

    let mut bars = Vec::with_capacity(df.height());
    let mut skipped = 0;
    for row in 0..df.height() {
        let raw_date = dates.get(row).unwrap_or("");
        let date = parse_date(raw_date).ok_or_else(|| PipelineError::InvalidDate {
            row,
            value: raw_date.to_string(),
        })?;

        let fields = (
            open.get(row),
            high.get(row),
            low.get(row),
            close.get(row),
            volume.get(row),
        );
        let bar = match fields {
            (Some(open), Some(high), Some(low), Some(close), Some(volume)) => PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            },
            _ => {
                skipped += 1;
                continue;
            }
        };

        if bar.is_complete() {
            bars.push(bar);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        warn!("Skipped {} rows with non-finite values", skipped);
    }
    Ok(bars)
}

/// Sorts bars by date and rejects repeated dates
pub fn order_by_date(mut bars: Vec<PriceBar>) -> PipelineResult<Vec<PriceBar>> {
    bars.sort_by_key(|bar| bar.date);
    if let Some(window) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(PipelineError::DuplicateDate(window[0].date));
    }
    Ok(bars)
}

/// Loads a daily CSV into complete, date-ordered price bars
///
/// # Arguments
///
/// * `csv_path` - Path to the CSV file
///
/// # Returns
///
/// Returns the bars sorted by date, or the first loading error
pub fn load_price_bars(csv_path: &Path) -> PipelineResult<Vec<PriceBar>> {
    let df = load_and_preprocess(csv_path)?;
    let bars = order_by_date(dataframe_to_bars(&df)?)?;

    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        info!(
            "Loaded {} bars from {} to {}",
            bars.len(),
            first.date,
            last.date
        );
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 14).unwrap();
        assert_eq!(parse_date("2023-03-14"), Some(expected));
        assert_eq!(parse_date("2023-03-14 16:00:00"), Some(expected));
        assert_eq!(parse_date("2023-03-14T16:00:00-05:00"), Some(expected));
        assert_eq!(parse_date("03/14/2023"), Some(expected));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_dataframe_to_bars_skips_nan() {
        let df = df!(
            "date" => ["2023-01-02", "2023-01-03", "2023-01-04"],
            "open" => [1.0, f64::NAN, 3.0],
            "high" => [1.5, 2.5, 3.5],
            "low" => [0.5, 1.5, 2.5],
            "close" => [1.2, 2.2, 3.2],
            "volume" => [10.0, 20.0, 30.0]
        )
        .unwrap();

        let bars = dataframe_to_bars(&df).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(PriceBar::is_complete));
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2023, 1, 4).unwrap());
    }

    #[test]
    fn test_dataframe_to_bars_invalid_date() {
        let df = df!(
            "date" => ["2023-01-02", "not a date"],
            "open" => [1.0, 2.0],
            "high" => [1.5, 2.5],
            "low" => [0.5, 1.5],
            "close" => [1.2, 2.2],
            "volume" => [10.0, 20.0]
        )
        .unwrap();

        let result = dataframe_to_bars(&df);
        assert!(matches!(result, Err(PipelineError::InvalidDate { row: 1, .. })));
    }

    #[test]
    fn test_order_by_date_sorts_and_rejects_duplicates() {
        let bar = |day: u32, close: f64| PriceBar {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        };

        let ordered = order_by_date(vec![bar(5, 3.0), bar(3, 1.0), bar(4, 2.0)]).unwrap();
        let closes: Vec<f64> = ordered.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);

        let duplicated = order_by_date(vec![bar(3, 1.0), bar(3, 2.0)]);
        assert!(matches!(duplicated, Err(PipelineError::DuplicateDate(_))));
    }
}
