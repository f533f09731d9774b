// External crates
use log::{info, warn};
use polars::prelude::*;
use std::path::Path;

// Internal modules
use crate::constants::{DATE_COLUMN, PRICE_COLUMNS};
use crate::error::{PipelineError, PipelineResult};
use crate::util::file_utils::read_price_csv;

/// Loads and preprocesses a daily price CSV into a DataFrame
///
/// # Arguments
///
/// * `full_path` - Path to the CSV file
///
/// # Returns
///
/// Returns the DataFrame with `date` and Float64 price columns, with every
/// row containing a null in a required column removed
pub fn load_and_preprocess(full_path: &Path) -> PipelineResult<DataFrame> {
    println!("Loading data from: {}", full_path.display());

    if !full_path.exists() {
        return Err(PipelineError::FileNotFound(full_path.to_path_buf()));
    }

    let mut df = read_price_csv(full_path)?;

    // Verify required columns exist
    let mut required_columns = vec![DATE_COLUMN];
    required_columns.extend(PRICE_COLUMNS);
    for &col in &required_columns {
        if df.column(col).is_err() {
            return Err(PipelineError::MissingColumn(col.to_string()));
        }
    }

    cast_price_columns(&mut df)?;

    let missing = count_missing(&df, &required_columns)?;
    let before = df.height();
    let subset: Vec<String> = required_columns.iter().map(|c| c.to_string()).collect();
    df = df.drop_nulls(Some(subset.as_slice()))?;
    let dropped = before - df.height();
    if dropped > 0 {
        warn!("Dropped {} rows with {} missing values", dropped, missing);
    }

    info!("Loaded {} complete rows", df.height());
    Ok(df)
}

/// Casts the OHLCV columns to Float64 in place
pub fn cast_price_columns(df: &mut DataFrame) -> PolarsResult<()> {
    for col_name in PRICE_COLUMNS {
        let column = df.column(col_name)?;
        if column.dtype() != &DataType::Float64 {
            let cast = column.cast(&DataType::Float64)?;
            df.with_column(cast)?;
        }
    }
    Ok(())
}

/// Counts nulls across the given columns
///
/// # Arguments
///
/// * `df` - DataFrame to check
/// * `columns` - Columns to inspect
///
/// # Returns
///
/// Returns the total null count, or an error if a column is missing
pub fn count_missing(df: &DataFrame, columns: &[&str]) -> PolarsResult<usize> {
    let mut missing = 0;
    for &col in columns {
        missing += df.column(col)?.null_count();
    }
    Ok(missing)
}
