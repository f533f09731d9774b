// External crates
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

// Internal modules
use crate::constants::{DATE_COLUMN, LABEL_COLUMN, RETURN_COLUMN};
use crate::daily::boost::step_2_feature_labels::DerivedRow;

/// Maps a raw header to its standard lowercase name, if it is a known alias
pub fn standard_column_name(column_name: &str) -> Option<&'static str> {
    let standard = match column_name.trim().to_lowercase().as_str() {
        "open" | "o" | "op" | "openprice" | "open_price" => "open",
        "high" | "h" | "highprice" | "high_price" | "max" => "high",
        "low" | "l" | "lowprice" | "low_price" | "min" => "low",
        "close" | "c" | "cl" | "closeprice" | "close_price" => "close",
        "volume" | "vol" | "v" | "volumes" => "volume",
        "timestamp" | "time" | "date" | "t" | "datetime" | "dt" | "day" => DATE_COLUMN,
        "adj close" | "adj_close" | "adjusted close" | "adjusted_close" | "adjclose" | "adj" => {
            "adjusted_close"
        }
        _ => return None,
    };
    Some(standard)
}

/// Reads a daily price CSV with standardized column names
///
/// Headers are matched case-insensitively against common abbreviations
/// (`Open`, `o`, `open_price`, `Date`, `timestamp`, ...), so files exported
/// from most data vendors load without editing.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
///
/// # Returns
///
/// Returns the DataFrame with renamed columns
pub fn read_price_csv<P: AsRef<Path>>(file_path: P) -> PolarsResult<DataFrame> {
    let file = File::open(file_path.as_ref())?;
    let mut df = CsvReader::new(file).finish()?;

    let mut rename_columns = Vec::new();
    for column_name in df.get_column_names() {
        if let Some(standard_name) = standard_column_name(column_name.as_str()) {
            if column_name.as_str() != standard_name {
                rename_columns.push((column_name.to_string(), standard_name));
            }
        }
    }

    if !rename_columns.is_empty() {
        info!("Renaming columns: {:?}", rename_columns);
        for (old_name, new_name) in rename_columns {
            df.rename(&old_name, new_name.into())?;
        }
    }

    Ok(df)
}

/// Builds the export frame for the cleaned and labeled dataset
pub fn derived_rows_to_dataframe(rows: &[DerivedRow]) -> PolarsResult<DataFrame> {
    let dates: Vec<String> = rows
        .iter()
        .map(|r| r.bar.date.format("%Y-%m-%d").to_string())
        .collect();
    let open: Vec<f64> = rows.iter().map(|r| r.bar.open).collect();
    let high: Vec<f64> = rows.iter().map(|r| r.bar.high).collect();
    let low: Vec<f64> = rows.iter().map(|r| r.bar.low).collect();
    let close: Vec<f64> = rows.iter().map(|r| r.bar.close).collect();
    let volume: Vec<f64> = rows.iter().map(|r| r.bar.volume).collect();
    let returns: Vec<f64> = rows.iter().map(|r| r.close_return).collect();
    let labels: Vec<i32> = rows.iter().map(|r| r.label as i32).collect();

    DataFrame::new(vec![
        Column::new(DATE_COLUMN.into(), dates),
        Column::new("open".into(), open),
        Column::new("high".into(), high),
        Column::new("low".into(), low),
        Column::new("close".into(), close),
        Column::new("volume".into(), volume),
        Column::new(RETURN_COLUMN.into(), returns),
        Column::new(LABEL_COLUMN.into(), labels),
    ])
}

/// Writes the cleaned and labeled dataset back out as CSV
///
/// # Arguments
///
/// * `rows` - Derived rows in date order
/// * `file_path` - Destination; parent directories are created
///
/// # Returns
///
/// Returns the number of rows written
pub fn write_labeled_csv<P: AsRef<Path>>(rows: &[DerivedRow], file_path: P) -> PolarsResult<usize> {
    let path = file_path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut df = derived_rows_to_dataframe(rows)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    info!("Wrote {} labeled rows to {}", df.height(), path.display());
    Ok(df.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_standard_column_name_aliases() {
        assert_eq!(standard_column_name("Open"), Some("open"));
        assert_eq!(standard_column_name("CLOSE_PRICE"), Some("close"));
        assert_eq!(standard_column_name("Vol"), Some("volume"));
        assert_eq!(standard_column_name("Date"), Some("date"));
        assert_eq!(standard_column_name("timestamp"), Some("date"));
        assert_eq!(standard_column_name("Adj Close"), Some("adjusted_close"));
        assert_eq!(standard_column_name("symbol"), None);
    }

    #[test]
    fn test_read_price_csv_renames_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
        writeln!(file, "2023-01-03,10.0,11.0,9.5,10.5,1000").unwrap();
        writeln!(file, "2023-01-04,10.5,11.5,10.0,11.0,1200").unwrap();
        drop(file);

        let df = read_price_csv(&path).unwrap();
        for column in ["date", "open", "high", "low", "close", "volume"] {
            assert!(df.schema().contains(column), "Column {} missing", column);
        }
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_read_price_csv_missing_file() {
        let result = read_price_csv("definitely_missing_prices.csv");
        assert!(result.is_err());
    }
}
