// External imports
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::path::Path;

fn frame_from_closes(start: NaiveDate, closes: &[f64], volumes: &[f64]) -> Result<DataFrame> {
    let dates: Vec<String> = (0..closes.len())
        .map(|i| (start + Duration::days(i as i64)).format("%Y-%m-%d").to_string())
        .collect();
    let open: Vec<f64> = closes.iter().map(|c| c * 0.998).collect();
    let high: Vec<f64> = closes.iter().map(|c| c * 1.01).collect();
    let low: Vec<f64> = closes.iter().map(|c| c * 0.99).collect();

    let df = DataFrame::new(vec![
        Column::new("Date".into(), dates),
        Column::new("Open".into(), open),
        Column::new("High".into(), high),
        Column::new("Low".into(), low),
        Column::new("Close".into(), closes.to_vec()),
        Column::new("Volume".into(), volumes.to_vec()),
    ])?;
    Ok(df)
}

/// Daily random walk with one bar per calendar day, reproducible from `seed`
pub fn generate_daily_dataframe(start: NaiveDate, num_rows: usize, seed: u64) -> Result<DataFrame> {
    let mut rng = StdRng::seed_from_u64(seed);

    // Start with a base price around $100
    let mut price: f64 = 100.0 + rng.random::<f64>() * 50.0;
    let mut closes = Vec::with_capacity(num_rows);
    let mut volumes = Vec::with_capacity(num_rows);
    for _ in 0..num_rows {
        // Random move between -2% and +2%
        price *= 1.0 + (rng.random::<f64>() * 2.0 - 1.0) * 0.02;
        closes.push(price);
        volumes.push((rng.random::<u32>() % 100_000 + 10_000) as f64);
    }

    frame_from_closes(start, &closes, &volumes)
}

/// Strictly rising (`step > 0`) or falling (`step < 0`) closes
pub fn generate_monotonic_dataframe(start: NaiveDate, num_rows: usize, step: f64) -> Result<DataFrame> {
    let closes: Vec<f64> = (0..num_rows).map(|i| 100.0 + step * i as f64).collect();
    let volumes: Vec<f64> = (0..num_rows).map(|i| 1_000.0 + 25.0 * i as f64).collect();
    frame_from_closes(start, &closes, &volumes)
}

/// Writes a frame as CSV with a header row
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
