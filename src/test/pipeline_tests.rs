#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use polars::prelude::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::{tempdir, TempDir};

    use crate::daily::boost::step_5_train_model::BoosterParams;
    use crate::daily::boost::{run_pipeline, PipelineConfig};
    use crate::error::PipelineError;
    use crate::util::test_utils::{generate_daily_dataframe, generate_monotonic_dataframe, write_csv};

    // 20 daily bars from 2021-12-20 give 18 derived rows: 11 in 2021, 7 in 2022
    fn monotonic_csv(step: f64) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("TEST_daily_ohlcv.csv");
        let start = NaiveDate::from_ymd_opt(2021, 12, 20).unwrap();
        let mut df = generate_monotonic_dataframe(start, 20, step).unwrap();
        write_csv(&mut df, &path).unwrap();
        (dir, path)
    }

    fn read_labels(path: &Path) -> Vec<i64> {
        let df = CsvReader::new(File::open(path).unwrap()).finish().unwrap();
        let labels = df.column("label").unwrap().cast(&DataType::Int64).unwrap();
        let labels: Vec<i64> = labels.i64().unwrap().into_no_null_iter().collect();
        labels
    }

    #[test]
    fn test_rising_series_end_to_end() {
        let (_dir, path) = monotonic_csv(1.0);
        let config = PipelineConfig::new(&path).unwrap();
        let report = run_pipeline(&config).unwrap();

        assert_eq!(report.clean_bars, 20);
        assert_eq!(report.derived_rows, 18);
        assert_eq!(report.label_balance, (18, 0));
        assert_eq!(report.train_rows, 11);
        assert_eq!(report.test_rows, 7);
        assert_eq!(report.model.num_rounds(), 100);
        assert_eq!(report.accuracy(), 1.0);
        assert!(report.evaluation.predictions.iter().all(|&p| p == 0));
        assert_eq!(
            report.summary_line(),
            "Test accuracy: 100.00% after 100 boosting rounds"
        );

        assert!(config.output_path.exists());
        let labels = read_labels(&config.output_path);
        assert_eq!(labels.len(), 18);
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_falling_series_end_to_end() {
        let (_dir, path) = monotonic_csv(-1.0);
        let config = PipelineConfig::new(&path).unwrap();
        let report = run_pipeline(&config).unwrap();

        assert_eq!(report.label_balance, (0, 18));
        assert_eq!(report.accuracy(), 1.0);
        assert!(report.evaluation.predictions.iter().all(|&p| p == 1));

        let labels = read_labels(&config.output_path);
        assert!(labels.iter().all(|&l| l == 1));
    }

    #[test]
    fn test_export_columns_and_dates() {
        let (dir, path) = monotonic_csv(0.5);
        let output = dir.path().join("nested").join("out.csv");
        let config = PipelineConfig::new(&path).unwrap().with_output(&output);
        run_pipeline(&config).unwrap();

        let df = CsvReader::new(File::open(&output).unwrap()).finish().unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["date", "open", "high", "low", "close", "volume", "close_return", "label"]
        );

        let dates = df.column("date").unwrap().str().unwrap();
        assert_eq!(dates.get(0), Some("2021-12-21"));
        assert_eq!(dates.get(17), Some("2022-01-07"));

        // No missing or non-finite value reaches the export
        for column in ["open", "high", "low", "close", "volume", "close_return"] {
            let values = df.column(column).unwrap().cast(&DataType::Float64).unwrap();
            let values = values.f64().unwrap();
            assert_eq!(values.null_count(), 0);
            assert!(values.into_no_null_iter().all(f64::is_finite));
        }
    }

    #[test]
    fn test_random_walk_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("WALK_daily.csv");
        let start = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let mut df = generate_daily_dataframe(start, 400, 7).unwrap();
        write_csv(&mut df, &path).unwrap();

        let mut config = PipelineConfig::new(&path).unwrap();
        config.booster = BoosterParams {
            num_rounds: 20,
            ..BoosterParams::default()
        };
        let report = run_pipeline(&config).unwrap();

        assert_eq!(report.derived_rows, 398);
        assert_eq!(report.train_rows + report.test_rows, 398);
        assert!((0.0..=1.0).contains(&report.accuracy()));
        assert_eq!(report.evaluation.confusion.total(), report.test_rows);
        assert!(report.evaluation.scores.iter().all(|s| (0.0..=1.0).contains(s)));

        let losses = report.model.train_log_loss();
        assert_eq!(losses.len(), 20);
        assert!(losses.windows(2).all(|w| w[1] <= w[0] + 1e-12));
    }

    #[test]
    fn test_incomplete_rows_never_reach_training() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("GAPS.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
        let mut day = NaiveDate::from_ymd_opt(2021, 12, 25).unwrap();
        for i in 0..16 {
            let close = 50.0 + i as f64;
            if i == 4 {
                writeln!(file, "{},{},{},{},,{}", day, close, close + 1.0, close - 1.0, 900).unwrap();
            } else if i == 9 {
                writeln!(file, "{},{},{},{},{},", day, close, close + 1.0, close - 1.0, close).unwrap();
            } else {
                writeln!(file, "{},{},{},{},{},{}", day, close, close + 1.0, close - 1.0, close, 900 + i).unwrap();
            }
            day = day.succ_opt().unwrap();
        }
        drop(file);

        let report = run_pipeline(&PipelineConfig::new(&path).unwrap()).unwrap();
        assert_eq!(report.clean_bars, 14);
        assert_eq!(report.derived_rows, 12);
    }

    #[test]
    fn test_empty_split_fails_loudly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("LATE.csv");
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut df = generate_monotonic_dataframe(start, 20, 1.0).unwrap();
        write_csv(&mut df, &path).unwrap();

        match run_pipeline(&PipelineConfig::new(&path).unwrap()) {
            Err(PipelineError::EmptySplit { split, start, end }) => {
                assert_eq!(split, "train");
                assert_eq!(start, "2015-01-01");
                assert_eq!(end, "2021-12-31");
            }
            other => panic!("Expected EmptySplit, got {:?}", other.map(|r| r.accuracy())),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NOPE.csv");
        let result = run_pipeline(&PipelineConfig::new(&path).unwrap());
        assert!(matches!(result, Err(PipelineError::FileNotFound(p)) if p == path));
    }

    #[test]
    fn test_missing_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NOVOL.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Date,Open,High,Low,Close").unwrap();
        writeln!(file, "2021-12-30,1,2,0.5,1.5").unwrap();
        drop(file);

        let result = run_pipeline(&PipelineConfig::new(&path).unwrap());
        assert!(matches!(result, Err(PipelineError::MissingColumn(c)) if c == "volume"));
    }

    #[test]
    fn test_duplicate_dates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("DUP.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "date,open,high,low,close,volume").unwrap();
        writeln!(file, "2021-12-30,1,2,0.5,1.5,10").unwrap();
        writeln!(file, "2021-12-31,1,2,0.5,1.6,10").unwrap();
        writeln!(file, "2021-12-30,1,2,0.5,1.7,10").unwrap();
        drop(file);

        let result = run_pipeline(&PipelineConfig::new(&path).unwrap());
        assert!(matches!(result, Err(PipelineError::DuplicateDate(_))));
    }

    #[test]
    fn test_invalid_params_stop_before_loading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NOPE.csv");
        let mut config = PipelineConfig::new(&path).unwrap();
        config.booster.learning_rate = 0.0;

        let result = run_pipeline(&config);
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));
        assert!(!config.output_path.exists());
    }
}
