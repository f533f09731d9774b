// External crates
use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use std::time::Instant;

// Internal modules
use direction_boost::constants::{DEFAULT_INPUT_FILE, EXPERIMENT_DIR};
use direction_boost::daily::boost::{run_pipeline, PipelineConfig};
use direction_boost::util::model_logger::{create_experiment_dir, ModelExperiment};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Accept input and output CSV paths as command-line arguments
    let args: Vec<String> = env::args().collect();
    let input = args.get(1).map(|s| s.as_str()).unwrap_or(DEFAULT_INPUT_FILE);

    let mut config = PipelineConfig::new(input).context("Failed to build pipeline configuration")?;
    if let Some(output) = args.get(2) {
        config = config.with_output(output);
    }
    println!(
        "Using input: {} | labeled output: {}",
        config.input_path.display(),
        config.output_path.display()
    );

    let started = Instant::now();
    let report = run_pipeline(&config)
        .with_context(|| format!("Pipeline failed for {}", config.input_path.display()))?;
    let elapsed = started.elapsed().as_secs_f64();

    println!("{}", report.summary_line());

    let mut experiment = ModelExperiment::from_report(&report);
    experiment.set_training_time(elapsed);
    let experiment_dir = create_experiment_dir(Path::new(EXPERIMENT_DIR))?;
    let record_path = experiment
        .save(&experiment_dir)
        .context("Failed to save run record")?;
    log::info!("Run record saved to {}", record_path.display());

    Ok(())
}
