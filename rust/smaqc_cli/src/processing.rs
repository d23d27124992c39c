use super::config::{
    Config,
    DatasetConfig,
    OutputConfig,
};
use crate::errors::CliError;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use serde::Serialize;
use smaqc::{
    DatasetResults,
    Dispatcher,
    MetricRunner,
    RunContext,
    SqliteStore,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{
    info,
    instrument,
};

/// What gets written for one dataset.
#[derive(Serialize)]
struct DatasetReport<'a> {
    dataset: &'a str,
    #[serde(flatten)]
    results: &'a DatasetResults,
}

fn output_path(output: &OutputConfig, dataset: &DatasetConfig) -> PathBuf {
    output
        .directory
        .join(format!("{}.smaqc.json", dataset.name))
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn write_report(
    report: &DatasetReport<'_>,
    output: Option<&OutputConfig>,
    dataset: &DatasetConfig,
) -> Result<(), CliError> {
    match output {
        Some(output) => {
            let path = output_path(output, dataset);
            let writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(writer, report)?;
            info!("Wrote results for {} to {}", dataset.name, path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

/// Computes `names` for every configured dataset, one dataset at a time.
#[instrument(skip_all, fields(database = %config.database.display()))]
pub fn process_datasets(config: &Config, names: &[&str]) -> Result<(), CliError> {
    let start = Instant::now();
    if let Some(output) = &config.output {
        std::fs::create_dir_all(&output.directory)?;
    }

    let store = SqliteStore::open(&config.database)?;
    let first_run = RunContext::new(
        config.datasets.first().map(|x| x.run_id).unwrap_or_default(),
        config.mode,
    );
    let mut runner = MetricRunner::new(Dispatcher::new(store, first_run));

    for dataset in &config.datasets {
        info!(
            "Processing dataset {} (run {}, {} metrics)",
            dataset.name,
            dataset.run_id,
            names.len()
        );
        let bar = ProgressBar::new(names.len() as u64).with_style(progress_style());
        let run = RunContext::new(dataset.run_id, config.mode);
        let results = runner.run_dataset_with_progress(run, names, |outcome, _, _| {
            bar.set_message(outcome.name.clone());
            bar.inc(1);
        });
        bar.finish_and_clear();

        let report = DatasetReport {
            dataset: &dataset.name,
            results: &results,
        };
        write_report(&report, config.output.as_ref(), dataset)?;
    }

    info!(
        "Finished {} datasets in {:?}",
        config.datasets.len(),
        start.elapsed()
    );
    Ok(())
}
