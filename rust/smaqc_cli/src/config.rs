use serde::{
    Deserialize,
    Serialize,
};
use smaqc::Mode;
use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};
use tracing::warn;

use crate::cli::Cli;
use crate::errors::CliError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: PathBuf,
    pub mode: Mode,
    /// Metric names to compute, in report order. The full catalog when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<String>>,
    pub datasets: Vec<DatasetConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    pub name: String,
    pub run_id: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn template() -> Self {
        Self {
            database: PathBuf::from("qc.sqlite"),
            mode: Mode::Phrp,
            metrics: Some(vec![
                "C_1A".to_string(),
                "C_2A".to_string(),
                "MS1_5C".to_string(),
                "P_2C".to_string(),
            ]),
            datasets: vec![DatasetConfig {
                name: "Dataset_A".to_string(),
                run_id: 1,
            }],
            output: Some(OutputConfig {
                directory: PathBuf::from("smaqc_results"),
            }),
        }
    }

    /// Command line values take precedence over the file.
    pub fn apply_cli(&mut self, args: &Cli) {
        if let Some(database) = &args.database {
            self.database = database.clone();
        }
        if let Some(mode) = args.mode {
            self.mode = mode;
        }
        if let Some(directory) = &args.output_dir {
            self.output = Some(OutputConfig {
                directory: directory.clone(),
            });
        }
    }

    /// Metric names to run, in order. Falls back to `catalog` when none are configured.
    pub fn metric_names<'a>(&'a self, catalog: &[&'static str]) -> Vec<&'a str> {
        match &self.metrics {
            Some(names) => names.iter().map(|x| x.as_str()).collect(),
            None => catalog.to_vec(),
        }
    }

    pub fn validate(&self, catalog: &[&'static str]) -> Result<(), CliError> {
        if self.datasets.is_empty() {
            return Err(CliError::Config("no datasets configured".to_string()));
        }

        let mut names = HashSet::new();
        for dataset in &self.datasets {
            if dataset.name.trim().is_empty() {
                return Err(CliError::Config(format!(
                    "dataset with run id {} has an empty name",
                    dataset.run_id
                )));
            }
            if !names.insert(dataset.name.as_str()) {
                return Err(CliError::Config(format!(
                    "dataset `{}` is listed more than once",
                    dataset.name
                )));
            }
        }

        if let Some(metrics) = &self.metrics {
            let mut seen = HashSet::new();
            for name in metrics {
                if !seen.insert(name.as_str()) {
                    return Err(CliError::Config(format!(
                        "metric `{}` is listed more than once",
                        name
                    )));
                }
                if !catalog.contains(&name.as_str()) {
                    warn!("Metric {} is not in the catalog and will be reported as Null", name);
                }
            }
        }
        Ok(())
    }
}
