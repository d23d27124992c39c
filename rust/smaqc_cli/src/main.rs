mod cli;
mod config;
mod errors;
mod processing;

use clap::Parser;
use smaqc::{
    MetricRegistry,
    SqliteStore,
};
use tracing::info;
use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

use cli::Cli;
use config::Config;
use errors::CliError;

#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE));
    set_global_default(subscriber).expect("Setting default subscriber failed");

    let args = Cli::parse();
    let registry = MetricRegistry::<SqliteStore>::new();

    if args.list_metrics {
        for entry in registry.entries() {
            println!("{:<8} {}", entry.name, entry.description);
        }
        return Ok(());
    }
    if args.write_template {
        println!("{}", serde_json::to_string_pretty(&Config::template())?);
        return Ok(());
    }

    let Some(config_path) = args.config.as_ref() else {
        return Err(CliError::Config(
            "No config file provided, pass one with --config".to_string(),
        ));
    };
    let mut config = Config::from_path(config_path)?;
    config.apply_cli(&args);
    config.validate(registry.catalog_names())?;
    info!("Parsed configuration: {:#?}", config);

    let names = config.metric_names(registry.catalog_names());
    processing::process_datasets(&config, &names)?;
    Ok(())
}
