use clap::Parser;
use smaqc::Mode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, required_unless_present_any = ["list_metrics", "write_template"])]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database (will over-write the config file)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Identification convention, `phrp` or `legacy` (will over-write the config file)
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Path to the output directory, results go to stdout when absent
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the metric catalog and exit
    #[arg(long)]
    pub list_metrics: bool,

    /// Print a template configuration file and exit
    #[arg(long)]
    pub write_template: bool,
}
