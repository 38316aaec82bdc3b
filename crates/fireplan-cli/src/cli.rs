use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fireplan::MosaicStrategy;

#[derive(Parser)]
#[command(name = "fireplan")]
#[command(version, about = "Plan, submit and monitor post-fire burn-severity deliverables")]
pub struct Cli {
    /// Configuration file (JSON or YAML); defaults to the user config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve and submit deliverables for one fire, or run a configured preset
    Run(RunArgs),
    /// Watch a previously submitted job until it finishes
    Monitor(MonitorArgs),
    /// List the deliverable catalog
    Deliverables,
    /// List configured presets
    Presets,
}

#[derive(Args)]
pub struct RunArgs {
    /// GeoJSON file with the region of interest
    #[arg(long, required_unless_present = "preset", conflicts_with = "preset")]
    pub region: Option<PathBuf>,

    /// First day of the fire (YYYY-MM-DD)
    #[arg(long, required_unless_present = "preset", conflicts_with = "preset")]
    pub start_date: Option<String>,

    /// Last day of the fire (YYYY-MM-DD)
    #[arg(long, required_unless_present = "preset", conflicts_with = "preset")]
    pub end_date: Option<String>,

    /// Days of imagery before the start and after the end of the fire
    #[arg(long, conflicts_with = "preset")]
    pub days: Option<u32>,

    /// Comma-separated deliverable identifiers
    #[arg(
        long,
        value_delimiter = ',',
        required_unless_present = "preset",
        conflicts_with = "preset"
    )]
    pub deliverables: Vec<String>,

    /// Name of a preset from the configuration file
    #[arg(long)]
    pub preset: Option<String>,

    /// Mosaic compositing strategy
    #[arg(long, conflicts_with = "preset")]
    pub mosaic_strategy: Option<MosaicStrategy>,

    /// Maximum scene cloud cover in percent (0-100)
    #[arg(long, conflicts_with = "preset", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub cloud_threshold: Option<u8>,

    /// Plan and report without contacting the backend
    #[arg(long)]
    pub dry_run: bool,

    /// Monitor every submitted export until it finishes
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args)]
pub struct MonitorArgs {
    /// Job handle returned by an earlier run
    #[arg(long)]
    pub job: String,

    /// Label used in log lines and notifications
    #[arg(long)]
    pub label: Option<String>,

    /// Address to notify once the job finishes
    #[arg(long)]
    pub notify: Option<String>,

    /// Seconds between status requests (overrides the configuration)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Seconds before giving up (overrides the configuration)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Answer every status request with COMPLETED without contacting the backend
    #[arg(long)]
    pub dry_run: bool,
}
