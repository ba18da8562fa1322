//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Debug, Parser)]
#[command(
    name = "payslip-distributor",
    version,
    about = "Generate FORM XIX wage slips and distribute them by email, WhatsApp and S3"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render and distribute wage slips for every row of a CSV file
    Generate(GenerateArgs),
    /// Check configuration, document engine and sample data
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// CSV file with one employee per row
    pub records: PathBuf,

    /// Month label for every slip; defaults to each row's Month column
    #[arg(long)]
    pub month: Option<String>,

    #[arg(long, env = "PAYSLIP_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Records processed at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Also package the retained slips into this ZIP file
    #[arg(long)]
    pub zip: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(long, env = "PAYSLIP_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(long, default_value = "sample_employee_data.csv")]
    pub sample: PathBuf,
}
