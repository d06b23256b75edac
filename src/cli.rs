use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Log file to extract from
    pub log_file: PathBuf,

    /// Date prefix to match at the start of each line (e.g. 2024-01-01)
    pub target_date: String,

    /// Output directory (overrides config when set)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of worker threads (overrides config when set)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Read block size, in KiB (overrides config when set)
    #[arg(long)]
    pub read_block_kib: Option<u64>,

    /// Optional path to config file (YAML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Write a JSON run summary next to the output file
    #[arg(long)]
    pub summary: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}
