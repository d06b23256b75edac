use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ExtractResult;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractStats {
    pub output_path: PathBuf,
    pub file_size: u64,
    pub ranges: usize,
    pub bytes_scanned: u64,
    pub lines_matched: u64,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool_version: String,
    pub started_at: DateTime<Utc>,
    pub log_path: String,
    pub target_date: String,
    pub workers: usize,
    pub config_hash: String,
    #[serde(flatten)]
    pub stats: ExtractStats,
}

/// `<output_dir>/output_<target_date>.summary.json`
pub fn summary_path(output_dir: &Path, target_date: &str) -> PathBuf {
    output_dir.join(format!("output_{target_date}.summary.json"))
}

pub fn write_summary(summary: &RunSummary, path: &Path) -> ExtractResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).map_err(std::io::Error::from)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
