//! # Extraction Entry Points
//!
//! Wires planning, the parallel scan and the output writer into a single
//! run. A run either writes the complete output file or writes nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::chunk::plan_ranges;
use crate::config::{Config, LoadedConfig};
use crate::error::{ExtractError, ExtractResult};
use crate::metadata::{self, ExtractStats, RunSummary};
use crate::output;
use crate::pipeline::{self, ProgressReporter, RunOptions};
use crate::source::{LogSource, RawFileSource};

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub output_dir: PathBuf,
    pub workers: usize,
    pub read_block_size: usize,
    pub write_summary: bool,
    pub config_hash: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from_parts(&Config::default(), String::new())
    }
}

impl ExtractOptions {
    pub fn from_config(loaded: &LoadedConfig) -> Self {
        Self::from_parts(&loaded.config, loaded.config_hash.clone())
    }

    fn from_parts(cfg: &Config, config_hash: String) -> Self {
        Self {
            output_dir: cfg.output_dir.clone(),
            workers: cfg.workers,
            read_block_size: cfg.read_block_size,
            write_summary: cfg.write_summary,
            config_hash,
        }
    }

    fn validate(&self) -> ExtractResult<()> {
        Config {
            workers: self.workers,
            output_dir: self.output_dir.clone(),
            read_block_size: self.read_block_size,
            write_summary: self.write_summary,
        }
        .validate()
    }
}

/// Extract every line of `log_path` starting with `target_date` into
/// `<output_dir>/output_<target_date>.txt`.
pub fn extract(
    log_path: &Path,
    target_date: &str,
    opts: &ExtractOptions,
) -> ExtractResult<ExtractStats> {
    extract_with_cancel(log_path, target_date, opts, None, None)
}

/// Like [`extract`], with an external cancel flag and progress reporting.
pub fn extract_with_cancel(
    log_path: &Path,
    target_date: &str,
    opts: &ExtractOptions,
    cancel_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressReporter>>,
) -> ExtractResult<ExtractStats> {
    validate_target_date(target_date)?;
    opts.validate()?;

    let source = RawFileSource::open(log_path)?;
    let source: Arc<dyn LogSource> = Arc::new(source);
    let label = log_path.display().to_string();
    run_source(source, &label, target_date, opts, cancel_flag, progress)
}

/// Run an extraction against an already opened source.
pub fn extract_from_source(
    source: Arc<dyn LogSource>,
    source_label: &str,
    target_date: &str,
    opts: &ExtractOptions,
    cancel_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressReporter>>,
) -> ExtractResult<ExtractStats> {
    validate_target_date(target_date)?;
    opts.validate()?;
    run_source(source, source_label, target_date, opts, cancel_flag, progress)
}

/// Plan, scan and write. Options must already be validated.
fn run_source(
    source: Arc<dyn LogSource>,
    source_label: &str,
    target_date: &str,
    opts: &ExtractOptions,
    cancel_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressReporter>>,
) -> ExtractResult<ExtractStats> {
    let started_at = Utc::now();
    let start = Instant::now();
    let file_size = source.len();
    let ranges = plan_ranges(file_size, opts.workers)?;
    let output_path = output::output_path(&opts.output_dir, target_date);

    info!(
        "starting extraction input={} target_date={} output={} workers={} ranges={} size={}",
        source_label,
        target_date,
        output_path.display(),
        opts.workers,
        ranges.len(),
        file_size
    );

    let run_opts = RunOptions {
        read_block_size: opts.read_block_size,
        cancel_flag,
        progress,
    };
    let result = pipeline::run_ranges(&ranges, source, target_date.as_bytes(), &run_opts)?;

    output::write_output(&result, &output_path)?;

    let stats = ExtractStats {
        output_path,
        file_size,
        ranges: ranges.len(),
        bytes_scanned: result.bytes_scanned(),
        lines_matched: result.lines_matched(),
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        "run_summary output={} lines_matched={} bytes_scanned={} ranges={} elapsed={:.3}s config_hash={}",
        stats.output_path.display(),
        stats.lines_matched,
        stats.bytes_scanned,
        stats.ranges,
        stats.elapsed_seconds,
        opts.config_hash
    );

    if opts.write_summary {
        let summary = RunSummary {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            started_at,
            log_path: source_label.to_string(),
            target_date: target_date.to_string(),
            workers: opts.workers,
            config_hash: opts.config_hash.clone(),
            stats: stats.clone(),
        };
        // the output is already persisted; a missing summary does not fail the run
        let path = metadata::summary_path(&opts.output_dir, target_date);
        match metadata::write_summary(&summary, &path) {
            Ok(()) => info!("run summary written to {}", path.display()),
            Err(err) => warn!("failed to write run summary {}: {err}", path.display()),
        }
    }

    Ok(stats)
}

/// The date is matched byte-wise, but it also names the output file.
fn validate_target_date(target_date: &str) -> ExtractResult<()> {
    if target_date.is_empty() {
        return Err(ExtractError::InvalidConfig(
            "target date must not be empty".to_string(),
        ));
    }
    if target_date.contains(['/', '\\', '\0']) {
        return Err(ExtractError::InvalidConfig(format!(
            "target date {target_date:?} cannot be used in an output file name"
        )));
    }
    Ok(())
}
