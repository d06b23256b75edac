use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{info, warn};

use logslice::{ExtractOptions, cli, config, constants, extract, logging};

fn main() -> Result<()> {
    let cli_opts = cli::parse();
    logging::init_logging(cli_opts.log_format);

    let loaded = config::load_config(cli_opts.config_path.as_deref())?;
    let mut opts = ExtractOptions::from_config(&loaded);
    if let Some(dir) = cli_opts.output.clone() {
        opts.output_dir = dir;
    }
    if let Some(workers) = cli_opts.workers {
        opts.workers = workers;
    }
    if let Some(kib) = cli_opts.read_block_kib {
        opts.read_block_size = kib.saturating_mul(constants::KIB) as usize;
    }
    if cli_opts.summary {
        opts.write_summary = true;
    }

    let cancel_flag = Arc::new(AtomicBool::new(false));
    {
        let flag = cancel_flag.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        }) {
            warn!("failed to install Ctrl+C handler: {err}");
        }
    }

    let stats = extract::extract_with_cancel(
        &cli_opts.log_file,
        &cli_opts.target_date,
        &opts,
        Some(cancel_flag),
        None,
    )
    .with_context(|| {
        format!(
            "extracting {} from {}",
            cli_opts.target_date,
            cli_opts.log_file.display()
        )
    })?;

    info!(
        "logs for {} extracted successfully to {} ({} lines)",
        cli_opts.target_date,
        stats.output_path.display(),
        stats.lines_matched
    );
    Ok(())
}
