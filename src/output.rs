use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ExtractResult;
use crate::pipeline::AggregatedResult;

/// `<output_dir>/output_<target_date>.txt`
pub fn output_path(output_dir: &Path, target_date: &str) -> PathBuf {
    output_dir.join(format!("output_{target_date}.txt"))
}

/// Persist the aggregated matches at `destination`, replacing any existing file.
///
/// Data goes to a temporary file in the same directory first and is renamed
/// into place, so a failed write leaves no truncated artifact behind.
pub fn write_output(result: &AggregatedResult, destination: &Path) -> ExtractResult<()> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    result.write_to(BufWriter::new(tmp.as_file_mut()))?;
    tmp.as_file().sync_all()?;
    tmp.persist(destination).map_err(|err| err.error)?;

    debug!(
        "wrote {} bytes ({} lines) to {}",
        result.output_len(),
        result.lines_matched(),
        destination.display()
    );
    Ok(())
}
