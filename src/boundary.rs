//! # Boundary Resolution
//!
//! Moves nominal range edges onto line boundaries. A line belongs to the
//! range holding its first byte: each range starts at its first line start
//! and reads past its nominal end until the line in progress is complete.
//! Because the end of range `i` is computed with the same rule as the start
//! of range `i + 1`, resolved spans tile the file with no gaps or overlaps.

use memchr::memchr;
use tracing::debug;

use crate::chunk::ByteRange;
use crate::error::ExtractResult;
use crate::source::{LogSource, read_full_at};

/// A range after boundary resolution. The effective span is half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub range: ByteRange,
    pub effective_start: u64,
    pub effective_end: u64,
    /// Bytes read past the nominal end to finish the last owned line.
    pub overlap_end: u64,
    /// The span reaches end of file, so a final unterminated line is complete.
    pub reaches_eof: bool,
}

impl ResolvedRange {
    pub fn index(&self) -> usize {
        self.range.index
    }

    pub fn span_len(&self) -> u64 {
        self.effective_end - self.effective_start
    }

    pub fn is_empty(&self) -> bool {
        self.effective_end == self.effective_start
    }
}

/// Resolve `range` against `source`, probing for newlines `block_size` bytes
/// at a time.
pub fn resolve_range(
    range: &ByteRange,
    source: &dyn LogSource,
    block_size: usize,
) -> ExtractResult<ResolvedRange> {
    let file_len = source.len();
    let is_last = range.end.saturating_add(1) >= file_len;

    let effective_start = if range.index == 0 || range.start == 0 {
        0
    } else {
        line_start_at_or_after(source, range.start, block_size)?
    };
    let effective_end = if is_last {
        file_len
    } else {
        line_start_at_or_after(source, range.end + 1, block_size)?
    };
    let effective_end = effective_end.max(effective_start);
    let overlap_end = effective_end.saturating_sub(range.end.saturating_add(1));

    let resolved = ResolvedRange {
        range: *range,
        effective_start,
        effective_end,
        overlap_end,
        reaches_eof: effective_end == file_len,
    };

    if resolved.is_empty() {
        debug!(
            "range {} [{}..={}] owns no line start; nothing to scan",
            range.index, range.start, range.end
        );
    } else {
        debug!(
            "range {} [{}..={}] resolved to [{}..{}) overlap={}",
            range.index, range.start, range.end, effective_start, effective_end, overlap_end
        );
    }

    Ok(resolved)
}

/// Offset of the first line that starts at or after `pos`, or the source
/// length when no line starts there.
pub fn line_start_at_or_after(
    source: &dyn LogSource,
    pos: u64,
    block_size: usize,
) -> ExtractResult<u64> {
    if pos == 0 {
        return Ok(0);
    }
    if pos >= source.len() {
        return Ok(source.len());
    }
    match find_newline(source, pos - 1, block_size)? {
        Some(newline) => Ok(newline + 1),
        None => Ok(source.len()),
    }
}

/// Absolute offset of the first `\n` at or after `from`.
///
/// Walks forward block by block, so a line longer than any number of
/// nominal ranges is still found.
pub fn find_newline(
    source: &dyn LogSource,
    from: u64,
    block_size: usize,
) -> ExtractResult<Option<u64>> {
    let len = source.len();
    let mut buf = vec![0u8; block_size.max(1)];
    let mut offset = from;

    while offset < len {
        let want = ((len - offset) as usize).min(buf.len());
        let n = read_full_at(source, offset, &mut buf[..want])?;
        if n == 0 {
            break;
        }
        if let Some(i) = memchr(b'\n', &buf[..n]) {
            return Ok(Some(offset + i as u64));
        }
        offset += n as u64;
    }

    Ok(None)
}
