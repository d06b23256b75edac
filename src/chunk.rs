use crate::error::{ExtractError, ExtractResult};

/// Nominal byte range handed to one worker. `end` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Split `[0, file_size)` into at most `workers` contiguous ranges of
/// `ceil(file_size / workers)` bytes; the last one is clamped to the file.
///
/// Fewer ranges than workers are returned when the file is too small to give
/// every worker at least one byte. An empty file yields an empty plan.
pub fn plan_ranges(file_size: u64, workers: usize) -> ExtractResult<Vec<ByteRange>> {
    if workers == 0 {
        return Err(ExtractError::InvalidConfig(
            "worker count must be greater than zero".to_string(),
        ));
    }
    if file_size == 0 {
        return Ok(Vec::new());
    }

    let chunk_size = file_size.div_ceil(workers as u64);
    let planned = file_size.div_ceil(chunk_size);
    let mut ranges = Vec::with_capacity(usize::try_from(planned).unwrap_or(workers).min(workers));
    let mut start = 0u64;
    let mut index = 0usize;

    while start < file_size && index < workers {
        let end = start.saturating_add(chunk_size - 1).min(file_size - 1);
        ranges.push(ByteRange { index, start, end });
        start = end + 1;
        index += 1;
    }

    Ok(ranges)
}
