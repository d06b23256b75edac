//! # Range Scanner
//!
//! Streams one resolved span in bounded blocks and keeps the lines whose
//! leading bytes equal the target prefix.

use std::sync::atomic::{AtomicBool, Ordering};

use memchr::memchr;

use crate::boundary::ResolvedRange;
use crate::error::{ExtractError, ExtractResult};
use crate::source::{LogSource, read_full_at};

/// Matching lines from one range, newline-terminated, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    pub index: usize,
    pub data: Vec<u8>,
    pub lines: u64,
    pub bytes_scanned: u64,
}

impl MatchSet {
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }
}

pub struct PrefixScanner {
    target: Vec<u8>,
    block_size: usize,
}

impl PrefixScanner {
    pub fn new(target: &[u8], block_size: usize) -> Self {
        Self {
            target: target.to_vec(),
            block_size: block_size.max(1),
        }
    }

    /// Scan `resolved` and collect matching lines.
    ///
    /// The cancel flag is polled between blocks.
    pub fn scan_range(
        &self,
        resolved: &ResolvedRange,
        source: &dyn LogSource,
        cancel: &AtomicBool,
    ) -> ExtractResult<MatchSet> {
        let mut filter = LineFilter::new(&self.target);
        let mut buf = vec![0u8; self.block_size];
        let mut offset = resolved.effective_start;

        while offset < resolved.effective_end {
            if cancel.load(Ordering::Relaxed) {
                return Err(ExtractError::Cancelled);
            }
            let want = ((resolved.effective_end - offset) as usize).min(buf.len());
            let n = read_full_at(source, offset, &mut buf[..want])?;
            if n < want {
                return Err(ExtractError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "log ended at offset {} while scanning up to {}",
                        offset + n as u64,
                        resolved.effective_end
                    ),
                )));
            }
            filter.feed(&buf[..n]);
            offset += n as u64;
        }

        if resolved.reaches_eof {
            filter.finish_unterminated();
        }

        Ok(MatchSet {
            index: resolved.index(),
            data: filter.out,
            lines: filter.matched,
            bytes_scanned: resolved.span_len(),
        })
    }
}

/// Incremental prefix filter. A line is dropped as soon as its leading
/// bytes diverge from the target, so non-matching lines are never buffered.
struct LineFilter<'a> {
    target: &'a [u8],
    line: Vec<u8>,
    pending: bool,
    rejected: bool,
    out: Vec<u8>,
    matched: u64,
}

impl<'a> LineFilter<'a> {
    fn new(target: &'a [u8]) -> Self {
        Self {
            target,
            line: Vec::new(),
            pending: false,
            rejected: false,
            out: Vec::new(),
            matched: 0,
        }
    }

    fn feed(&mut self, mut block: &[u8]) {
        while !block.is_empty() {
            match memchr(b'\n', block) {
                Some(i) => {
                    self.push_partial(&block[..i]);
                    self.finish_line();
                    block = &block[i + 1..];
                }
                None => {
                    self.push_partial(block);
                    break;
                }
            }
        }
    }

    fn push_partial(&mut self, segment: &[u8]) {
        if !segment.is_empty() {
            self.pending = true;
        }
        if self.rejected {
            return;
        }
        self.line.extend_from_slice(segment);
        let probe = self.line.len().min(self.target.len());
        if self.line[..probe] != self.target[..probe] {
            self.rejected = true;
            self.line.clear();
        }
    }

    fn finish_line(&mut self) {
        if !self.rejected && self.line.starts_with(self.target) {
            self.out.extend_from_slice(&self.line);
            self.out.push(b'\n');
            self.matched += 1;
        }
        self.line.clear();
        self.pending = false;
        self.rejected = false;
    }

    /// Treat a trailing line without `\n` as complete. Only valid at EOF.
    fn finish_unterminated(&mut self) {
        if self.pending {
            self.finish_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ByteRange;
    use crate::source::SourceError;

    struct MemSource(Vec<u8>);

    impl LogSource for MemSource {
        fn len(&self) -> u64 {
            self.0.len() as u64
        }

        fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, SourceError> {
            let start = (offset as usize).min(self.0.len());
            let n = buf.len().min(self.0.len() - start);
            buf[..n].copy_from_slice(&self.0[start..start + n]);
            Ok(n)
        }
    }

    fn whole(data: &[u8]) -> ResolvedRange {
        let len = data.len() as u64;
        ResolvedRange {
            range: ByteRange {
                index: 0,
                start: 0,
                end: len.saturating_sub(1),
            },
            effective_start: 0,
            effective_end: len,
            overlap_end: 0,
            reaches_eof: true,
        }
    }

    fn scan(data: &[u8], target: &str, block: usize) -> MatchSet {
        let src = MemSource(data.to_vec());
        let cancel = AtomicBool::new(false);
        PrefixScanner::new(target.as_bytes(), block)
            .scan_range(&whole(data), &src, &cancel)
            .expect("scan")
    }

    #[test]
    fn keeps_matching_lines_in_order() {
        let data = b"2024-01-01 a\n2024-01-02 b\n2024-01-01 c\n";
        for block in [1, 3, 7, 64] {
            let set = scan(data, "2024-01-01", block);
            assert_eq!(set.data, b"2024-01-01 a\n2024-01-01 c\n");
            assert_eq!(set.lines, 2);
            assert_eq!(set.bytes_scanned, data.len() as u64);
        }
    }

    #[test]
    fn unterminated_last_line_is_kept_at_eof() {
        let set = scan(b"2024-01-02 x\n2024-01-01 tail", "2024-01-01", 4);
        assert_eq!(set.data, b"2024-01-01 tail\n");
    }

    #[test]
    fn unterminated_line_dropped_when_span_stops_short_of_eof() {
        let data = b"2024-01-01 a\n2024-01-01 b";
        let src = MemSource(data.to_vec());
        let mut resolved = whole(data);
        resolved.reaches_eof = false;
        let cancel = AtomicBool::new(false);
        let set = PrefixScanner::new(b"2024-01-01", 8)
            .scan_range(&resolved, &src, &cancel)
            .expect("scan");
        assert_eq!(set.data, b"2024-01-01 a\n");
    }

    #[test]
    fn prefix_match_is_case_and_byte_exact() {
        let data = b"abc one\nABC two\nab\n abc three\nabcdef\n";
        let set = scan(data, "abc", 2);
        assert_eq!(set.data, b"abc one\nabcdef\n");
    }

    #[test]
    fn short_lines_never_match() {
        let set = scan(b"2024\n2024-01\n\n", "2024-01-01", 3);
        assert!(set.data.is_empty());
        assert_eq!(set.lines, 0);
    }

    #[test]
    fn carriage_returns_are_preserved() {
        let set = scan(b"2024-01-01 win\r\n2024-01-02 x\r\n", "2024-01-01", 5);
        assert_eq!(set.data, b"2024-01-01 win\r\n");
    }

    #[test]
    fn non_utf8_bytes_pass_through() {
        let data = b"2024-01-01 \xff\xfe raw\n2024-01-01 ok\n";
        let set = scan(data, "2024-01-01", 4);
        assert_eq!(set.data, data.to_vec());
        let lines: Vec<_> = set
            .data
            .split(|b| *b == b'\n')
            .take(set.lines as usize)
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], b"2024-01-01 ok");
    }

    #[test]
    fn empty_span_yields_empty_set() {
        let data = b"2024-01-01 a\n";
        let src = MemSource(data.to_vec());
        let mut resolved = whole(data);
        resolved.effective_start = resolved.effective_end;
        let cancel = AtomicBool::new(false);
        let set = PrefixScanner::new(b"2024-01-01", 4)
            .scan_range(&resolved, &src, &cancel)
            .expect("scan");
        assert_eq!(set, MatchSet::empty(0));
    }

    #[test]
    fn raised_cancel_flag_stops_scan() {
        let data = b"2024-01-01 a\n";
        let src = MemSource(data.to_vec());
        let cancel = AtomicBool::new(true);
        let err = PrefixScanner::new(b"2024-01-01", 4)
            .scan_range(&whole(data), &src, &cancel)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Cancelled));
    }

    #[test]
    fn truncated_source_is_io_error() {
        let data = b"2024-01-01 a\n2024-01-01 b\n";
        let src = MemSource(data[..10].to_vec());
        let cancel = AtomicBool::new(false);
        let err = PrefixScanner::new(b"2024-01-01", 4)
            .scan_range(&whole(data), &src, &cancel)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }
}
