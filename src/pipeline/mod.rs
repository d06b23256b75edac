//! # Pipeline Module
//!
//! Coordinates the parallel scan: one worker per planned range, a single
//! join barrier, and reassembly of the per-range results in range order.

pub mod events;
pub mod workers;

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, bounded};
use tracing::{info, warn};

use crate::chunk::ByteRange;
use crate::constants::{CANCEL_POLL_INTERVAL_MS, MIB};
use crate::error::{ExtractError, ExtractResult};
use crate::scanner::{MatchSet, PrefixScanner};
use crate::source::LogSource;

use events::RangeEvent;

/// Per-range match sets, ordered by range index.
#[derive(Debug, Clone, Default)]
pub struct AggregatedResult {
    pub sets: Vec<MatchSet>,
}

impl AggregatedResult {
    pub fn lines_matched(&self) -> u64 {
        self.sets.iter().map(|s| s.lines).sum()
    }

    pub fn bytes_scanned(&self) -> u64 {
        self.sets.iter().map(|s| s.bytes_scanned).sum()
    }

    pub fn output_len(&self) -> usize {
        self.sets.iter().map(|s| s.data.len()).sum()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for set in &self.sets {
            writer.write_all(&set.data)?;
        }
        writer.flush()
    }
}

/// Progress snapshot reported each time a range finishes.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub ranges_completed: usize,
    pub total_ranges: usize,
    pub bytes_scanned: u64,
    pub total_bytes: u64,
    pub lines_matched: u64,
    pub elapsed_seconds: f64,
}

/// Progress callback for long-running extractions.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, snapshot: &ProgressSnapshot);
}

pub struct RunOptions {
    pub read_block_size: usize,
    pub cancel_flag: Option<Arc<AtomicBool>>,
    pub progress: Option<Arc<dyn ProgressReporter>>,
}

/// Scan every range concurrently and join the results in index order.
///
/// Fails with [`ExtractError::ScanFailed`] naming the lowest failing range
/// if any range fails, or [`ExtractError::Cancelled`] if the cancel flag is
/// raised. No partial aggregation is returned in either case.
pub fn run_ranges(
    ranges: &[ByteRange],
    source: Arc<dyn LogSource>,
    target: &[u8],
    opts: &RunOptions,
) -> ExtractResult<AggregatedResult> {
    Coordinator::new(ranges, source, target, opts).run()
}

struct Coordinator<'a> {
    ranges: &'a [ByteRange],
    source: Arc<dyn LogSource>,
    scanner: Arc<PrefixScanner>,
    opts: &'a RunOptions,
    stop: Arc<AtomicBool>,
}

struct Collected {
    slots: Vec<Option<MatchSet>>,
    failures: Vec<(usize, ExtractError)>,
    cancelled: bool,
}

impl<'a> Coordinator<'a> {
    fn new(
        ranges: &'a [ByteRange],
        source: Arc<dyn LogSource>,
        target: &[u8],
        opts: &'a RunOptions,
    ) -> Self {
        Self {
            ranges,
            source,
            scanner: Arc::new(PrefixScanner::new(target, opts.read_block_size)),
            opts,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    fn run(self) -> ExtractResult<AggregatedResult> {
        if self.ranges.is_empty() {
            return Ok(AggregatedResult::default());
        }
        if self.cancel_requested() {
            return Err(ExtractError::Cancelled);
        }

        let start_time = Instant::now();
        let (tx, rx) = bounded::<RangeEvent>(self.ranges.len());

        let workers = match workers::spawn_range_workers(
            self.ranges,
            self.source.clone(),
            self.scanner.clone(),
            self.opts.read_block_size,
            tx,
            self.stop.clone(),
        ) {
            Ok(workers) => workers,
            Err(err) => {
                self.stop.store(true, Ordering::Relaxed);
                return Err(err);
            }
        };

        let mut collected = self.collect(&rx, start_time);

        for worker in workers {
            if worker.handle.join().is_err() {
                warn!("worker for range {} panicked", worker.range_index);
                if collected.slots[worker.range_index].is_none() {
                    collected
                        .failures
                        .push((worker.range_index, ExtractError::WorkerPanicked));
                }
            }
        }

        self.aggregate(collected, start_time)
    }

    /// Wait for one event per range, polling the external cancel flag.
    fn collect(
        &self,
        rx: &crossbeam_channel::Receiver<RangeEvent>,
        start_time: Instant,
    ) -> Collected {
        let total_ranges = self.ranges.len();
        let poll = Duration::from_millis(CANCEL_POLL_INTERVAL_MS);
        let mut collected = Collected {
            slots: (0..total_ranges).map(|_| None).collect(),
            failures: Vec::new(),
            cancelled: false,
        };
        let mut received = 0usize;
        let mut bytes_scanned = 0u64;
        let mut lines_matched = 0u64;

        while received < total_ranges {
            match rx.recv_timeout(poll) {
                Ok(event) => {
                    received += 1;
                    match event {
                        RangeEvent::Done(set) => {
                            bytes_scanned += set.bytes_scanned;
                            lines_matched += set.lines;
                            let index = set.index;
                            collected.slots[index] = Some(set);
                        }
                        RangeEvent::Failed { range_index, error } => {
                            if !matches!(error, ExtractError::Cancelled) {
                                warn!("range {range_index} failed: {error}");
                            }
                            collected.failures.push((range_index, error));
                        }
                    }
                    if let Some(reporter) = &self.opts.progress {
                        reporter.on_progress(&ProgressSnapshot {
                            ranges_completed: received,
                            total_ranges,
                            bytes_scanned,
                            total_bytes: self.source.len(),
                            lines_matched,
                            elapsed_seconds: start_time.elapsed().as_secs_f64(),
                        });
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !collected.cancelled && self.cancel_requested() {
                        info!("cancellation requested; stopping range workers");
                        collected.cancelled = true;
                        self.stop.store(true, Ordering::Relaxed);
                    }
                }
                // every worker is gone; panicked ones are picked up at join
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if self.cancel_requested() {
            collected.cancelled = true;
        }
        collected
    }

    fn aggregate(
        &self,
        mut collected: Collected,
        start_time: Instant,
    ) -> ExtractResult<AggregatedResult> {
        // Cancelled entries are fallout from a sibling failure or a user
        // cancel; a genuine failure takes precedence and the lowest index wins.
        collected.failures.sort_by_key(|(index, _)| *index);
        let genuine = collected
            .failures
            .into_iter()
            .find(|(_, err)| !matches!(err, ExtractError::Cancelled));

        if let Some((range_index, error)) = genuine {
            return Err(ExtractError::scan_failed(range_index, error));
        }
        if collected.cancelled {
            return Err(ExtractError::Cancelled);
        }

        let mut sets = Vec::with_capacity(collected.slots.len());
        for (index, slot) in collected.slots.into_iter().enumerate() {
            match slot {
                Some(set) => sets.push(set),
                None => {
                    return Err(ExtractError::scan_failed(
                        index,
                        ExtractError::WorkerPanicked,
                    ));
                }
            }
        }

        let result = AggregatedResult { sets };
        let elapsed = start_time.elapsed().as_secs_f64();
        let throughput_mib = if elapsed > 0.0 {
            result.bytes_scanned() as f64 / MIB as f64 / elapsed
        } else {
            0.0
        };
        info!(
            "scan complete ranges={} bytes_scanned={} lines_matched={} elapsed={:.3}s throughput={:.1}MiB/s",
            result.sets.len(),
            result.bytes_scanned(),
            result.lines_matched(),
            elapsed,
            throughput_mib
        );

        Ok(result)
    }

    fn cancel_requested(&self) -> bool {
        self.opts
            .cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
