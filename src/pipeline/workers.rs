//! # Pipeline Workers
//!
//! One thread per planned range. Each worker resolves its boundaries, scans
//! its span, and reports a single [`RangeEvent`]; workers share nothing but
//! the read-only source and the stop flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::boundary::resolve_range;
use crate::chunk::ByteRange;
use crate::error::{ExtractError, ExtractResult};
use crate::scanner::{MatchSet, PrefixScanner};
use crate::source::LogSource;

use super::events::RangeEvent;

pub struct RangeWorker {
    pub range_index: usize,
    pub handle: thread::JoinHandle<()>,
}

/// Spawn one scan worker per range.
pub fn spawn_range_workers(
    ranges: &[ByteRange],
    source: Arc<dyn LogSource>,
    scanner: Arc<PrefixScanner>,
    block_size: usize,
    tx: Sender<RangeEvent>,
    stop: Arc<AtomicBool>,
) -> ExtractResult<Vec<RangeWorker>> {
    let mut workers: Vec<RangeWorker> = Vec::with_capacity(ranges.len());

    for range in ranges {
        let range = *range;
        let source = source.clone();
        let scanner = scanner.clone();
        let tx = tx.clone();
        let worker_stop = stop.clone();

        let spawned = thread::Builder::new()
            .name(format!("range-{}", range.index))
            .spawn(move || {
                let event = match scan_one(&range, source.as_ref(), &scanner, block_size, &worker_stop) {
                    Ok(set) => {
                        debug!(
                            "range {} done: {} bytes scanned, {} lines matched",
                            range.index, set.bytes_scanned, set.lines
                        );
                        RangeEvent::Done(set)
                    }
                    Err(error) => {
                        // siblings only need to finish if the run can still succeed
                        worker_stop.store(true, Ordering::Relaxed);
                        RangeEvent::Failed {
                            range_index: range.index,
                            error,
                        }
                    }
                };
                if let Err(err) = tx.send(event) {
                    warn!("result channel closed before range {} reported: {err}", range.index);
                }
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                stop.store(true, Ordering::Relaxed);
                for worker in workers {
                    let _ = worker.handle.join();
                }
                return Err(spawn_failed(range.index, err));
            }
        };

        workers.push(RangeWorker {
            range_index: range.index,
            handle,
        });
    }

    Ok(workers)
}

fn spawn_failed(range_index: usize, err: std::io::Error) -> ExtractError {
    warn!("failed to spawn worker for range {range_index}: {err}");
    ExtractError::scan_failed(range_index, err.into())
}

fn scan_one(
    range: &ByteRange,
    source: &dyn LogSource,
    scanner: &PrefixScanner,
    block_size: usize,
    stop: &AtomicBool,
) -> ExtractResult<MatchSet> {
    let resolved = resolve_range(range, source, block_size)?;
    if resolved.is_empty() {
        return Ok(MatchSet::empty(range.index));
    }
    scanner.scan_range(&resolved, source, stop)
}
