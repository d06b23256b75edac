//! # Pipeline Events
//!
//! Messages sent from range workers back to the coordinator.

use crate::error::ExtractError;
use crate::scanner::MatchSet;

/// Result of one range task. Each worker sends exactly one.
#[derive(Debug)]
pub enum RangeEvent {
    /// The range was resolved and scanned
    Done(MatchSet),
    /// Resolution or scanning failed for this range
    Failed {
        range_index: usize,
        error: ExtractError,
    },
}

