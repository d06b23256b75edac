//! Parallel extraction of date-prefixed lines from large append-only logs.
//!
//! The file is split into byte ranges, each range is moved onto line
//! boundaries and scanned on its own thread, and the per-range matches are
//! joined back in file order before a single output file is written.

pub mod boundary;
pub mod chunk;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod logging;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod scanner;
pub mod source;

pub use error::{ExtractError, ExtractResult};
pub use extract::{ExtractOptions, extract, extract_with_cancel};
pub use metadata::ExtractStats;
