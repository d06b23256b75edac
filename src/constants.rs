pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * 1024;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_READ_BLOCK_SIZE: usize = 64 * 1024;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// How often the coordinator checks the external cancel flag while waiting.
pub const CANCEL_POLL_INTERVAL_MS: u64 = 50;
