//! Shared helpers for extraction integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use logslice::{ExtractOptions, ExtractStats, extract};

pub const TARGET: &str = "2024-01-01";

pub fn write_log(dir: &Path, data: &[u8]) -> PathBuf {
    let path = dir.join("app.log");
    fs::write(&path, data).expect("write log");
    path
}

pub fn options(output_dir: &Path, workers: usize, block: usize) -> ExtractOptions {
    ExtractOptions {
        output_dir: output_dir.to_path_buf(),
        workers,
        read_block_size: block,
        ..ExtractOptions::default()
    }
}

/// Run a full extraction in a scratch directory and return the output bytes.
pub fn run_extract(
    data: &[u8],
    target: &str,
    workers: usize,
    block: usize,
) -> (ExtractStats, Vec<u8>) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let log = write_log(temp_dir.path(), data);
    let opts = options(&temp_dir.path().join("output"), workers, block);
    let stats = extract(&log, target, &opts).expect("extract");
    let out = fs::read(&stats.output_path).expect("read output");
    (stats, out)
}

/// Sequential line filter used as the ground truth.
pub fn reference_filter(data: &[u8], target: &str) -> Vec<u8> {
    let mut out = Vec::new();
    if data.is_empty() {
        return out;
    }
    let body = data.strip_suffix(b"\n").unwrap_or(data);
    for line in body.split(|b| *b == b'\n') {
        if line.starts_with(target.as_bytes()) {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
    }
    out
}

/// Deterministic pseudo-random log with a mix of days and line lengths.
pub fn synthetic_log(lines: usize, seed: u64) -> Vec<u8> {
    let mut state = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let mut data = Vec::new();
    for i in 0..lines {
        let day = 1 + next() % 3;
        let pad = "z".repeat(next() % 90);
        data.extend_from_slice(format!("2024-01-0{day} {i:06} INFO event {pad}\n").as_bytes());
    }
    data
}

pub fn count_lines(data: &[u8]) -> usize {
    data.iter().filter(|b| **b == b'\n').count()
}
