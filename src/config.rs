use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::constants::{DEFAULT_OUTPUT_DIR, DEFAULT_READ_BLOCK_SIZE, DEFAULT_WORKERS};
use crate::error::{ExtractError, ExtractResult};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub workers: usize,
    pub output_dir: PathBuf,
    pub read_block_size: usize,
    pub write_summary: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            read_block_size: DEFAULT_READ_BLOCK_SIZE,
            write_summary: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> ExtractResult<()> {
        if self.workers == 0 {
            return Err(ExtractError::InvalidConfig(
                "workers must be greater than zero".to_string(),
            ));
        }
        if self.read_block_size == 0 {
            return Err(ExtractError::InvalidConfig(
                "read_block_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_hash: String,
}

pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let bytes: Vec<u8> = if let Some(p) = path {
        std::fs::read(p).with_context(|| format!("reading config {}", p.display()))?
    } else {
        include_bytes!("../config/default.yml").to_vec()
    };

    let config: Config = serde_yaml::from_slice(&bytes).context("parsing config yaml")?;
    let config_hash = hash_bytes(&bytes);

    Ok(LoadedConfig {
        config,
        config_hash,
    })
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(digest)
}
