//! Configuration for the ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,

    /// Account locking configuration
    pub locking: LockConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/bank"),
            service_name: "bank-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            rocksdb: RocksDbConfig::default(),
            locking: LockConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,       // 64 MB
            max_write_buffer_number: 4,
            target_file_size_mb: 64,        // 64 MB
            max_background_jobs: 4,
            enable_statistics: false,
        }
    }
}

/// Account locking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Bound on exclusive lock acquisition (milliseconds).
    /// Operations that cannot lock their account(s) within this bound
    /// fail with `LockTimeout` instead of waiting forever.
    pub acquire_timeout_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: 5000,    // 5s
        }
    }
}

impl LockConfig {
    /// Acquisition bound as a `Duration`.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("BANK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(timeout) = std::env::var("BANK_LOCK_TIMEOUT_MS") {
            config.locking.acquire_timeout_ms = timeout
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad BANK_LOCK_TIMEOUT_MS: {}", e)))?;
        }

        Ok(config)
    }
}
