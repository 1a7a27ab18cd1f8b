//! Configuration for the teller service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Teller service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Ledger data directory
    pub ledger_data_dir: PathBuf,

    /// Account lock acquisition bound passed through to the ledger
    /// (milliseconds)
    pub lock_acquire_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "teller".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            ledger_data_dir: PathBuf::from("./data/bank"),
            lock_acquire_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Ledger configuration this service opens its store with.
    pub fn ledger_config(&self) -> bank_core::Config {
        let mut config = bank_core::Config::default();
        config.data_dir = self.ledger_data_dir.clone();
        config.locking.acquire_timeout_ms = self.lock_acquire_timeout_ms;
        config
    }

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

        if let Ok(dir) = std::env::var("TELLER_LEDGER_DIR") {
            config.ledger_data_dir = PathBuf::from(dir);
        }

        if let Ok(timeout) = std::env::var("TELLER_LOCK_TIMEOUT_MS") {
            config.lock_acquire_timeout_ms = timeout
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad TELLER_LOCK_TIMEOUT_MS: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "teller");
        assert_eq!(config.lock_acquire_timeout_ms, 5000);

        let ledger = config.ledger_config();
        assert_eq!(ledger.data_dir, config.ledger_data_dir);
        assert_eq!(ledger.locking.acquire_timeout_ms, 5000);
    }
}
