//! Ledger configuration
//!
//! Defaults describe the reference token (SYZYGY / CZG, 1,000,000 whole
//! tokens, 18 decimals). A JSON file can override any subset of fields and
//! CLI flags override the file.

use crate::storage::StorageConfig;
use crate::token::{GenesisError, TokenMetadata, DEFAULT_DECIMALS, DEFAULT_HISTORY_LIMIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid token metadata: {0}")]
    Genesis(#[from] GenesisError),
}

/// Token and host settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Decimal places used to scale the initial supply
    pub decimals: u8,
    /// Initial supply in whole tokens
    pub initial_supply: u128,
    /// Number of events kept in the journal
    pub history_limit: usize,
    /// Number of rotating snapshot backups
    pub max_backups: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: "SYZYGY".to_string(),
            symbol: "CZG".to_string(),
            decimals: DEFAULT_DECIMALS,
            initial_supply: 1_000_000,
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_backups: 5,
        }
    }
}

impl LedgerConfig {
    /// Read a JSON config file (missing fields keep their defaults)
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.metadata()?;
        Ok(config)
    }

    /// Use the file if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validated token metadata
    pub fn metadata(&self) -> Result<TokenMetadata, GenesisError> {
        TokenMetadata::new(self.name.clone(), self.symbol.clone(), self.decimals)
    }

    /// Storage settings rooted at `data_dir`
    pub fn storage(&self, data_dir: PathBuf) -> StorageConfig {
        StorageConfig {
            data_dir,
            backup_enabled: self.max_backups > 0,
            max_backups: self.max_backups,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        let metadata = config.metadata().unwrap();

        assert_eq!(metadata.name(), "SYZYGY");
        assert_eq!(metadata.symbol(), "CZG");
        assert_eq!(metadata.decimals(), 18);
        assert_eq!(config.initial_supply, 1_000_000);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "symbol": "TST", "history_limit": 10 }"#).unwrap();

        let config = LedgerConfig::load(&path).unwrap();
        assert_eq!(config.symbol, "TST");
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.name, "SYZYGY");
        assert_eq!(config.decimals, 18);
    }

    #[test]
    fn test_invalid_metadata_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "decimals": 30 }"#).unwrap();

        assert!(matches!(
            LedgerConfig::load(&path),
            Err(ConfigError::Genesis(GenesisError::InvalidDecimals))
        ));
    }

    #[test]
    fn test_missing_file() {
        let missing = Path::new("/definitely/not/here/config.json");
        assert!(matches!(
            LedgerConfig::load(missing),
            Err(ConfigError::IoError(_))
        ));
        assert_eq!(
            LedgerConfig::load_or_default(None).unwrap(),
            LedgerConfig::default()
        );
    }

    #[test]
    fn test_storage_settings() {
        let config = LedgerConfig {
            max_backups: 0,
            ..Default::default()
        };
        let storage = config.storage(PathBuf::from("/tmp/ledger"));

        assert!(!storage.backup_enabled);
        assert_eq!(storage.ledger_file, "ledger.json");
        assert_eq!(storage.data_dir, PathBuf::from("/tmp/ledger"));
    }
}
