//! Configuration structures for the receipt pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, VouchError};

/// Main configuration for vouch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VouchConfig {
    /// Rule table configuration.
    pub rules: RulesConfig,

    /// Storage configuration.
    pub storage: StorageConfig,

    /// Ledger (dedup/merge) configuration.
    pub ledger: LedgerConfig,
}

/// Rule table source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule table JSON file. The embedded asset is used when unset.
    pub path: Option<PathBuf>,
}

/// Persistence configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file. Front ends pick a per-user default when unset.
    pub database: Option<PathBuf>,
}

/// Dedup/merge behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Replace a colliding record instead of reporting the duplicate.
    pub replace_if_duplicate: bool,
}

impl VouchConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| VouchError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| VouchError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: VouchConfig =
            serde_json::from_str(r#"{ "ledger": { "replace_if_duplicate": true } }"#).unwrap();
        assert!(config.ledger.replace_if_duplicate);
        assert!(config.rules.path.is_none());
        assert!(config.storage.database.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = VouchConfig::default();
        config.storage.database = Some(PathBuf::from("/tmp/transfers.db"));
        config.save(&path).unwrap();

        let loaded = VouchConfig::from_file(&path).unwrap();
        assert_eq!(loaded.storage.database, config.storage.database);
    }

    #[test]
    fn test_load_errors_are_typed() {
        let dir = tempfile::tempdir().unwrap();

        let missing = VouchConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, VouchError::Io(_)));

        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ \"ledger\": ").unwrap();
        let malformed = VouchConfig::from_file(&path).unwrap_err();
        assert!(matches!(malformed, VouchError::Config(_)));
        assert!(malformed.to_string().contains("config.json"));
    }
}
