//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod delete;
pub mod list;
pub mod parse;
pub mod submit;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use vouch_core::models::config::VouchConfig;
use vouch_core::{ReceiptParser, RuleTable, SqliteStore, TransferLedger};

/// Global options every command can see.
pub struct Context {
    pub config_path: Option<String>,
    pub database: Option<String>,
}

impl Context {
    /// Config file in use: `--config`, else the per-user default.
    pub fn config_file(&self) -> PathBuf {
        self.config_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path)
    }

    /// Load the configuration, falling back to defaults when no file exists.
    pub fn load_config(&self) -> anyhow::Result<VouchConfig> {
        let path = self.config_file();
        if path.exists() {
            Ok(VouchConfig::from_file(&path)?)
        } else if self.config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display())
        } else {
            Ok(VouchConfig::default())
        }
    }

    /// Build a receipt parser from the configured rule table.
    pub fn parser(&self, config: &VouchConfig) -> anyhow::Result<ReceiptParser> {
        let table = match &config.rules.path {
            Some(path) => {
                debug!("Loading rule table from {}", path.display());
                RuleTable::from_file(path)?
            }
            None => RuleTable::embedded()?,
        };
        Ok(ReceiptParser::new(Arc::new(table)))
    }

    /// Open the ledger over the SQLite database.
    pub fn ledger(&self, config: &VouchConfig) -> anyhow::Result<TransferLedger<SqliteStore>> {
        let path = self
            .database
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| config.storage.database.clone())
            .unwrap_or_else(default_database_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = SqliteStore::open(&path)?;
        Ok(TransferLedger::new(store)?)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vouch")
        .join("config.json")
}

pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vouch")
        .join("transfers.db")
}

/// Duplicate policy for one command: an explicit flag wins over
/// `ledger.replace_if_duplicate`.
pub fn replace_policy(replace: bool, no_replace: bool, config: &VouchConfig) -> bool {
    if no_replace {
        false
    } else {
        replace || config.ledger.replace_if_duplicate
    }
}

/// Read a transcript from a file, or from stdin when the path is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut std::io::stdin(), &mut buf)?;
        return Ok(buf);
    }

    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(fs::read(path)?)
}
