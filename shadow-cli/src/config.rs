//! CLI configuration: file locations, scanner tuning and log format.

use std::path::PathBuf;

use shadow_core::constants::{DEFAULT_SCAN_BATCH_SIZE, DEFAULT_SCAN_WORKERS};
use shadow_core::error::{Result, ShadowError};
use shadow_scanner::ScannerConfig;

const DEFAULT_HOME_DIR: &str = ".shadow";
const VAULT_FILE: &str = "vault.json";
const ANNOUNCEMENTS_FILE: &str = "announcements.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    pub home: PathBuf,
    pub vault_path: PathBuf,
    pub announcements_path: PathBuf,
    pub scan_workers: usize,
    pub scan_batch_size: usize,
    pub log_json: bool,
}

impl CliConfig {
    /// Loads `.env` (if any), then reads `SHADOW_*` variables.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = lookup("SHADOW_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| match lookup("HOME") {
                Some(dir) => PathBuf::from(dir).join(DEFAULT_HOME_DIR),
                None => PathBuf::from(DEFAULT_HOME_DIR),
            });

        Ok(Self {
            vault_path: lookup("SHADOW_VAULT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(VAULT_FILE)),
            announcements_path: lookup("SHADOW_ANNOUNCEMENTS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(ANNOUNCEMENTS_FILE)),
            scan_workers: parse_count(&lookup, "SHADOW_SCAN_WORKERS", DEFAULT_SCAN_WORKERS)?,
            scan_batch_size: parse_count(&lookup, "SHADOW_SCAN_BATCH_SIZE", DEFAULT_SCAN_BATCH_SIZE)?,
            log_json: lookup("SHADOW_LOG_JSON")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(false),
            home,
        })
    }

    /// Scanner settings; out-of-range values are clamped by the builder.
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::new()
            .batch_size(self.scan_batch_size)
            .workers(self.scan_workers)
    }
}

fn parse_count<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(0) => Err(ShadowError::ConfigError(format!("{key} must be at least 1"))),
            Ok(value) => Ok(value),
            Err(e) => Err(ShadowError::ConfigError(format!("{key}={raw:?}: {e}"))),
        },
    }
}
