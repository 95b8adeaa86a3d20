use crate::error::{BtcError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

static DEFAULT_TX_CACHE: &str = "tx.cache";

const TESTNET_KEY: &str = "BTC_TESTNET";
const TX_CACHE_KEY: &str = "BTC_TX_CACHE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Look up prior transactions on testnet instead of mainnet
    pub testnet: bool,
    /// JSON file backing the transaction store
    pub tx_cache_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            testnet: false,
            tx_cache_path: PathBuf::from(DEFAULT_TX_CACHE),
        }
    }
}

impl Config {
    /// Defaults overridden by `BTC_TESTNET` / `BTC_TX_CACHE`.
    /// An unusable environment value is logged and ignored.
    pub fn new() -> Config {
        let mut config = Config::default();
        if let Err(e) = config.apply_env() {
            log::warn!("Ignoring environment override: {e}");
        }
        config
    }

    pub fn from_toml_str(contents: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(contents)?;
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            BtcError::Config(format!("Cannot read config file {}: {e}", path.display()))
        })?;
        Config::from_toml_str(&contents)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(env::var(TESTNET_KEY).ok(), env::var(TX_CACHE_KEY).ok())
    }

    fn apply_overrides(&mut self, testnet: Option<String>, tx_cache: Option<String>) -> Result<()> {
        if let Some(value) = testnet {
            self.testnet = parse_flag(&value).ok_or_else(|| {
                BtcError::Config(format!("{TESTNET_KEY} must be a boolean, got {value:?}"))
            })?;
        }
        if let Some(path) = tx_cache {
            if path.is_empty() {
                return Err(BtcError::Config(format!("{TX_CACHE_KEY} is empty")));
            }
            self.tx_cache_path = PathBuf::from(path);
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
