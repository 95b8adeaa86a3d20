//! Configuration management
//!
//! Which network prior transactions are looked up on and where the
//! transaction store is persisted. Values come from defaults, an optional
//! TOML file, then `BTC_TESTNET` / `BTC_TX_CACHE` environment overrides.

pub mod settings;

pub use settings::Config;
