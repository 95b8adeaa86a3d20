//! Data storage and persistence
//!
//! The transaction store that resolves transaction inputs to the outputs
//! they spend, persisted as a JSON file of raw transactions.

pub mod tx_store;

pub use tx_store::TxStore;
