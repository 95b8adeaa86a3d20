//! Transaction model
//!
//! Wire-format transactions, signature hashing, signing and verification.

pub mod transaction;

pub use transaction::{Transaction, TxFetcher, TxIn, TxOut, DEFAULT_SEQUENCE, SIGHASH_ALL};
