//! # btc-primitives - Bitcoin's cryptographic and transaction primitives
//!
//! Everything needed to sign and validate a legacy Bitcoin transaction, built
//! from big-integer arithmetic upward. When I come back to this code, here's
//! what I need to remember:
//!
//! ## What's Here
//! - **Field and curve arithmetic**: generic prime fields and short Weierstrass
//!   curves, specialised to secp256k1
//! - **ECDSA**: RFC 6979 deterministic signing with low-s output, verification,
//!   DER signatures, SEC public keys and WIF private keys
//! - **Script**: a stack-machine interpreter covering the standard opcodes,
//!   conditionals, multisig, P2SH and the locktime checks
//! - **Transactions**: wire format parsing, SIGHASH_ALL, signing and
//!   verification, with prior transactions resolved through a [`TxFetcher`]
//!
//! ## How the Code Is Organized
//! - `utils/`: hashing, Base58Check, varints and big-integer helpers
//! - `ecc/`: field elements, points, secp256k1 parameters and SEC encoding
//! - `ecdsa/`: signatures, nonces and private keys
//! - `script/`: script parsing, serialization and evaluation
//! - `core/`: the transaction model
//! - `storage/`: the JSON-backed transaction store
//! - `wallet/`: P2PKH and P2SH addresses
//! - `config/`: network and store location settings
//!
//! ## Rules I Stick To
//! - Constructors validate; a value that exists is in its domain
//! - Parsing and construction failures are `BtcError`s, a failed script is just `false`
//! - Nothing here talks to the network; prior transactions come from the store

pub mod config;
pub mod core;
pub mod ecc;
pub mod ecdsa;
pub mod error;
pub mod script;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use config::Config;
pub use core::{Transaction, TxFetcher, TxIn, TxOut, SIGHASH_ALL};
pub use ecc::{FieldElement, Point};
pub use ecdsa::{verify, DecodedWif, PrivateKey, Signature};
pub use error::{BtcError, Result};
pub use script::{Cmd, ExecutionContext, Script, ScriptError};
pub use storage::TxStore;
pub use utils::{
    decode_base58_check, encode_base58_checksum, hash160, hash256, sha256_digest,
};
pub use wallet::{decode_address, p2pkh_address, p2sh_address, point_address, validate_address};
