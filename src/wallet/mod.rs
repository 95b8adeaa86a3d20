//! Keys to addresses
//!
//! Base58Check P2PKH and P2SH addresses for mainnet and testnet, and decoding
//! an address back into the script that pays it.

pub mod address;

pub use address::{
    decode_address, hash_pub_key, p2pkh_address, p2sh_address, point_address, validate_address,
    AddressKind, DecodedAddress,
};
