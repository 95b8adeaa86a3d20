//! Utility functions and helpers
//!
//! Hashing, big-integer conversions, Base58Check and the little-endian/varint
//! codecs used by the wire format. Nothing here depends on the curve code.

pub mod base58;
pub mod bigint;
pub mod crypto;
pub mod serialization;

pub use base58::{decode_base58, decode_base58_check, encode_base58, encode_base58_checksum};
pub use crypto::{
    hash160, hash256, hmac_sha256, ripemd160_digest, sha1_digest, sha256_digest,
};
pub use serialization::{
    encode_varint, little_endian_to_u64, read_varint, u64_to_little_endian, Reader,
};
