//! Big-integer helpers on top of `num-bigint`
//!
//! Every 256-bit quantity in the crate (field elements, scalars, sighashes)
//! goes through these conversions so byte order is decided in one place.

use crate::error::{BtcError, Result};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

/// Interpret big-endian bytes as an unsigned integer
pub fn from_bytes_be(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Interpret little-endian bytes as an unsigned integer
pub fn from_bytes_le(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_le(bytes)
}

/// Big-endian encoding left-padded with zeros to exactly `len` bytes
pub fn to_bytes_be_padded(value: &BigUint, len: usize) -> Result<Vec<u8>> {
    let bytes = if value.is_zero() {
        vec![]
    } else {
        value.to_bytes_be()
    };
    if bytes.len() > len {
        return Err(BtcError::Validation(format!(
            "Integer needs {} bytes, only {len} available",
            bytes.len()
        )));
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    Ok(out)
}

/// Fixed 32-byte big-endian encoding of a 256-bit value
pub fn to_bytes32(value: &BigUint) -> Result<[u8; 32]> {
    let padded = to_bytes_be_padded(value, 32)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&padded);
    Ok(out)
}

/// `base^exponent mod modulus`
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    base.modpow(exponent, modulus)
}

/// Inverse of `value` modulo the prime `modulus` via Fermat's little theorem.
/// Returns `None` for values congruent to zero.
pub fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let reduced = value % modulus;
    if reduced.is_zero() {
        return None;
    }
    let two = BigUint::from(2u8);
    Some(reduced.modpow(&(modulus - &two), modulus))
}

/// Reduce a signed integer into `[0, modulus)`
pub fn mod_floor(value: &BigInt, modulus: &BigUint) -> BigUint {
    let m = BigInt::from_biguint(Sign::Plus, modulus.clone());
    let r = ((value % &m) + &m) % &m;
    // r is non-negative by construction
    r.to_biguint().unwrap_or_default()
}

pub fn is_odd(value: &BigUint) -> bool {
    value.bit(0)
}

pub fn one() -> BigUint {
    BigUint::one()
}
