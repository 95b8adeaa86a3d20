//! secp256k1 curve parameters and curve-specific operations
//!
//! The generic [`FieldElement`] and [`Point`] types are specialised here by
//! fixing the parameters: `a = 0`, `b = 7`, `p = 2^256 - 2^32 - 977`, group
//! order `n` and generator `G`. Square roots and the SEC public key encoding
//! only make sense for this curve, so they live here as free functions.

use crate::ecc::field::FieldElement;
use crate::ecc::point::Point;
use crate::error::{BtcError, Result};
use crate::utils::bigint::{from_bytes_be, is_odd, to_bytes32};
use crate::utils::crypto::hash160;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use once_cell::sync::Lazy;
use std::sync::Arc;

#[rustfmt::skip]
const GX_BYTES: [u8; 32] = [
    0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac,
    0x55, 0xa0, 0x62, 0x95, 0xce, 0x87, 0x0b, 0x07,
    0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9,
    0x59, 0xf2, 0x81, 0x5b, 0x16, 0xf8, 0x17, 0x98,
];
#[rustfmt::skip]
const GY_BYTES: [u8; 32] = [
    0x48, 0x3a, 0xda, 0x77, 0x26, 0xa3, 0xc4, 0x65,
    0x5d, 0xa4, 0xfb, 0xfc, 0x0e, 0x11, 0x08, 0xa8,
    0xfd, 0x17, 0xb4, 0x48, 0xa6, 0x85, 0x54, 0x19,
    0x9c, 0x47, 0xd0, 0x8f, 0xfb, 0x10, 0xd4, 0xb8,
];
#[rustfmt::skip]
const ORDER_BYTES: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b,
    0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

pub const SEC_COMPRESSED_LEN: usize = 33;
pub const SEC_UNCOMPRESSED_LEN: usize = 65;

/// Field prime p = 2^256 - 2^32 - 977
pub static P: Lazy<Arc<BigUint>> = Lazy::new(|| {
    let one = BigUint::one();
    Arc::new((&one << 256usize) - (&one << 32usize) - BigUint::from(977u32))
});

/// Order of the generator
pub static N: Lazy<BigUint> = Lazy::new(|| from_bytes_be(&ORDER_BYTES));

pub static A: Lazy<FieldElement> =
    Lazy::new(|| FieldElement::from_reduced(BigUint::zero(), Arc::clone(&P)));

pub static B: Lazy<FieldElement> =
    Lazy::new(|| FieldElement::from_reduced(BigUint::from(7u32), Arc::clone(&P)));

pub static G: Lazy<Point> = Lazy::new(|| {
    Point::from_parts_unchecked(
        FieldElement::from_reduced(from_bytes_be(&GX_BYTES), Arc::clone(&P)),
        FieldElement::from_reduced(from_bytes_be(&GY_BYTES), Arc::clone(&P)),
        FieldElement::clone(&A),
        FieldElement::clone(&B),
    )
});

/// An element of the secp256k1 base field
pub fn field(num: BigUint) -> Result<FieldElement> {
    FieldElement::with_prime(num, Arc::clone(&P))
}

/// A validated point on secp256k1
pub fn point(x: BigUint, y: BigUint) -> Result<Point> {
    Point::new(field(x)?, field(y)?, FieldElement::clone(&A), FieldElement::clone(&B))
}

pub fn infinity() -> Point {
    Point::infinity(FieldElement::clone(&A), FieldElement::clone(&B))
}

/// Square root in the base field; valid because p % 4 == 3.
/// The caller must check the result squares back when the input may be a non-residue.
pub fn sqrt(element: &FieldElement) -> FieldElement {
    let p: &BigUint = &P;
    let exponent = (p + 1u32) >> 2usize;
    element.pow_u(&exponent)
}

/// `coefficient * point` with the scalar reduced modulo the group order
pub fn mul(point: &Point, coefficient: &BigUint) -> Result<Point> {
    point.scalar_mul(&(coefficient % &*N))
}

pub fn mul_generator(coefficient: &BigUint) -> Result<Point> {
    mul(&G, coefficient)
}

/// SEC encoding: 33 bytes compressed (`02`/`03` || x) or 65 bytes uncompressed (`04` || x || y)
pub fn sec(point: &Point, compressed: bool) -> Result<Vec<u8>> {
    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(BtcError::Format(
                "The point at infinity has no SEC encoding".to_string(),
            ))
        }
    };
    let x_bytes = to_bytes32(x.num())?;
    if compressed {
        let prefix = if is_odd(y.num()) { 0x03 } else { 0x02 };
        let mut out = Vec::with_capacity(SEC_COMPRESSED_LEN);
        out.push(prefix);
        out.extend_from_slice(&x_bytes);
        Ok(out)
    } else {
        let mut out = Vec::with_capacity(SEC_UNCOMPRESSED_LEN);
        out.push(0x04);
        out.extend_from_slice(&x_bytes);
        out.extend_from_slice(&to_bytes32(y.num())?);
        Ok(out)
    }
}

/// Parse a SEC public key; compressed keys recover y from x
pub fn parse_sec(sec_bin: &[u8]) -> Result<Point> {
    let prefix = *sec_bin
        .first()
        .ok_or_else(|| BtcError::Format("Empty SEC public key".to_string()))?;
    match (prefix, sec_bin.len()) {
        (0x04, SEC_UNCOMPRESSED_LEN) => {
            let x = from_bytes_be(&sec_bin[1..33]);
            let y = from_bytes_be(&sec_bin[33..65]);
            point(x, y)
        }
        (0x02 | 0x03, SEC_COMPRESSED_LEN) => {
            let want_odd = prefix == 0x03;
            let x = field(from_bytes_be(&sec_bin[1..]))?;
            let alpha = x.mul(&x)?.mul(&x)?.add(&B)?;
            let beta = sqrt(&alpha);
            if beta.mul(&beta)? != alpha {
                return Err(BtcError::Validation(format!(
                    "No point on secp256k1 has x = {}",
                    x.num()
                )));
            }
            let y = if is_odd(beta.num()) == want_odd {
                beta
            } else {
                beta.zero_of().sub(&beta)?
            };
            Point::new(x, y, FieldElement::clone(&A), FieldElement::clone(&B))
        }
        (0x02..=0x04, len) => Err(BtcError::Format(format!(
            "SEC key with prefix {prefix:#04x} has invalid length {len}"
        ))),
        _ => Err(BtcError::Format(format!(
            "Unknown SEC prefix {prefix:#04x}"
        ))),
    }
}

/// hash160 of the SEC encoding
pub fn hash160_point(point: &Point, compressed: bool) -> Result<[u8; 20]> {
    Ok(hash160(&sec(point, compressed)?))
}
