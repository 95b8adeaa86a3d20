//! ECDSA over secp256k1
//!
//! Deterministic signing (RFC 6979 nonces, low-s output), verification and
//! the DER signature codec.

pub mod nonce;
pub mod private_key;
pub mod signature;

pub use nonce::NonceGenerator;
pub use private_key::{DecodedWif, PrivateKey};
pub use signature::Signature;

use crate::ecc::point::Point;
use crate::ecc::secp256k1::{self, N};
use crate::utils::bigint::mod_inverse;
use num_bigint::BigUint;

/// Check `sig` over the hash `z` against the public key `point`.
///
/// Any failure along the way (infinity public key, non-invertible `s`)
/// is reported as `false`.
pub fn verify(z: &BigUint, sig: &Signature, point: &Point) -> bool {
    if point.is_infinity() {
        return false;
    }
    let n = &*N;
    let s_inv = match mod_inverse(sig.s(), n) {
        Some(inv) => inv,
        None => return false,
    };
    let u = (z * &s_inv) % n;
    let v = (sig.r() * &s_inv) % n;

    let total = match (secp256k1::mul_generator(&u), secp256k1::mul(point, &v)) {
        (Ok(ug), Ok(vp)) => match ug.add(&vp) {
            Ok(total) => total,
            Err(_) => return false,
        },
        _ => return false,
    };
    match total.x() {
        Some(x) => &(x.num() % n) == sig.r(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bigint::from_bytes_be;
    use rand::RngCore;

    fn hex_int(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    fn book_point() -> Point {
        secp256k1::point(
            hex_int("887387e452b8eacc4acfde10d9aaf7f6d9a0f975aabb10d006e4da568744d06c"),
            hex_int("61de6d95231cd89026e286df3b6ae4a894a3378e393e93a0f45b666329a0ae34"),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_known_signatures() {
        let point = book_point();
        let cases = [
            (
                "ec208baa0fc1c19f708a9ca96fdeff3ac3f230bb4a7ba4aede4942ad003c0f60",
                "ac8d1c87e51d0d441be8b3dd5b05c8795b48875dffe00b7ffcfac23010d3a395",
                "68342ceff8935ededd102dd876ffd6ba72d6a427a3edb13d26eb0781cb423c4",
            ),
            (
                "7c076ff316692a3d7eb3c3bb0f8b1488cf72e1afcd929e29307032997a838a3d",
                "eff69ef2b1bd93a66ed5219add4fb51e11a840f404876325a1e8ffe0529a2c",
                "c7207fee197d27c618aea621406f6bf5ef6fca38681d82b2f06fddbdce6feab6",
            ),
        ];
        for (z, r, s) in cases {
            let sig = Signature::new(hex_int(r), hex_int(s)).unwrap();
            assert!(verify(&hex_int(z), &sig, &point));
        }
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let z = hex_int("ec208baa0fc1c19f708a9ca96fdeff3ac3f230bb4a7ba4aede4942ad003c0f60");
        let sig = Signature::new(
            hex_int("ac8d1c87e51d0d441be8b3dd5b05c8795b48875dffe00b7ffcfac23010d3a395"),
            hex_int("68342ceff8935ededd102dd876ffd6ba72d6a427a3edb13d26eb0781cb423c4"),
        )
        .unwrap();
        let other = secp256k1::mul_generator(&BigUint::from(2u32)).unwrap();
        assert!(!verify(&z, &sig, &other));
        assert!(!verify(&z, &sig, &secp256k1::infinity()));
    }

    #[test]
    fn test_random_sign_verify() {
        let mut rng = rand::thread_rng();
        for _ in 0..4 {
            let mut secret = [0u8; 32];
            let mut hash = [0u8; 32];
            rng.fill_bytes(&mut secret);
            rng.fill_bytes(&mut hash);
            let key = match PrivateKey::new(from_bytes_be(&secret)) {
                Ok(key) => key,
                Err(_) => continue,
            };
            let z = from_bytes_be(&hash);
            let sig = key.sign(&z).unwrap();
            assert!(verify(&z, &sig, key.point()));
            let parsed = Signature::parse(&sig.der()).unwrap();
            assert!(verify(&z, &parsed, key.point()));
            assert!(!verify(&(z + 1u32), &sig, key.point()));
        }
    }
}
