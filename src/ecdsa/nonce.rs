// RFC 6979 deterministic nonce generation with HMAC-SHA256
use crate::ecc::secp256k1::N;
use crate::error::Result;
use crate::utils::bigint::{from_bytes_be, to_bytes32};
use crate::utils::crypto::hmac_sha256;
use num_bigint::BigUint;
use num_traits::Zero;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Infinite stream of nonce candidates in `[1, n-1]` for one `(secret, z)` pair.
///
/// Pulling another value after a candidate was rejected by the signer
/// (for example because it produced `r = 0`) continues the RFC 6979 state
/// machine instead of restarting it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct NonceGenerator {
    k: [u8; 32],
    v: [u8; 32],
    #[zeroize(skip)]
    started: bool,
}

impl NonceGenerator {
    pub fn new(secret: &BigUint, z: &BigUint) -> Result<NonceGenerator> {
        let n = &*N;
        let z = if z > n { z - n } else { z.clone() };
        let mut z_bytes = to_bytes32(&z)?;
        let mut secret_bytes = to_bytes32(secret)?;

        let mut k = [0x00u8; 32];
        let mut v = [0x01u8; 32];
        k = hmac_sha256(&k, &[&v, &[0x00], &secret_bytes, &z_bytes]);
        v = hmac_sha256(&k, &[&v]);
        k = hmac_sha256(&k, &[&v, &[0x01], &secret_bytes, &z_bytes]);
        v = hmac_sha256(&k, &[&v]);

        secret_bytes.zeroize();
        z_bytes.zeroize();
        Ok(NonceGenerator {
            k,
            v,
            started: false,
        })
    }

    pub fn next_nonce(&mut self) -> BigUint {
        let n = &*N;
        loop {
            if self.started {
                self.k = hmac_sha256(&self.k, &[&self.v, &[0x00]]);
                self.v = hmac_sha256(&self.k, &[&self.v]);
            }
            self.started = true;
            self.v = hmac_sha256(&self.k, &[&self.v]);
            let candidate = from_bytes_be(&self.v);
            if !candidate.is_zero() && &candidate < n {
                return candidate;
            }
            log::debug!("Nonce candidate out of range, drawing again");
        }
    }
}

impl Iterator for NonceGenerator {
    type Item = BigUint;

    fn next(&mut self) -> Option<BigUint> {
        Some(self.next_nonce())
    }
}
