use crate::ecc::point::Point;
use crate::ecc::secp256k1::{self, N};
use crate::ecdsa::nonce::NonceGenerator;
use crate::ecdsa::signature::Signature;
use crate::error::{BtcError, Result};
use crate::utils::base58::{decode_base58_check, encode_base58_checksum};
use crate::utils::bigint::{from_bytes_be, mod_inverse, to_bytes32};
use num_bigint::BigUint;
use num_traits::Zero;
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

const WIF_MAINNET_PREFIX: u8 = 0x80;
const WIF_TESTNET_PREFIX: u8 = 0xef;
const WIF_COMPRESSED_SUFFIX: u8 = 0x01;

/// A secp256k1 private key: a secret scalar in `[1, n-1]` and its public point
#[derive(Clone)]
pub struct PrivateKey {
    secret: BigUint,
    point: Point,
}

/// Result of decoding a WIF string
#[derive(Debug, Clone)]
pub struct DecodedWif {
    pub key: PrivateKey,
    pub compressed: bool,
    pub testnet: bool,
}

impl PrivateKey {
    pub fn new(secret: BigUint) -> Result<PrivateKey> {
        if secret.is_zero() || secret >= *N {
            return Err(BtcError::Validation(
                "Private key secret must be in [1, n-1]".to_string(),
            ));
        }
        let point = secp256k1::mul_generator(&secret)?;
        Ok(PrivateKey { secret, point })
    }

    /// Fresh key from the system random number generator
    pub fn generate() -> Result<PrivateKey> {
        let rng = SystemRandom::new();
        let mut bytes = Zeroizing::new([0u8; 32]);
        loop {
            rng.fill(&mut bytes[..])
                .map_err(|_| BtcError::Validation("System RNG failure".to_string()))?;
            let candidate = from_bytes_be(&bytes[..]);
            if !candidate.is_zero() && candidate < *N {
                return PrivateKey::new(candidate);
            }
        }
    }

    pub fn secret(&self) -> &BigUint {
        &self.secret
    }

    pub fn point(&self) -> &Point {
        &self.point
    }

    /// 64 hex characters of the secret
    pub fn hex(&self) -> String {
        format!("{:064x}", self.secret)
    }

    pub fn sec(&self, compressed: bool) -> Result<Vec<u8>> {
        secp256k1::sec(&self.point, compressed)
    }

    /// Deterministic low-s ECDSA signature over the 256-bit hash `z`
    pub fn sign(&self, z: &BigUint) -> Result<Signature> {
        let n = &*N;
        let mut nonces = NonceGenerator::new(&self.secret, z)?;
        loop {
            let k = nonces.next_nonce();
            let r_point = secp256k1::mul_generator(&k)?;
            let r = match r_point.x() {
                Some(x) => x.num() % n,
                None => continue,
            };
            if r.is_zero() {
                log::debug!("Nonce produced r = 0, drawing a fresh nonce");
                continue;
            }
            let k_inv = match mod_inverse(&k, n) {
                Some(inv) => inv,
                None => continue,
            };
            let mut s = ((z + &r * &self.secret) * k_inv) % n;
            if s.is_zero() {
                log::debug!("Nonce produced s = 0, drawing a fresh nonce");
                continue;
            }
            // Low-s form: malleated (r, n - s) is not emitted
            let half_n: BigUint = n >> 1usize;
            if s > half_n {
                s = n - &s;
            }
            return Signature::new(r, s);
        }
    }

    pub fn wif(&self, compressed: bool, testnet: bool) -> Result<String> {
        let mut payload = Zeroizing::new(Vec::with_capacity(34));
        payload.push(if testnet {
            WIF_TESTNET_PREFIX
        } else {
            WIF_MAINNET_PREFIX
        });
        let mut secret_bytes = to_bytes32(&self.secret)?;
        payload.extend_from_slice(&secret_bytes);
        secret_bytes.zeroize();
        if compressed {
            payload.push(WIF_COMPRESSED_SUFFIX);
        }
        Ok(encode_base58_checksum(&payload))
    }

    pub fn from_wif(wif: &str) -> Result<DecodedWif> {
        let payload = Zeroizing::new(decode_base58_check(wif)?);
        let testnet = match payload.first() {
            Some(&WIF_MAINNET_PREFIX) => false,
            Some(&WIF_TESTNET_PREFIX) => true,
            Some(other) => {
                return Err(BtcError::Format(format!(
                    "Unknown WIF version byte {other:#04x}"
                )))
            }
            None => return Err(BtcError::Format("Empty WIF payload".to_string())),
        };
        let compressed = match payload.len() {
            33 => false,
            34 if payload[33] == WIF_COMPRESSED_SUFFIX => true,
            len => {
                return Err(BtcError::Format(format!(
                    "Invalid WIF payload length {len}"
                )))
            }
        };
        let key = PrivateKey::new(from_bytes_be(&payload[1..33]))?;
        Ok(DecodedWif {
            key,
            compressed,
            testnet,
        })
    }
}

// Never print the secret
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("point", &self.point)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecdsa::verify;
    use crate::utils::bigint::from_bytes_le;
    use crate::utils::hash256;

    fn hex_int(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    #[test]
    fn test_secret_range() {
        assert!(PrivateKey::new(BigUint::zero()).is_err());
        assert!(PrivateKey::new(BigUint::clone(&N)).is_err());
        assert!(PrivateKey::new(BigUint::from(1u32)).is_ok());
    }

    #[test]
    fn test_my_secret_vector() {
        let key = PrivateKey::new(from_bytes_le(&hash256(b"my secret"))).unwrap();
        let z = from_bytes_le(&hash256(b"my message"));
        let sig = key.sign(&z).unwrap();
        assert_eq!(
            sig.r(),
            &hex_int("6c7f83102d2b5a70f44169b92da38de4f46b98ee4450f083e65df4862e60a97")
        );
        assert_eq!(
            sig.s(),
            &hex_int("2e27ed37480697943c3ed53575cae4265f265e58a836fcc867b2888e98374cd2")
        );
        assert!(verify(&z, &sig, key.point()));
        assert!(!verify(&(z + 1u32), &sig, key.point()));
    }

    #[test]
    fn test_signatures_are_low_s() {
        let key = PrivateKey::new(BigUint::from(12345u32)).unwrap();
        let half_n: BigUint = &*N >> 1usize;
        for message in [b"a".as_ref(), b"b", b"c"] {
            let z = from_bytes_be(&hash256(message));
            let sig = key.sign(&z).unwrap();
            assert!(sig.s() <= &half_n);
            assert!(verify(&z, &sig, key.point()));
        }
    }

    #[test]
    fn test_wif_vectors() {
        let cases = [
            (
                BigUint::from(5003u32),
                true,
                true,
                "cMahea7zqjxrtgAbB7LSGbcQUr1uX1ojuat9jZodMN8rFTv2sfUK",
            ),
            (
                BigUint::from(2021u32).pow(5),
                false,
                true,
                "91avARGdfge8E4tZfYLoxeJ5sGBdNJQH4kvjpWAxgzczjbCwxic",
            ),
            (
                hex_int("54321deadbeef"),
                true,
                false,
                "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgiuQJv1h8Ytr2S53a",
            ),
        ];
        for (secret, compressed, testnet, expected) in cases {
            let key = PrivateKey::new(secret.clone()).unwrap();
            assert_eq!(key.wif(compressed, testnet).unwrap(), expected);
            let decoded = PrivateKey::from_wif(expected).unwrap();
            assert_eq!(decoded.key.secret(), &secret);
            assert_eq!(decoded.compressed, compressed);
            assert_eq!(decoded.testnet, testnet);
        }
    }

    #[test]
    fn test_hex_is_zero_padded() {
        let key = PrivateKey::new(BigUint::from(255u32)).unwrap();
        assert_eq!(key.hex().len(), 64);
        assert!(key.hex().ends_with("ff"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let key = PrivateKey::new(BigUint::from(0xdeadbeefu32)).unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("deadbeef"));
        assert!(!printed.contains(&0xdeadbeefu32.to_string()));
    }

    #[test]
    fn test_generate_gives_distinct_valid_keys() {
        let a = PrivateKey::generate().unwrap();
        let b = PrivateKey::generate().unwrap();
        assert_ne!(a.secret(), b.secret());
    }
}
