use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY, SHA256};
use ring::hmac;
use ripemd::{Digest as RipemdDigest, Ripemd160};

pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

pub fn sha1_digest(data: &[u8]) -> [u8; 20] {
    let mut context = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
    context.update(data);
    let digest = context.finish();
    let mut out = [0u8; 20];
    out.copy_from_slice(digest.as_ref());
    out
}

pub fn ripemd160_digest(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// RIPEMD160(SHA256(data)), used for public key and script hashes
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160_digest(&sha256_digest(data))
}

/// SHA256(SHA256(data)), used for transaction ids, sighashes and checksums
pub fn hash256(data: &[u8]) -> [u8; 32] {
    sha256_digest(&sha256_digest(data))
}

/// HMAC-SHA256 over the concatenation of `parts`
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let mut context = hmac::Context::with_key(&key);
    for part in parts {
        context.update(part);
    }
    let tag = context.sign();
    let mut out = [0u8; 32];
    out.copy_from_slice(tag.as_ref());
    out
}
