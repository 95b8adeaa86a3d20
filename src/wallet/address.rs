use crate::ecc::point::Point;
use crate::ecc::secp256k1::hash160_point;
use crate::error::{BtcError, Result};
use crate::script::Script;
use crate::utils::base58::{decode_base58_check, encode_base58_checksum};
use crate::utils::crypto::hash160;

pub const P2PKH_MAINNET_VERSION: u8 = 0x00;
pub const P2PKH_TESTNET_VERSION: u8 = 0x6f;
pub const P2SH_MAINNET_VERSION: u8 = 0x05;
pub const P2SH_TESTNET_VERSION: u8 = 0xc4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    P2pkh,
    P2sh,
}

/// What a Base58Check address commits to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub kind: AddressKind,
    pub testnet: bool,
    pub hash: [u8; 20],
}

impl DecodedAddress {
    /// The locking script that pays this address
    pub fn script_pubkey(&self) -> Script {
        match self.kind {
            AddressKind::P2pkh => Script::p2pkh(&self.hash),
            AddressKind::P2sh => Script::p2sh(&self.hash),
        }
    }
}

pub fn hash_pub_key(sec_pub_key: &[u8]) -> [u8; 20] {
    hash160(sec_pub_key)
}

pub fn p2pkh_address(h160: &[u8; 20], testnet: bool) -> String {
    let version = if testnet {
        P2PKH_TESTNET_VERSION
    } else {
        P2PKH_MAINNET_VERSION
    };
    convert_address(version, h160)
}

pub fn p2sh_address(h160: &[u8; 20], testnet: bool) -> String {
    let version = if testnet {
        P2SH_TESTNET_VERSION
    } else {
        P2SH_MAINNET_VERSION
    };
    convert_address(version, h160)
}

/// P2PKH address of a public key in the chosen SEC form
pub fn point_address(point: &Point, compressed: bool, testnet: bool) -> Result<String> {
    Ok(p2pkh_address(&hash160_point(point, compressed)?, testnet))
}

fn convert_address(version: u8, h160: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(version);
    payload.extend_from_slice(h160);
    // version + pub_key_hash, checksum appended by the encoder
    encode_base58_checksum(&payload)
}

pub fn decode_address(address: &str) -> Result<DecodedAddress> {
    let payload = decode_base58_check(address)?;
    if payload.len() != 21 {
        return Err(BtcError::Format(format!(
            "Address payload must be 21 bytes, got {}",
            payload.len()
        )));
    }
    let (kind, testnet) = match payload[0] {
        P2PKH_MAINNET_VERSION => (AddressKind::P2pkh, false),
        P2PKH_TESTNET_VERSION => (AddressKind::P2pkh, true),
        P2SH_MAINNET_VERSION => (AddressKind::P2sh, false),
        P2SH_TESTNET_VERSION => (AddressKind::P2sh, true),
        other => {
            return Err(BtcError::Format(format!(
                "Unknown address version byte {other:#04x}"
            )))
        }
    };
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok(DecodedAddress {
        kind,
        testnet,
        hash,
    })
}

pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_ok()
}
