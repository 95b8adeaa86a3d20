use crate::error::{BtcError, Result};
use crate::utils::crypto::hash256;

pub const CHECKSUM_LEN: usize = 4;

/// Base58 encoding; each leading zero byte becomes a leading `'1'`
pub fn encode_base58(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn decode_base58(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| BtcError::Format(format!("Invalid base58 encoding: {e}")))
}

pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = hash256(payload);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// Base58 of `payload ∥ hash256(payload)[0..4]`
pub fn encode_base58_checksum(payload: &[u8]) -> String {
    let mut combined = payload.to_vec();
    combined.extend_from_slice(&checksum(payload));
    encode_base58(&combined)
}

/// Reverse of [`encode_base58_checksum`]; returns the payload without checksum
pub fn decode_base58_check(data: &str) -> Result<Vec<u8>> {
    let combined = decode_base58(data)?;
    if combined.len() < CHECKSUM_LEN {
        return Err(BtcError::Format(format!(
            "Base58Check string too short: {} bytes",
            combined.len()
        )));
    }
    let (payload, actual) = combined.split_at(combined.len() - CHECKSUM_LEN);
    let expected = checksum(payload);
    if expected != actual {
        return Err(BtcError::Checksum {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_zeros_become_ones() {
        assert_eq!(encode_base58(&[0, 0, 1]), "112");
        assert_eq!(decode_base58("112").unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn test_checksum_round_trip() {
        let payloads: [&[u8]; 3] = [b"", &[0x00, 0x00, 0xab], b"hello world"];
        for payload in payloads {
            let encoded = encode_base58_checksum(payload);
            assert_eq!(decode_base58_check(&encoded).unwrap(), payload);
        }
    }

    #[test]
    fn test_known_address_payload() {
        // Genesis coinbase address
        let payload = decode_base58_check("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").unwrap();
        assert_eq!(payload.len(), 21);
        assert_eq!(payload[0], 0x00);
        assert_eq!(
            data_encoding::HEXLOWER.encode(&payload[1..]),
            "62e907b15cbf27d5425399ebf6f0fb50ebb88f18"
        );
    }

    #[test]
    fn test_corrupted_checksum_is_rejected() {
        let mut encoded = encode_base58_checksum(b"payload").into_bytes();
        let last = encoded.len() - 1;
        encoded[last] = if encoded[last] == b'2' { b'3' } else { b'2' };
        let corrupted = String::from_utf8(encoded).unwrap();
        assert!(matches!(
            decode_base58_check(&corrupted),
            Err(BtcError::Checksum { .. })
        ));
    }

    #[test]
    fn test_invalid_character_is_format_error() {
        assert!(matches!(decode_base58("0OIl"), Err(BtcError::Format(_))));
    }
}
