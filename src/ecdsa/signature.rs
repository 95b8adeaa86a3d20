use crate::ecc::secp256k1::N;
use crate::error::{BtcError, Result};
use crate::utils::bigint::from_bytes_be;
use crate::utils::serialization::Reader;
use num_bigint::BigUint;
use num_traits::Zero;
use std::fmt;

const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

/// An ECDSA signature `(r, s)` with both components in `[1, n-1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    r: BigUint,
    s: BigUint,
}

impl Signature {
    pub fn new(r: BigUint, s: BigUint) -> Result<Signature> {
        let n = &*N;
        if r.is_zero() || &r >= n || s.is_zero() || &s >= n {
            return Err(BtcError::Validation(format!(
                "Signature components must be in [1, n-1]: r={r:x}, s={s:x}"
            )));
        }
        Ok(Signature { r, s })
    }

    pub fn r(&self) -> &BigUint {
        &self.r
    }

    pub fn s(&self) -> &BigUint {
        &self.s
    }

    /// DER encoding: `30 len 02 rlen r 02 slen s`
    pub fn der(&self) -> Vec<u8> {
        let mut body = encode_der_integer(&self.r);
        body.extend(encode_der_integer(&self.s));
        let mut out = vec![DER_SEQUENCE, body.len() as u8];
        out.extend(body);
        out
    }

    pub fn parse(der: &[u8]) -> Result<Signature> {
        let mut reader = Reader::new(der);
        let tag = reader.read_u8()?;
        if tag != DER_SEQUENCE {
            return Err(BtcError::Format(format!(
                "Bad signature: expected tag {DER_SEQUENCE:#04x}, got {tag:#04x}"
            )));
        }
        let length = reader.read_u8()? as usize;
        if length != reader.remaining() {
            return Err(BtcError::Format(format!(
                "Bad signature length: header says {length}, {} bytes follow",
                reader.remaining()
            )));
        }
        let r = read_der_integer(&mut reader)?;
        let s = read_der_integer(&mut reader)?;
        if !reader.is_empty() {
            return Err(BtcError::Format(
                "Trailing bytes after DER signature".to_string(),
            ));
        }
        Signature::new(r, s)
    }
}

fn encode_der_integer(value: &BigUint) -> Vec<u8> {
    let mut bytes = value.to_bytes_be();
    // DER integers are signed; keep the value positive
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0x00);
    }
    let mut out = vec![DER_INTEGER, bytes.len() as u8];
    out.extend(bytes);
    out
}

fn read_der_integer(reader: &mut Reader<'_>) -> Result<BigUint> {
    let marker = reader.read_u8()?;
    if marker != DER_INTEGER {
        return Err(BtcError::Format(format!(
            "Bad signature: expected integer marker, got {marker:#04x}"
        )));
    }
    let length = reader.read_u8()? as usize;
    if length == 0 {
        return Err(BtcError::Format("Empty DER integer".to_string()));
    }
    Ok(from_bytes_be(reader.read_bytes(length)?))
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:x},{:x})", self.r, self.s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_encoding::HEXLOWER;

    fn hex_int(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    #[test]
    fn test_der_with_short_r() {
        let sig = Signature::new(
            hex_int("6c7f83102d2b5a70f44169b92da38de4f46b98ee4450f083e65df4862e60a97"),
            hex_int("2e27ed37480697943c3ed53575cae4265f265e58a836fcc867b2888e98374cd2"),
        )
        .unwrap();
        assert_eq!(
            HEXLOWER.encode(&sig.der()),
            "3044022006c7f83102d2b5a70f44169b92da38de4f46b98ee4450f083e65df4862e60a9702202e27ed37480697943c3ed53575cae4265f265e58a836fcc867b2888e98374cd2"
        );
    }

    #[test]
    fn test_der_high_bit_gets_zero_prefix() {
        let sig = Signature::new(
            hex_int("8eeacac05e4c29e793b5287ed044637132ce9ead7fded533e7441d87a8dc9c23"),
            hex_int("36674f81f10c7fb347c1224bd546813ea24ada6f642c02f2248516e3aa8cb303"),
        )
        .unwrap();
        let der = sig.der();
        assert_eq!(&der[..5], &[0x30, 0x45, 0x02, 0x21, 0x00]);
        assert_eq!(Signature::parse(&der).unwrap(), sig);
    }

    #[test]
    fn test_round_trip_small_values() {
        for (r, s) in [(1u32, 1u32), (0x80, 0x7f), (0xff00, 0x01_0000)] {
            let sig = Signature::new(BigUint::from(r), BigUint::from(s)).unwrap();
            assert_eq!(Signature::parse(&sig.der()).unwrap(), sig);
        }
    }

    #[test]
    fn test_parse_rejects_wrong_tag() {
        let mut der = Signature::new(BigUint::from(5u32), BigUint::from(6u32))
            .unwrap()
            .der();
        der[0] = 0x31;
        assert!(matches!(Signature::parse(&der), Err(BtcError::Format(_))));
    }

    #[test]
    fn test_parse_rejects_truncation_and_trailing_bytes() {
        let der = Signature::new(BigUint::from(5u32), BigUint::from(6u32))
            .unwrap()
            .der();
        assert!(Signature::parse(&der[..der.len() - 1]).is_err());
        let mut longer = der.clone();
        longer.push(0x00);
        assert!(Signature::parse(&longer).is_err());
        assert!(Signature::parse(&[]).is_err());
    }

    #[test]
    fn test_out_of_range_components() {
        assert!(Signature::new(BigUint::zero(), BigUint::from(1u32)).is_err());
        assert!(Signature::new(BigUint::from(1u32), BigUint::clone(&N)).is_err());
    }
}
