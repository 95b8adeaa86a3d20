//! Script number encoding: little-endian sign-magnitude, minimal, empty = 0

use crate::script::error::ScriptError;

/// Operand limit for arithmetic opcodes
pub const MAX_NUM_SIZE: usize = 4;
/// Operand limit for the locktime opcodes, which need the full u32 range
pub const MAX_LOCKTIME_NUM_SIZE: usize = 5;

pub fn encode_num(num: i64) -> Vec<u8> {
    if num == 0 {
        return Vec::new();
    }
    let negative = num < 0;
    let mut magnitude = num.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

pub fn decode_num(element: &[u8], max_len: usize) -> Result<i64, ScriptError> {
    if element.len() > max_len.min(8) {
        return Err(ScriptError::NumberOverflow);
    }
    let Some((&last, _)) = element.split_last() else {
        return Ok(0);
    };
    let negative = last & 0x80 != 0;
    let mut result: i64 = 0;
    for (i, &byte) in element.iter().enumerate() {
        let byte = if i == element.len() - 1 { byte & 0x7f } else { byte };
        result |= i64::from(byte) << (8 * i);
    }
    Ok(if negative { -result } else { result })
}

/// Numeric zero test: all bytes zero, except that a final `0x80`
/// (negative zero) is also false
pub fn is_true(element: &[u8]) -> bool {
    let last = element.len().saturating_sub(1);
    element
        .iter()
        .enumerate()
        .any(|(i, &byte)| byte != 0 && !(i == last && byte == 0x80))
}

pub fn encode_bool(value: bool) -> Vec<u8> {
    if value {
        encode_num(1)
    } else {
        encode_num(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode_num(0), Vec::<u8>::new());
        assert_eq!(encode_num(1), vec![0x01]);
        assert_eq!(encode_num(-1), vec![0x81]);
        assert_eq!(encode_num(127), vec![0x7f]);
        assert_eq!(encode_num(128), vec![0x80, 0x00]);
        assert_eq!(encode_num(-128), vec![0x80, 0x80]);
        assert_eq!(encode_num(255), vec![0xff, 0x00]);
        assert_eq!(encode_num(256), vec![0x00, 0x01]);
        assert_eq!(encode_num(-256), vec![0x00, 0x81]);
    }

    #[test]
    fn test_decode_matches_encode() {
        for n in [-70000i64, -256, -129, -128, -1, 0, 1, 16, 127, 128, 500, 65535, 0x7fff_ffff] {
            assert_eq!(decode_num(&encode_num(n), 5).unwrap(), n);
        }
    }

    #[test]
    fn test_decode_non_minimal_is_accepted() {
        assert_eq!(decode_num(&[0x01, 0x00], 4).unwrap(), 1);
        assert_eq!(decode_num(&[0x80], 4).unwrap(), 0);
    }

    #[test]
    fn test_operand_size_limit() {
        assert_eq!(
            decode_num(&[0x00, 0x00, 0x00, 0x80, 0x00], MAX_NUM_SIZE),
            Err(ScriptError::NumberOverflow)
        );
        assert_eq!(
            decode_num(&[0x00, 0x00, 0x00, 0x80, 0x00], MAX_LOCKTIME_NUM_SIZE).unwrap(),
            0x8000_0000
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_true(&[]));
        assert!(!is_true(&[0x00]));
        assert!(!is_true(&[0x00, 0x00]));
        assert!(!is_true(&[0x80]));
        assert!(!is_true(&[0x00, 0x80]));
        assert!(is_true(&[0x01]));
        assert!(is_true(&[0x80, 0x00]));
        assert!(is_true(&[0x00, 0x81]));
    }
}
