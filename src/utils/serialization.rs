// Wire-format primitives: little-endian integers, varints and a byte cursor
use crate::error::{BtcError, Result};

/// Cursor over a byte slice; every read fails with a format error on truncation
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(BtcError::Format(format!(
                "Unexpected end of data: wanted {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Bitcoin CompactSize: `<0xfd` inline, then `0xfd`/`0xfe`/`0xff` markers
    pub fn read_varint(&mut self) -> Result<u64> {
        match self.read_u8()? {
            0xfd => Ok(u64::from(self.read_u16_le()?)),
            0xfe => Ok(u64::from(self.read_u32_le()?)),
            0xff => self.read_u64_le(),
            n => Ok(u64::from(n)),
        }
    }

    /// Read a varint that is used as a length or count
    pub fn read_varint_usize(&mut self) -> Result<usize> {
        let value = self.read_varint()?;
        usize::try_from(value)
            .map_err(|_| BtcError::Format(format!("Varint {value} does not fit in usize")))
    }
}

pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= u64::from(u16::MAX) {
        let mut out = vec![0xfd];
        out.extend_from_slice(&(value as u16).to_le_bytes());
        out
    } else if value <= u64::from(u32::MAX) {
        let mut out = vec![0xfe];
        out.extend_from_slice(&(value as u32).to_le_bytes());
        out
    } else {
        let mut out = vec![0xff];
        out.extend_from_slice(&value.to_le_bytes());
        out
    }
}

/// Decode a single varint from the front of `bytes`, returning the value and bytes consumed
pub fn read_varint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut reader = Reader::new(bytes);
    let value = reader.read_varint()?;
    Ok((value, reader.position()))
}

/// Little-endian bytes to integer, for widths up to 8 bytes
pub fn little_endian_to_u64(bytes: &[u8]) -> Result<u64> {
    if bytes.len() > 8 {
        return Err(BtcError::Format(format!(
            "{} bytes do not fit in a u64",
            bytes.len()
        )));
    }
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(u64::from_le_bytes(buf))
}

/// Integer to exactly `len` little-endian bytes
pub fn u64_to_little_endian(value: u64, len: usize) -> Result<Vec<u8>> {
    let bytes = value.to_le_bytes();
    if len < 8 && value >> (len * 8) != 0 {
        return Err(BtcError::Validation(format!(
            "{value} does not fit in {len} bytes"
        )));
    }
    let mut out = bytes[..len.min(8)].to_vec();
    out.resize(len, 0);
    Ok(out)
}
