use crate::error::{BtcError, Result};
use crate::script::opcodes::*;
use crate::utils::serialization::{encode_varint, Reader};
use data_encoding::HEXLOWER;
use std::fmt;
use std::ops::Add;

/// Longest push `raw_serialize` will emit
pub const MAX_PUSH_SIZE: usize = 520;
const MAX_DIRECT_PUSH: usize = 75;

/// One script instruction: an opcode byte or a data push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    Op(u8),
    Push(Vec<u8>),
}

impl Cmd {
    pub fn is_op(&self, code: u8) -> bool {
        matches!(self, Cmd::Op(c) if *c == code)
    }

    pub fn push_data(&self) -> Option<&[u8]> {
        match self {
            Cmd::Push(data) => Some(data),
            Cmd::Op(_) => None,
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Op(code) => match op_name(*code) {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "OP_[{code}]"),
            },
            Cmd::Push(data) => write!(f, "{}", HEXLOWER.encode(data)),
        }
    }
}

/// A Bitcoin script as an ordered list of instructions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    cmds: Vec<Cmd>,
}

impl Script {
    pub fn new(cmds: Vec<Cmd>) -> Script {
        Script { cmds }
    }

    pub fn cmds(&self) -> &[Cmd] {
        &self.cmds
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Parse a varint length prefix followed by that many bytes of script
    pub fn parse(reader: &mut Reader<'_>) -> Result<Script> {
        let length = reader.read_varint_usize()?;
        let body = reader.read_bytes(length)?;
        Script::parse_raw(body)
    }

    /// Parse script bytes with no length prefix; every byte must be consumed
    /// by complete instructions
    pub fn parse_raw(bytes: &[u8]) -> Result<Script> {
        let mut reader = Reader::new(bytes);
        let mut cmds = Vec::new();
        while !reader.is_empty() {
            let current = reader.read_u8()?;
            let cmd = match current {
                0x01..=0x4b => Cmd::Push(read_push(&mut reader, current as usize)?),
                OP_PUSHDATA1 => {
                    let len = reader.read_u8()? as usize;
                    Cmd::Push(read_push(&mut reader, len)?)
                }
                OP_PUSHDATA2 => {
                    let len = reader.read_u16_le()? as usize;
                    Cmd::Push(read_push(&mut reader, len)?)
                }
                // OP_PUSHDATA4 is not a push here; it stays a bare opcode
                code => Cmd::Op(code),
            };
            cmds.push(cmd);
        }
        Ok(Script { cmds })
    }

    pub fn raw_serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for cmd in &self.cmds {
            match cmd {
                Cmd::Op(code @ (0x01..=0x4b | OP_PUSHDATA1 | OP_PUSHDATA2)) => {
                    // These bytes would parse back as push headers
                    return Err(BtcError::Format(format!(
                        "Opcode {code:#04x} is a push header, use Cmd::Push"
                    )));
                }
                Cmd::Op(code) => out.push(*code),
                Cmd::Push(data) => {
                    let len = data.len();
                    if (1..=MAX_DIRECT_PUSH).contains(&len) {
                        out.push(len as u8);
                    } else if len < 0x100 {
                        out.push(OP_PUSHDATA1);
                        out.push(len as u8);
                    } else if len <= MAX_PUSH_SIZE {
                        out.push(OP_PUSHDATA2);
                        out.extend_from_slice(&(len as u16).to_le_bytes());
                    } else {
                        return Err(BtcError::Format(format!(
                            "Push of {len} bytes exceeds the {MAX_PUSH_SIZE} byte limit"
                        )));
                    }
                    out.extend_from_slice(data);
                }
            }
        }
        Ok(out)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let raw = self.raw_serialize()?;
        let mut out = encode_varint(raw.len() as u64);
        out.extend(raw);
        Ok(out)
    }

    pub fn concat(&self, other: &Script) -> Script {
        let mut cmds = self.cmds.clone();
        cmds.extend(other.cmds.iter().cloned());
        Script { cmds }
    }

    /// `OP_DUP OP_HASH160 <h160> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh(h160: &[u8; 20]) -> Script {
        Script::new(vec![
            Cmd::Op(OP_DUP),
            Cmd::Op(OP_HASH160),
            Cmd::Push(h160.to_vec()),
            Cmd::Op(OP_EQUALVERIFY),
            Cmd::Op(OP_CHECKSIG),
        ])
    }

    /// `OP_HASH160 <h160> OP_EQUAL`
    pub fn p2sh(h160: &[u8; 20]) -> Script {
        Script::new(vec![
            Cmd::Op(OP_HASH160),
            Cmd::Push(h160.to_vec()),
            Cmd::Op(OP_EQUAL),
        ])
    }

    pub fn is_p2pkh_script_pubkey(&self) -> bool {
        matches!(
            self.cmds.as_slice(),
            [Cmd::Op(OP_DUP), Cmd::Op(OP_HASH160), Cmd::Push(h), Cmd::Op(OP_EQUALVERIFY), Cmd::Op(OP_CHECKSIG)]
                if h.len() == 20
        )
    }

    pub fn is_p2sh_script_pubkey(&self) -> bool {
        matches!(
            self.cmds.as_slice(),
            [Cmd::Op(OP_HASH160), Cmd::Push(h), Cmd::Op(OP_EQUAL)] if h.len() == 20
        )
    }

    /// The 20-byte hash a P2PKH or P2SH script pays to
    pub fn payee_hash160(&self) -> Option<[u8; 20]> {
        let data = if self.is_p2pkh_script_pubkey() {
            self.cmds[2].push_data()
        } else if self.is_p2sh_script_pubkey() {
            self.cmds[1].push_data()
        } else {
            None
        }?;
        data.try_into().ok()
    }

    pub(crate) fn into_cmds(self) -> Vec<Cmd> {
        self.cmds
    }
}

fn read_push(reader: &mut Reader<'_>, len: usize) -> Result<Vec<u8>> {
    reader.read_bytes(len).map(|data| data.to_vec()).map_err(|_| {
        BtcError::Format(format!(
            "Parsing script failed: push of {len} bytes runs past the end"
        ))
    })
}

impl Add for Script {
    type Output = Script;

    fn add(mut self, other: Script) -> Script {
        self.cmds.extend(other.cmds);
        self
    }
}

impl From<Vec<Cmd>> for Script {
    fn from(cmds: Vec<Cmd>) -> Script {
        Script::new(cmds)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for cmd in &self.cmds {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{cmd}")?;
            first = false;
        }
        Ok(())
    }
}
