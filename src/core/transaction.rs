// This file implements Bitcoin transactions as they appear on the wire
// Inputs point at outputs of earlier transactions, so anything that needs the
// spent amount or the locking script goes through a TxFetcher

use crate::ecdsa::PrivateKey;
use crate::error::{BtcError, Result};
use crate::script::{Cmd, ExecutionContext, Script};
use crate::utils::bigint::from_bytes_be;
use crate::utils::crypto::hash256;
use crate::utils::serialization::{encode_varint, Reader};
use data_encoding::HEXLOWER;
use num_bigint::BigUint;
use std::fmt;

pub const SIGHASH_ALL: u32 = 1;
pub const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;

/// Source of previously broadcast transactions, keyed by their id
pub trait TxFetcher {
    /// `tx_id` is in display order (the reverse of the wire order)
    fn fetch(&self, tx_id: &[u8; 32], testnet: bool) -> Result<Transaction>;
}

// An input says "I'm spending output #prev_index of transaction prev_tx"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    prev_tx: [u8; 32], // Display order, reversed on the wire
    prev_index: u32,
    script_sig: Script, // Empty until the input is signed
    sequence: u32,
}

impl TxIn {
    pub fn new(prev_tx: [u8; 32], prev_index: u32) -> TxIn {
        TxIn {
            prev_tx,
            prev_index,
            script_sig: Script::default(),
            sequence: DEFAULT_SEQUENCE,
        }
    }

    pub fn with_sequence(mut self, sequence: u32) -> TxIn {
        self.sequence = sequence;
        self
    }

    pub fn with_script_sig(mut self, script_sig: Script) -> TxIn {
        self.script_sig = script_sig;
        self
    }

    pub fn get_prev_tx(&self) -> &[u8; 32] {
        &self.prev_tx
    }

    pub fn get_prev_index(&self) -> u32 {
        self.prev_index
    }

    pub fn get_script_sig(&self) -> &Script {
        &self.script_sig
    }

    pub fn get_sequence(&self) -> u32 {
        self.sequence
    }

    pub fn parse(reader: &mut Reader<'_>) -> Result<TxIn> {
        let mut prev_tx = reader.read_array::<32>()?;
        prev_tx.reverse();
        let prev_index = reader.read_u32_le()?;
        let script_sig = Script::parse(reader)?;
        let sequence = reader.read_u32_le()?;
        Ok(TxIn {
            prev_tx,
            prev_index,
            script_sig,
            sequence,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.serialize_with_script(&self.script_sig)
    }

    // The sighash needs the same layout with a different script in the middle
    fn serialize_with_script(&self, script: &Script) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend(self.prev_tx.iter().rev());
        out.extend_from_slice(&self.prev_index.to_le_bytes());
        out.extend(script.serialize()?);
        out.extend_from_slice(&self.sequence.to_le_bytes());
        Ok(out)
    }

    pub fn fetch_tx(&self, fetcher: &dyn TxFetcher, testnet: bool) -> Result<Transaction> {
        fetcher.fetch(&self.prev_tx, testnet)
    }

    // The output this input spends
    fn spent_output(&self, fetcher: &dyn TxFetcher, testnet: bool) -> Result<TxOut> {
        let prev = self.fetch_tx(fetcher, testnet)?;
        prev.tx_outs
            .into_iter()
            .nth(self.prev_index as usize)
            .ok_or_else(|| {
                BtcError::Fetch(format!(
                    "Transaction {} has no output #{}",
                    HEXLOWER.encode(&self.prev_tx),
                    self.prev_index
                ))
            })
    }

    pub fn value(&self, fetcher: &dyn TxFetcher, testnet: bool) -> Result<u64> {
        Ok(self.spent_output(fetcher, testnet)?.amount)
    }

    pub fn script_pubkey(&self, fetcher: &dyn TxFetcher, testnet: bool) -> Result<Script> {
        Ok(self.spent_output(fetcher, testnet)?.script_pubkey)
    }
}

impl fmt::Display for TxIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", HEXLOWER.encode(&self.prev_tx), self.prev_index)
    }
}

// An output is "pay amount satoshis to whoever can satisfy script_pubkey"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    amount: u64,
    script_pubkey: Script,
}

impl TxOut {
    pub fn new(amount: u64, script_pubkey: Script) -> TxOut {
        TxOut {
            amount,
            script_pubkey,
        }
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_script_pubkey(&self) -> &Script {
        &self.script_pubkey
    }

    pub fn parse(reader: &mut Reader<'_>) -> Result<TxOut> {
        let amount = reader.read_u64_le()?;
        let script_pubkey = Script::parse(reader)?;
        Ok(TxOut {
            amount,
            script_pubkey,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = self.amount.to_le_bytes().to_vec();
        out.extend(self.script_pubkey.serialize()?);
        Ok(out)
    }
}

impl fmt::Display for TxOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.amount, self.script_pubkey)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    version: u32,
    tx_ins: Vec<TxIn>,
    tx_outs: Vec<TxOut>,
    locktime: u32,
    testnet: bool, // Which network the inputs are looked up on
}

impl Transaction {
    pub fn new(
        version: u32,
        tx_ins: Vec<TxIn>,
        tx_outs: Vec<TxOut>,
        locktime: u32,
        testnet: bool,
    ) -> Transaction {
        Transaction {
            version,
            tx_ins,
            tx_outs,
            locktime,
            testnet,
        }
    }

    pub fn get_version(&self) -> u32 {
        self.version
    }

    pub fn get_tx_ins(&self) -> &[TxIn] {
        &self.tx_ins
    }

    pub fn get_tx_outs(&self) -> &[TxOut] {
        &self.tx_outs
    }

    pub fn get_locktime(&self) -> u32 {
        self.locktime
    }

    pub fn is_testnet(&self) -> bool {
        self.testnet
    }

    pub fn set_testnet(&mut self, testnet: bool) {
        self.testnet = testnet;
    }

    pub fn parse(reader: &mut Reader<'_>, testnet: bool) -> Result<Transaction> {
        let version = reader.read_u32_le()?;
        let num_inputs = reader.read_varint_usize()?;
        // Counts are untrusted input; no pre-allocation
        let mut tx_ins = Vec::new();
        for _ in 0..num_inputs {
            tx_ins.push(TxIn::parse(reader)?);
        }
        let num_outputs = reader.read_varint_usize()?;
        let mut tx_outs = Vec::new();
        for _ in 0..num_outputs {
            tx_outs.push(TxOut::parse(reader)?);
        }
        let locktime = reader.read_u32_le()?;
        Ok(Transaction {
            version,
            tx_ins,
            tx_outs,
            locktime,
            testnet,
        })
    }

    /// Parse a complete legacy serialization; trailing bytes are an error
    pub fn from_bytes(bytes: &[u8], testnet: bool) -> Result<Transaction> {
        let mut reader = Reader::new(bytes);
        let tx = Transaction::parse(&mut reader, testnet)?;
        if !reader.is_empty() {
            return Err(BtcError::Format(format!(
                "{} trailing bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Parse raw bytes as served by block explorers.
    ///
    /// A segwit serialization (marker byte `0x00` right after the version) has
    /// the marker and flag removed; the witness data is skipped and the
    /// locktime taken from the last four bytes.
    pub fn parse_from_network_bytes(raw: &[u8], testnet: bool) -> Result<Transaction> {
        if raw.len() > 6 && raw[4] == 0x00 {
            let mut stripped = raw[..4].to_vec();
            stripped.extend_from_slice(&raw[6..]);
            let mut tx = Transaction::parse(&mut Reader::new(&stripped), testnet)?;
            let mut tail = [0u8; 4];
            tail.copy_from_slice(&raw[raw.len() - 4..]);
            tx.locktime = u32::from_le_bytes(tail);
            Ok(tx)
        } else {
            Transaction::parse(&mut Reader::new(raw), testnet)
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = self.version.to_le_bytes().to_vec();
        out.extend(encode_varint(self.tx_ins.len() as u64));
        for tx_in in &self.tx_ins {
            out.extend(tx_in.serialize()?);
        }
        out.extend(encode_varint(self.tx_outs.len() as u64));
        for tx_out in &self.tx_outs {
            out.extend(tx_out.serialize()?);
        }
        out.extend_from_slice(&self.locktime.to_le_bytes());
        Ok(out)
    }

    /// Transaction hash in display order
    pub fn hash(&self) -> Result<[u8; 32]> {
        let mut digest = hash256(&self.serialize()?);
        digest.reverse();
        Ok(digest)
    }

    pub fn id(&self) -> Result<String> {
        Ok(HEXLOWER.encode(&self.hash()?))
    }

    /// Sum of spent amounts minus sum of output amounts; negative when the
    /// transaction tries to create money
    pub fn fee(&self, fetcher: &dyn TxFetcher) -> Result<i128> {
        let mut input_sum: i128 = 0;
        for tx_in in &self.tx_ins {
            input_sum += i128::from(tx_in.value(fetcher, self.testnet)?);
        }
        let output_sum: i128 = self
            .tx_outs
            .iter()
            .map(|tx_out| i128::from(tx_out.amount))
            .sum();
        Ok(input_sum - output_sum)
    }

    /// SIGHASH_ALL digest for `input_index`, read as a big-endian integer
    pub fn sig_hash(&self, input_index: usize, fetcher: &dyn TxFetcher) -> Result<BigUint> {
        self.sig_hash_with_redeem(input_index, None, fetcher)
    }

    /// Like [`Transaction::sig_hash`], but a P2SH spend commits to the redeem
    /// script instead of the output's script_pubkey
    pub fn sig_hash_with_redeem(
        &self,
        input_index: usize,
        redeem_script: Option<&Script>,
        fetcher: &dyn TxFetcher,
    ) -> Result<BigUint> {
        let signed_input = self.input(input_index)?;
        let script_code = match redeem_script {
            Some(redeem) => redeem.clone(),
            None => signed_input.script_pubkey(fetcher, self.testnet)?,
        };
        let empty = Script::default();

        let mut s = self.version.to_le_bytes().to_vec();
        s.extend(encode_varint(self.tx_ins.len() as u64));
        for (i, tx_in) in self.tx_ins.iter().enumerate() {
            // Only the input being signed carries a script
            let script = if i == input_index {
                &script_code
            } else {
                &empty
            };
            s.extend(tx_in.serialize_with_script(script)?);
        }
        s.extend(encode_varint(self.tx_outs.len() as u64));
        for tx_out in &self.tx_outs {
            s.extend(tx_out.serialize()?);
        }
        s.extend_from_slice(&self.locktime.to_le_bytes());
        s.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
        Ok(from_bytes_be(&hash256(&s)))
    }

    pub fn verify_input(&self, input_index: usize, fetcher: &dyn TxFetcher) -> Result<bool> {
        let tx_in = self.input(input_index)?;
        let script_pubkey = tx_in.script_pubkey(fetcher, self.testnet)?;
        let z = if script_pubkey.is_p2sh_script_pubkey() {
            // The redeem script is the last thing the script_sig pushes
            let redeem = tx_in
                .script_sig
                .cmds()
                .last()
                .and_then(Cmd::push_data)
                .and_then(|raw| Script::parse_raw(raw).ok());
            match redeem {
                Some(redeem) => self.sig_hash_with_redeem(input_index, Some(&redeem), fetcher)?,
                None => {
                    log::info!("Input {input_index} spends P2SH without a usable redeem script");
                    return Ok(false);
                }
            }
        } else {
            self.sig_hash(input_index, fetcher)?
        };
        let ctx = ExecutionContext {
            z,
            version: self.version,
            locktime: self.locktime,
            sequence: tx_in.sequence,
        };
        let combined = tx_in.script_sig.concat(&script_pubkey);
        Ok(combined.evaluate_with(&ctx))
    }

    /// Check the fee is not negative and every input unlocks what it spends
    pub fn verify(&self, fetcher: &dyn TxFetcher) -> Result<bool> {
        let fee = self.fee(fetcher)?;
        if fee < 0 {
            log::warn!("Transaction spends more than its inputs provide (fee {fee})");
            return Ok(false);
        }
        for i in 0..self.tx_ins.len() {
            if !self.verify_input(i, fetcher)? {
                log::info!("Input {i} failed verification");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Sign input `input_index` with SIGHASH_ALL and a compressed public key,
    /// then report whether the input now verifies
    pub fn sign_input(
        &mut self,
        input_index: usize,
        private_key: &PrivateKey,
        fetcher: &dyn TxFetcher,
    ) -> Result<bool> {
        let z = self.sig_hash(input_index, fetcher)?;
        let mut sig = private_key.sign(&z)?.der();
        sig.push(SIGHASH_ALL as u8);
        let sec = private_key.sec(true)?;
        let script_sig = Script::new(vec![Cmd::Push(sig), Cmd::Push(sec)]);
        self.set_script_sig(input_index, script_sig)?;

        let verified = self.verify_input(input_index, fetcher)?;
        if !verified {
            log::info!("Freshly signed input {input_index} does not verify");
        }
        Ok(verified)
    }

    /// Install a hand-built script_sig, e.g. for multisig or P2SH spends
    pub fn set_script_sig(&mut self, input_index: usize, script_sig: Script) -> Result<()> {
        self.input_mut(input_index)?.script_sig = script_sig;
        Ok(())
    }

    fn input(&self, input_index: usize) -> Result<&TxIn> {
        self.tx_ins.get(input_index).ok_or_else(|| {
            BtcError::Validation(format!(
                "Input index {input_index} out of range ({} inputs)",
                self.tx_ins.len()
            ))
        })
    }

    fn input_mut(&mut self, input_index: usize) -> Result<&mut TxIn> {
        let count = self.tx_ins.len();
        self.tx_ins.get_mut(input_index).ok_or_else(|| {
            BtcError::Validation(format!(
                "Input index {input_index} out of range ({count} inputs)"
            ))
        })
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Ok(id) => writeln!(f, "tx: {id}")?,
            Err(_) => writeln!(f, "tx: <unserializable>")?,
        }
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "tx_ins:")?;
        for tx_in in &self.tx_ins {
            writeln!(f, "{tx_in}")?;
        }
        writeln!(f, "tx_outs:")?;
        for tx_out in &self.tx_outs {
            writeln!(f, "{tx_out}")?;
        }
        write!(f, "locktime: {}", self.locktime)
    }
}
