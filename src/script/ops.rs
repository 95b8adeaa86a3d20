//! Opcode handlers that only touch the stacks and the execution context.
//!
//! Conditionals and P2SH splicing rewrite control flow and live in the
//! interpreter; everything else is dispatched through [`execute`].

use crate::ecc::secp256k1::parse_sec;
use crate::ecdsa::{verify, Signature};
use crate::script::error::ScriptError;
use crate::script::interpreter::ExecutionContext;
use crate::script::num::{
    decode_num, encode_bool, encode_num, is_true, MAX_LOCKTIME_NUM_SIZE, MAX_NUM_SIZE,
};
use crate::script::opcodes::*;
use crate::script::stack::Stack;
use crate::utils::crypto::{hash160, hash256, ripemd160_digest, sha1_digest, sha256_digest};

const LOCKTIME_THRESHOLD: i64 = 500_000_000;
const SEQUENCE_FINAL: u32 = 0xffff_ffff;
const SEQUENCE_DISABLE_FLAG: i64 = 1 << 31;
const SEQUENCE_TYPE_FLAG: i64 = 1 << 22;
const SEQUENCE_MASK: i64 = 0x0000_ffff;
const MAX_PUBKEYS_PER_MULTISIG: i64 = 20;

type OpResult = Result<(), ScriptError>;

pub(crate) fn execute(op: u8, stack: &mut Stack, ctx: &ExecutionContext) -> OpResult {
    if let Some(value) = small_int_value(op) {
        return stack.push(encode_num(value));
    }
    match op {
        OP_0 => stack.push(Vec::new()),
        OP_1NEGATE => stack.push(encode_num(-1)),

        OP_NOP | OP_NOP1 | 0xb3..=0xb9 => Ok(()),
        OP_VERIFY => verify_top(stack, ScriptError::Verify),
        OP_RETURN => Err(ScriptError::OpReturn),

        OP_TOALTSTACK => {
            let item = stack.pop()?;
            stack.push_alt(item)
        }
        OP_FROMALTSTACK => {
            let item = stack.pop_alt()?;
            stack.push(item)
        }
        OP_2DROP => {
            stack.require(2)?;
            stack.pop()?;
            stack.pop()?;
            Ok(())
        }
        OP_2DUP => duplicate_top(stack, 2),
        OP_3DUP => duplicate_top(stack, 3),
        OP_2OVER => {
            stack.require(4)?;
            let first = stack.top(3)?.clone();
            let second = stack.top(2)?.clone();
            stack.push(first)?;
            stack.push(second)
        }
        OP_2ROT => {
            stack.require(6)?;
            let first = stack.remove(5)?;
            let second = stack.remove(4)?;
            stack.push(first)?;
            stack.push(second)
        }
        OP_2SWAP => {
            stack.require(4)?;
            stack.swap(3, 1)?;
            stack.swap(2, 0)
        }
        OP_IFDUP => {
            let top = stack.top(0)?;
            if is_true(top) {
                let copy = top.clone();
                stack.push(copy)?;
            }
            Ok(())
        }
        OP_DEPTH => stack.push(encode_num(stack.len() as i64)),
        OP_DROP => stack.pop().map(|_| ()),
        OP_DUP => duplicate_top(stack, 1),
        OP_NIP => stack.remove(1).map(|_| ()),
        OP_OVER => {
            let item = stack.top(1)?.clone();
            stack.push(item)
        }
        OP_PICK | OP_ROLL => {
            let depth = pop_num(stack)?;
            if depth < 0 || depth as usize >= stack.len() {
                return Err(ScriptError::InvalidStackOperation);
            }
            let depth = depth as usize;
            let item = if op == OP_PICK {
                stack.top(depth)?.clone()
            } else {
                stack.remove(depth)?
            };
            stack.push(item)
        }
        OP_ROT => {
            let item = stack.remove(2)?;
            stack.push(item)
        }
        OP_SWAP => stack.swap(0, 1),
        OP_TUCK => {
            stack.require(2)?;
            let item = stack.top(0)?.clone();
            stack.insert(2, item)
        }

        OP_SIZE => {
            let size = stack.top(0)?.len() as i64;
            stack.push(encode_num(size))
        }

        OP_EQUAL => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            stack.push(encode_bool(a == b))
        }
        OP_EQUALVERIFY => {
            execute(OP_EQUAL, stack, ctx)?;
            verify_top(stack, ScriptError::EqualVerify)
        }

        OP_1ADD | OP_1SUB | OP_NEGATE | OP_ABS | OP_NOT | OP_0NOTEQUAL => {
            let a = pop_num(stack)?;
            let result = match op {
                OP_1ADD => a + 1,
                OP_1SUB => a - 1,
                OP_NEGATE => -a,
                OP_ABS => a.abs(),
                OP_NOT => i64::from(a == 0),
                _ => i64::from(a != 0),
            };
            stack.push(encode_num(result))
        }
        OP_ADD | OP_SUB | OP_BOOLAND | OP_BOOLOR | OP_NUMEQUAL | OP_NUMEQUALVERIFY
        | OP_NUMNOTEQUAL | OP_LESSTHAN | OP_GREATERTHAN | OP_LESSTHANOREQUAL
        | OP_GREATERTHANOREQUAL | OP_MIN | OP_MAX => {
            let b = pop_num(stack)?;
            let a = pop_num(stack)?;
            let result = match op {
                OP_ADD => a + b,
                OP_SUB => a - b,
                OP_BOOLAND => i64::from(a != 0 && b != 0),
                OP_BOOLOR => i64::from(a != 0 || b != 0),
                OP_NUMEQUAL | OP_NUMEQUALVERIFY => i64::from(a == b),
                OP_NUMNOTEQUAL => i64::from(a != b),
                OP_LESSTHAN => i64::from(a < b),
                OP_GREATERTHAN => i64::from(a > b),
                OP_LESSTHANOREQUAL => i64::from(a <= b),
                OP_GREATERTHANOREQUAL => i64::from(a >= b),
                OP_MIN => a.min(b),
                _ => a.max(b),
            };
            stack.push(encode_num(result))?;
            if op == OP_NUMEQUALVERIFY {
                verify_top(stack, ScriptError::NumEqualVerify)?;
            }
            Ok(())
        }
        OP_WITHIN => {
            let max = pop_num(stack)?;
            let min = pop_num(stack)?;
            let x = pop_num(stack)?;
            stack.push(encode_bool(min <= x && x < max))
        }

        OP_RIPEMD160 => hash_top(stack, |data| ripemd160_digest(data).to_vec()),
        OP_SHA1 => hash_top(stack, |data| sha1_digest(data).to_vec()),
        OP_SHA256 => hash_top(stack, |data| sha256_digest(data).to_vec()),
        OP_HASH160 => hash_top(stack, |data| hash160(data).to_vec()),
        OP_HASH256 => hash_top(stack, |data| hash256(data).to_vec()),
        OP_CHECKSIG => op_checksig(stack, ctx),
        OP_CHECKSIGVERIFY => {
            op_checksig(stack, ctx)?;
            verify_top(stack, ScriptError::CheckSigVerify)
        }
        OP_CHECKMULTISIG => op_checkmultisig(stack, ctx),
        OP_CHECKMULTISIGVERIFY => {
            op_checkmultisig(stack, ctx)?;
            verify_top(stack, ScriptError::CheckMultisigVerify)
        }
        OP_CHECKLOCKTIMEVERIFY => op_checklocktimeverify(stack, ctx),
        OP_CHECKSEQUENCEVERIFY => op_checksequenceverify(stack, ctx),

        other => Err(ScriptError::BadOpcode(other)),
    }
}

fn pop_num(stack: &mut Stack) -> Result<i64, ScriptError> {
    decode_num(&stack.pop()?, MAX_NUM_SIZE)
}

fn verify_top(stack: &mut Stack, error: ScriptError) -> OpResult {
    if is_true(&stack.pop()?) {
        Ok(())
    } else {
        Err(error)
    }
}

fn duplicate_top(stack: &mut Stack, count: usize) -> OpResult {
    stack.require(count)?;
    for _ in 0..count {
        let item = stack.top(count - 1)?.clone();
        stack.push(item)?;
    }
    Ok(())
}

fn hash_top<F>(stack: &mut Stack, hasher: F) -> OpResult
where
    F: Fn(&[u8]) -> Vec<u8>,
{
    let item = stack.pop()?;
    stack.push(hasher(&item))
}

/// Strip the trailing sighash byte and decode a DER signature
fn parse_script_signature(element: &[u8]) -> Option<Signature> {
    let (_, der) = element.split_last()?;
    Signature::parse(der).ok()
}

fn op_checksig(stack: &mut Stack, ctx: &ExecutionContext) -> OpResult {
    let sec_pubkey = stack.pop()?;
    let signature = stack.pop()?;
    let valid = match (parse_sec(&sec_pubkey), parse_script_signature(&signature)) {
        (Ok(point), Some(sig)) => verify(&ctx.z, &sig, &point),
        _ => {
            log::debug!("OP_CHECKSIG operands did not parse");
            false
        }
    };
    stack.push(encode_bool(valid))
}

fn op_checkmultisig(stack: &mut Stack, ctx: &ExecutionContext) -> OpResult {
    let n = pop_num(stack)?;
    if !(0..=MAX_PUBKEYS_PER_MULTISIG).contains(&n) {
        return Err(ScriptError::PubkeyCount);
    }
    let mut sec_pubkeys = Vec::with_capacity(n as usize);
    for _ in 0..n {
        sec_pubkeys.push(stack.pop()?);
    }
    sec_pubkeys.reverse();

    let m = pop_num(stack)?;
    if m < 0 || m > n {
        return Err(ScriptError::SigCount);
    }
    let mut signatures = Vec::with_capacity(m as usize);
    for _ in 0..m {
        signatures.push(stack.pop()?);
    }
    signatures.reverse();
    // Extra element consumed by the historical off-by-one
    stack.pop()?;

    let points: Option<Vec<_>> = sec_pubkeys.iter().map(|sec| parse_sec(sec).ok()).collect();
    let sigs: Option<Vec<_>> = signatures
        .iter()
        .map(|element| parse_script_signature(element))
        .collect();
    let valid = match (points, sigs) {
        (Some(points), Some(sigs)) => {
            // Both lists are in script order; each key is consumed once tried
            let mut remaining = points.iter();
            sigs.iter()
                .all(|sig| remaining.any(|point| verify(&ctx.z, sig, point)))
        }
        _ => {
            log::debug!("OP_CHECKMULTISIG operands did not parse");
            false
        }
    };
    stack.push(encode_bool(valid))
}

fn op_checklocktimeverify(stack: &mut Stack, ctx: &ExecutionContext) -> OpResult {
    let locktime = decode_num(stack.top(0)?, MAX_LOCKTIME_NUM_SIZE)?;
    if locktime < 0 {
        return Err(ScriptError::NegativeLocktime);
    }
    if ctx.sequence == SEQUENCE_FINAL {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    let tx_locktime = i64::from(ctx.locktime);
    let same_kind = (locktime < LOCKTIME_THRESHOLD) == (tx_locktime < LOCKTIME_THRESHOLD);
    if !same_kind || locktime > tx_locktime {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    Ok(())
}

fn op_checksequenceverify(stack: &mut Stack, ctx: &ExecutionContext) -> OpResult {
    let sequence = decode_num(stack.top(0)?, MAX_LOCKTIME_NUM_SIZE)?;
    if sequence < 0 {
        return Err(ScriptError::NegativeLocktime);
    }
    if sequence & SEQUENCE_DISABLE_FLAG != 0 {
        return Ok(());
    }
    let tx_sequence = i64::from(ctx.sequence);
    if ctx.version < 2 || tx_sequence & SEQUENCE_DISABLE_FLAG != 0 {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    if sequence & SEQUENCE_TYPE_FLAG != tx_sequence & SEQUENCE_TYPE_FLAG {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    if sequence & SEQUENCE_MASK > tx_sequence & SEQUENCE_MASK {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    Ok(())
}
