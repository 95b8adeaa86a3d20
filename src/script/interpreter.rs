//! Script evaluation
//!
//! The instruction list is never mutated. Execution walks a stack of frames,
//! each a shared command slice plus a cursor and an end index. Taking an
//! `OP_IF` branch or splicing in a P2SH redeem script pushes a new frame; a
//! frame that runs off its end is popped.

use crate::script::error::ScriptError;
use crate::script::num::is_true;
use crate::script::opcodes::*;
use crate::script::ops;
use crate::script::script::{Cmd, Script};
use crate::script::stack::{Stack, MAX_SCRIPT_ELEMENT_SIZE};
use crate::utils::crypto::hash160;
use num_bigint::BigUint;
use std::rc::Rc;

/// What the signature and locktime opcodes can see of the spending transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Signature hash of the input being verified
    pub z: BigUint,
    pub version: u32,
    pub locktime: u32,
    pub sequence: u32,
}

impl ExecutionContext {
    /// Context for a version 1 transaction with locktime 0 and a final sequence
    pub fn new(z: BigUint) -> ExecutionContext {
        ExecutionContext {
            z,
            version: 1,
            locktime: 0,
            sequence: 0xffff_ffff,
        }
    }
}

struct Frame {
    cmds: Rc<[Cmd]>,
    pos: usize,
    end: usize,
}

impl Frame {
    fn new(cmds: Rc<[Cmd]>, pos: usize, end: usize) -> Frame {
        Frame { cmds, pos, end }
    }
}

/// Where the selected branch of a conditional lies, as `[start, end)` ranges
struct Conditional {
    if_branch: (usize, usize),
    else_branch: (usize, usize),
    endif: usize,
}

impl Script {
    /// Evaluate against the sighash `z` with the default context
    pub fn evaluate(&self, z: &BigUint) -> bool {
        self.evaluate_with(&ExecutionContext::new(z.clone()))
    }

    pub fn evaluate_with(&self, ctx: &ExecutionContext) -> bool {
        match self.run(ctx) {
            Ok(()) => true,
            Err((error, op)) => {
                match op {
                    Some(code) => log::info!(
                        "bad op: {} ({error})",
                        op_name(code).unwrap_or("unknown opcode")
                    ),
                    None => log::info!("script failed: {error}"),
                }
                false
            }
        }
    }

    fn run(&self, ctx: &ExecutionContext) -> Result<(), (ScriptError, Option<u8>)> {
        let program: Rc<[Cmd]> = Rc::from(self.cmds().to_vec());
        let p2sh_push = p2sh_push_index(&program);
        let mut p2sh_done = false;
        let mut stack = Stack::new();
        let mut frames = vec![Frame::new(Rc::clone(&program), 0, program.len())];

        while let Some(frame) = frames.last_mut() {
            if frame.pos >= frame.end {
                frames.pop();
                continue;
            }
            let cmds = Rc::clone(&frame.cmds);
            let index = frame.pos;
            frame.pos += 1;

            match &cmds[index] {
                Cmd::Push(data) => {
                    let is_p2sh = !p2sh_done
                        && p2sh_push == Some(index)
                        && Rc::ptr_eq(&cmds, &program);
                    if is_p2sh {
                        p2sh_done = true;
                        if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
                            return Err((ScriptError::PushSize, None));
                        }
                        // Skip HASH160 <hash> EQUAL; they are checked here
                        frame.pos = frame.end;
                        let redeem = splice_redeem_script(data, &cmds[index + 2])
                            .map_err(|e| (e, Some(OP_HASH160)))?;
                        let len = redeem.len();
                        frames.push(Frame::new(redeem, 0, len));
                    } else {
                        stack.push(data.clone()).map_err(|e| (e, None))?;
                    }
                }
                Cmd::Op(code @ (OP_IF | OP_NOTIF)) => {
                    let code = *code;
                    let branches = find_conditional(&cmds, frame.pos, frame.end)
                        .map_err(|e| (e, Some(code)))?;
                    let condition = stack.pop().map_err(|e| (e, Some(code)))?;
                    let take_if = is_true(&condition) == (code == OP_IF);
                    let (start, end) = if take_if {
                        branches.if_branch
                    } else {
                        branches.else_branch
                    };
                    frame.pos = branches.endif + 1;
                    frames.push(Frame::new(Rc::clone(&cmds), start, end));
                }
                Cmd::Op(code @ (OP_ELSE | OP_ENDIF)) => {
                    return Err((ScriptError::UnbalancedConditional, Some(*code)));
                }
                Cmd::Op(code) => {
                    log::debug!("executing {}", Cmd::Op(*code));
                    ops::execute(*code, &mut stack, ctx).map_err(|e| (e, Some(*code)))?;
                }
            }
        }

        match stack.elements().last() {
            Some(top) if !top.is_empty() => Ok(()),
            _ => Err((ScriptError::EvalFalse, None)),
        }
    }
}

/// Index of the redeem script push when the program ends in
/// `<push> OP_HASH160 <20 bytes> OP_EQUAL`
fn p2sh_push_index(cmds: &[Cmd]) -> Option<usize> {
    match cmds {
        [.., Cmd::Push(_), Cmd::Op(OP_HASH160), Cmd::Push(hash), Cmd::Op(OP_EQUAL)]
            if hash.len() == 20 =>
        {
            Some(cmds.len() - 4)
        }
        _ => None,
    }
}

fn splice_redeem_script(redeem: &[u8], expected: &Cmd) -> Result<Rc<[Cmd]>, ScriptError> {
    let expected = expected.push_data().ok_or(ScriptError::P2shHashMismatch)?;
    if hash160(redeem).as_slice() != expected {
        return Err(ScriptError::P2shHashMismatch);
    }
    let script = Script::parse_raw(redeem).map_err(|_| ScriptError::BadRedeemScript)?;
    Ok(Rc::from(script.into_cmds()))
}

/// Scan `cmds[start..end]` for the `OP_ENDIF` matching an `OP_IF` whose body
/// starts at `start`, splitting at a top-level `OP_ELSE`
fn find_conditional(cmds: &[Cmd], start: usize, end: usize) -> Result<Conditional, ScriptError> {
    let mut depth = 1usize;
    let mut else_at: Option<usize> = None;
    for (i, cmd) in cmds.iter().enumerate().take(end).skip(start) {
        match cmd {
            Cmd::Op(OP_IF | OP_NOTIF) => depth += 1,
            Cmd::Op(OP_ELSE) if depth == 1 => {
                if else_at.is_some() {
                    return Err(ScriptError::UnbalancedConditional);
                }
                else_at = Some(i);
            }
            Cmd::Op(OP_ENDIF) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(match else_at {
                        Some(e) => Conditional {
                            if_branch: (start, e),
                            else_branch: (e + 1, i),
                            endif: i,
                        },
                        None => Conditional {
                            if_branch: (start, i),
                            else_branch: (i, i),
                            endif: i,
                        },
                    });
                }
            }
            _ => {}
        }
    }
    Err(ScriptError::UnbalancedConditional)
}
