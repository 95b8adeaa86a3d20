//! Bitcoin Script
//!
//! Parsing and serialization of scripts, the standard P2PKH/P2SH templates
//! and a stack-machine interpreter. Evaluation never returns an error: a
//! script either validates (`true`) or it does not, and the reason for a
//! failure is logged.

pub mod error;
pub mod interpreter;
pub mod num;
pub mod opcodes;
mod ops;
#[allow(clippy::module_inception)]
pub mod script;
pub mod stack;

pub use error::ScriptError;
pub use interpreter::ExecutionContext;
pub use num::{decode_num, encode_num};
pub use script::{Cmd, Script};
pub use stack::Stack;
