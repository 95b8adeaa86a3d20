use std::fmt;

/// Why a script stopped. Evaluation reports these as `false`; they are
/// never surfaced as [`crate::error::BtcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptError {
    InvalidStackOperation,
    InvalidAltStackOperation,
    PushSize,
    StackSize,
    NumberOverflow,
    Verify,
    EqualVerify,
    NumEqualVerify,
    CheckSigVerify,
    CheckMultisigVerify,
    OpReturn,
    UnbalancedConditional,
    BadOpcode(u8),
    PubkeyCount,
    SigCount,
    NegativeLocktime,
    UnsatisfiedLocktime,
    P2shHashMismatch,
    BadRedeemScript,
    EvalFalse,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::InvalidStackOperation => write!(f, "Operation on too few stack items"),
            ScriptError::InvalidAltStackOperation => {
                write!(f, "Operation on an empty alt stack")
            }
            ScriptError::PushSize => write!(f, "Pushed element exceeds 520 bytes"),
            ScriptError::StackSize => write!(f, "Stack size limit exceeded"),
            ScriptError::NumberOverflow => write!(f, "Numeric operand too long"),
            ScriptError::Verify => write!(f, "OP_VERIFY failed"),
            ScriptError::EqualVerify => write!(f, "OP_EQUALVERIFY failed"),
            ScriptError::NumEqualVerify => write!(f, "OP_NUMEQUALVERIFY failed"),
            ScriptError::CheckSigVerify => write!(f, "OP_CHECKSIGVERIFY failed"),
            ScriptError::CheckMultisigVerify => write!(f, "OP_CHECKMULTISIGVERIFY failed"),
            ScriptError::OpReturn => write!(f, "OP_RETURN encountered"),
            ScriptError::UnbalancedConditional => write!(f, "Unbalanced conditional"),
            ScriptError::BadOpcode(code) => write!(f, "Disabled or unknown opcode {code:#04x}"),
            ScriptError::PubkeyCount => write!(f, "Public key count out of range"),
            ScriptError::SigCount => write!(f, "Signature count out of range"),
            ScriptError::NegativeLocktime => write!(f, "Negative locktime"),
            ScriptError::UnsatisfiedLocktime => write!(f, "Locktime requirement not satisfied"),
            ScriptError::P2shHashMismatch => write!(f, "Redeem script hash mismatch"),
            ScriptError::BadRedeemScript => write!(f, "Redeem script does not parse"),
            ScriptError::EvalFalse => write!(f, "Script finished with a false stack top"),
        }
    }
}

impl std::error::Error for ScriptError {}
