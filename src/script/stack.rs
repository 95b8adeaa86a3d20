use crate::script::error::ScriptError;

pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
pub const MAX_STACK_SIZE: usize = 1000;

/// Main and alt stacks of a running script.
///
/// Positions are depths counted from the top: `top(0)` is the last element pushed.
#[derive(Debug, Default, Clone)]
pub struct Stack {
    main: Vec<Vec<u8>>,
    alt: Vec<Vec<u8>>,
}

impl Stack {
    pub fn new() -> Stack {
        Stack::default()
    }

    pub fn len(&self) -> usize {
        self.main.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
    }

    pub fn elements(&self) -> &[Vec<u8>] {
        &self.main
    }

    pub fn push(&mut self, bytes: Vec<u8>) -> Result<(), ScriptError> {
        if bytes.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptError::PushSize);
        }
        self.main.push(bytes);
        self.check_size()
    }

    pub fn push_alt(&mut self, bytes: Vec<u8>) -> Result<(), ScriptError> {
        self.alt.push(bytes);
        self.check_size()
    }

    pub fn pop(&mut self) -> Result<Vec<u8>, ScriptError> {
        self.main.pop().ok_or(ScriptError::InvalidStackOperation)
    }

    pub fn pop_alt(&mut self) -> Result<Vec<u8>, ScriptError> {
        self.alt.pop().ok_or(ScriptError::InvalidAltStackOperation)
    }

    /// Fail unless at least `count` elements are present
    pub fn require(&self, count: usize) -> Result<(), ScriptError> {
        if self.main.len() < count {
            Err(ScriptError::InvalidStackOperation)
        } else {
            Ok(())
        }
    }

    pub fn top(&self, depth: usize) -> Result<&Vec<u8>, ScriptError> {
        let idx = self.index_of(depth)?;
        Ok(&self.main[idx])
    }

    pub fn remove(&mut self, depth: usize) -> Result<Vec<u8>, ScriptError> {
        let idx = self.index_of(depth)?;
        Ok(self.main.remove(idx))
    }

    /// Insert so that the new element ends up at `depth`
    pub fn insert(&mut self, depth: usize, bytes: Vec<u8>) -> Result<(), ScriptError> {
        if depth > self.main.len() {
            return Err(ScriptError::InvalidStackOperation);
        }
        let idx = self.main.len() - depth;
        self.main.insert(idx, bytes);
        self.check_size()
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), ScriptError> {
        let idx_a = self.index_of(a)?;
        let idx_b = self.index_of(b)?;
        self.main.swap(idx_a, idx_b);
        Ok(())
    }

    fn index_of(&self, depth: usize) -> Result<usize, ScriptError> {
        if depth >= self.main.len() {
            return Err(ScriptError::InvalidStackOperation);
        }
        Ok(self.main.len() - 1 - depth)
    }

    fn check_size(&self) -> Result<(), ScriptError> {
        if self.main.len() + self.alt.len() > MAX_STACK_SIZE {
            return Err(ScriptError::StackSize);
        }
        Ok(())
    }
}
