//! Numeric operand stack
//!
//! The shared execution context of one evaluation pass. The stack grows on
//! demand; underflow is reported by the operators, never absorbed by
//! resizing, and a failed pop leaves the contents untouched.

/// Operand stack of double-precision values
#[derive(Debug, Default, Clone)]
pub struct Stack {
    values: Vec<f64>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operands currently held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clear all operands for a fresh pass
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Push one operand
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Most recently pushed operand, if any
    pub fn top(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// All operands, bottom first
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn pop(&mut self) -> Option<f64> {
        self.values.pop()
    }

    /// Pop two operands, returned bottom-first
    pub(crate) fn pop2(&mut self) -> Option<(f64, f64)> {
        if self.values.len() < 2 {
            return None;
        }
        let b = self.values.pop()?;
        let a = self.values.pop()?;
        Some((a, b))
    }

    /// Pop three operands, returned bottom-first
    pub(crate) fn pop3(&mut self) -> Option<(f64, f64, f64)> {
        if self.values.len() < 3 {
            return None;
        }
        let c = self.values.pop()?;
        let b = self.values.pop()?;
        let a = self.values.pop()?;
        Some((a, b, c))
    }
}
