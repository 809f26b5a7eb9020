//! Engine error types

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, RpnError>;

/// Rule engine errors
///
/// Compile-time failures reject the whole formula; run-time failures abort
/// only the current evaluation pass. Neither is ever fatal to the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpnError {
    /// Token not recognized as a literal, reference or operator keyword
    #[error("unknown token '{token}'")]
    UnknownToken { token: String },

    /// Operator invoked with fewer operands than it consumes
    #[error("stack underflow at '{op}' (node {position})")]
    StackUnderflow { op: &'static str, position: usize },
}

impl RpnError {
    pub fn unknown_token(token: impl Into<String>) -> Self {
        Self::UnknownToken {
            token: token.into(),
        }
    }

    pub fn underflow(op: &'static str, position: usize) -> Self {
        Self::StackUnderflow { op, position }
    }
}
