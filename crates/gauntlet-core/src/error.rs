//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// Every variant is fatal to the call that produced it. Callers decide
/// whether and when to try again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The requested transition is not permitted from the current state.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Rules, tables or dice definitions are malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A complication roll fell outside the table's die.
    #[error("complication roll {roll} is outside 1..={faces}")]
    InvalidComplicationRoll {
        /// The offending roll.
        roll: u32,
        /// Number of faces on the table's die.
        faces: u32,
    },
}

impl DomainError {
    /// Shorthand for a [`DomainError::Precondition`].
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Shorthand for a [`DomainError::InvalidConfiguration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_display() {
        let err = DomainError::precondition("procedure is Succeeded");
        assert_eq!(err.to_string(), "precondition failed: procedure is Succeeded");
    }

    #[test]
    fn test_invalid_complication_roll_display() {
        let err = DomainError::InvalidComplicationRoll { roll: 11, faces: 10 };
        assert_eq!(err.to_string(), "complication roll 11 is outside 1..=10");
    }
}
