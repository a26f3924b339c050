//! Error types for the transaction builder
//!
//! Builder errors are almost always programming or state errors: wrong accounts or a
//! message that does not compile. Only blockhash failures are worth retrying.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TransactionBuilderError {
    /// Failed to build an instruction for a specific program
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild {
        /// The program the instruction targets
        program: String,
        reason: String,
    },

    /// v0 message compilation failed
    #[error("Message compile error: {0}")]
    Compile(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Blockhash error: {0}")]
    Blockhash(String),

    /// Compute budget instructions must lead, trade follows setup
    #[error("Invalid instruction order: {0}")]
    InvalidInstructionOrder(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TransactionBuilderError {
    /// Returns `true` if retrying the operation might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Blockhash(_) => true,

            Self::InstructionBuild { .. } => false,
            Self::Compile(_) => false,
            Self::Signing(_) => false,
            Self::InvalidInstructionOrder(_) => false,
            Self::Configuration(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InstructionBuild { .. } => "instruction",
            Self::Compile(_) => "compile",
            Self::Signing(_) => "signing",
            Self::Blockhash(_) => "blockhash",
            Self::InvalidInstructionOrder(_) => "validation",
            Self::Configuration(_) => "config",
        }
    }
}

// Convenience constructors for common error scenarios
impl TransactionBuilderError {
    pub fn instruction_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.into(),
        }
    }

    pub fn blockhash_unavailable(reason: impl Into<String>) -> Self {
        Self::Blockhash(reason.into())
    }

    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidInstructionOrder(reason.into())
    }
}
