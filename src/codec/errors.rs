//! Error types for on-chain account decoding

use thiserror::Error;

/// Failure to interpret raw account bytes as a venue layout.
///
/// Decode errors are never retried: the bytes were fetched successfully, they just do not
/// describe the account we expected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer shorter than the fixed layout or leading discriminator mismatch
    #[error("Bad layout for {account}: {reason}")]
    BadLayout {
        account: &'static str,
        reason: String,
    },

    /// A field holds a value the target type cannot represent
    #[error("Field {field} of {account} out of range: {value}")]
    ValueOutOfRange {
        account: &'static str,
        field: &'static str,
        value: u64,
    },
}

impl DecodeError {
    pub fn short_buffer(account: &'static str, expected: usize, actual: usize) -> Self {
        Self::BadLayout {
            account,
            reason: format!("expected at least {} bytes, got {}", expected, actual),
        }
    }

    pub fn discriminator_mismatch(account: &'static str, actual: &[u8]) -> Self {
        Self::BadLayout {
            account,
            reason: format!("discriminator mismatch: {:?}", actual),
        }
    }

    pub fn account(&self) -> &'static str {
        match self {
            Self::BadLayout { account, .. } => account,
            Self::ValueOutOfRange { account, .. } => account,
        }
    }
}
