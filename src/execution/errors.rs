use crate::aggregator::AggregatorError;
use crate::codec::DecodeError;
use crate::discovery::DiscoveryError;
use crate::ledger::LedgerError;
use crate::quote::QuoteError;
use crate::tx_builder::TransactionBuilderError;
use crate::types::Venue;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

const SLIPPAGE_MARKERS: [&str; 4] = [
    "slippage",
    "toomuchsolrequired",
    "toolittlesolreceived",
    "exceededslippage",
];

const CLOSED_MARKERS: [&str; 1] = ["bondingcurvecomplete"];

/// Program error codes that mean the minimum-output bound was missed
fn slippage_codes(venue: Venue) -> &'static [u32] {
    match venue {
        // TooMuchSolRequired, TooLittleSolReceived
        Venue::PumpCurve => &[6002, 6003],
        // ExceededSlippage
        Venue::PumpAmm => &[6004],
        // SlippageToleranceExceeded
        Venue::Aggregator => &[6001],
        Venue::LaunchpadCurve => &[],
    }
}

/// Program error codes that mean the venue no longer trades the token
fn closed_codes(venue: Venue) -> &'static [u32] {
    match venue {
        // BondingCurveComplete
        Venue::PumpCurve => &[6005],
        _ => &[],
    }
}

fn has_code(lower: &str, codes: &[u32]) -> bool {
    codes.iter().any(|code| {
        lower.contains(&format!("custom({})", code)) || lower.contains(&format!("custom program error: {:#x}", code))
    })
}

/// Terminal error kind reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DecodeError,
    VenueNotFound,
    VenueUnavailable,
    InvalidState,
    ZeroOutput,
    InsufficientBalance,
    SlippageExceeded,
    RateLimited,
    TransactionFailed,
    Timeout,
    BuildFailed,
    DeadlineExceeded,
}

/// What the controller does after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Re-quote on the same venue if its budget allows
    Retry,
    /// Skip the rest of this venue's budget
    Fallback,
    /// Stop the order
    Abort,
}

#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("No venue found for {0}")]
    VenueNotFound(Pubkey),

    #[error("Venue {venue} unavailable: {reason}")]
    VenueUnavailable { venue: Venue, reason: String },

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("Slippage exceeded: {0}")]
    SlippageExceeded(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("No confirmation for {signature} within {timeout_ms}ms")]
    Timeout { signature: String, timeout_ms: u64 },

    #[error(transparent)]
    Build(#[from] TransactionBuilderError),

    #[error(transparent)]
    Ledger(LedgerError),

    #[error(transparent)]
    Aggregator(AggregatorError),

    #[error("Deadline passed before the next attempt")]
    DeadlineExceeded,
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::Decode(_) => ErrorKind::DecodeError,
            ExecutionError::VenueNotFound(_) => ErrorKind::VenueNotFound,
            ExecutionError::VenueUnavailable { .. } => ErrorKind::VenueUnavailable,
            ExecutionError::Quote(QuoteError::InvalidState(_)) => ErrorKind::InvalidState,
            ExecutionError::Quote(QuoteError::ZeroOutput) => ErrorKind::ZeroOutput,
            ExecutionError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            ExecutionError::SlippageExceeded(_) => ErrorKind::SlippageExceeded,
            ExecutionError::RateLimited(_) => ErrorKind::RateLimited,
            ExecutionError::TransactionFailed(_) => ErrorKind::TransactionFailed,
            ExecutionError::Timeout { .. } => ErrorKind::Timeout,
            ExecutionError::Build(_) => ErrorKind::BuildFailed,
            ExecutionError::Ledger(LedgerError::InsufficientFunds { .. }) => ErrorKind::InsufficientBalance,
            ExecutionError::Ledger(LedgerError::Timeout { .. }) => ErrorKind::Timeout,
            ExecutionError::Ledger(_) => ErrorKind::TransactionFailed,
            ExecutionError::Aggregator(AggregatorError::Http { status: 429, .. }) => ErrorKind::RateLimited,
            ExecutionError::Aggregator(AggregatorError::NoRoute(_)) => ErrorKind::VenueUnavailable,
            ExecutionError::Aggregator(_) => ErrorKind::TransactionFailed,
            ExecutionError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            ExecutionError::SlippageExceeded(_)
            | ExecutionError::RateLimited(_)
            | ExecutionError::TransactionFailed(_)
            | ExecutionError::Timeout { .. } => Disposition::Retry,

            ExecutionError::Ledger(LedgerError::InsufficientFunds { .. }) => Disposition::Abort,
            ExecutionError::Ledger(_) => Disposition::Retry,

            ExecutionError::Build(e) if e.is_retryable() => Disposition::Retry,
            ExecutionError::Aggregator(e) if e.is_retryable() => Disposition::Retry,
            ExecutionError::Aggregator(_) => Disposition::Fallback,
            ExecutionError::VenueUnavailable { .. } => Disposition::Fallback,

            ExecutionError::Decode(_)
            | ExecutionError::VenueNotFound(_)
            | ExecutionError::Quote(_)
            | ExecutionError::InsufficientBalance { .. }
            | ExecutionError::Build(_)
            | ExecutionError::DeadlineExceeded => Disposition::Abort,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.disposition() == Disposition::Retry
    }

    /// Maps a submission failure; preflight rejections are read against `venue`'s program errors
    pub fn from_submission(venue: Venue, err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(message) => classify_program_error(venue, &message),
            other => other.into(),
        }
    }
}

impl From<DiscoveryError> for ExecutionError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::VenueNotFound { mint } => ExecutionError::VenueNotFound(mint),
            DiscoveryError::StateUnavailable { venue, reason, .. } => {
                ExecutionError::VenueUnavailable { venue, reason }
            }
            DiscoveryError::NoOnChainState(venue) => ExecutionError::VenueUnavailable {
                venue,
                reason: "no on-chain state".to_string(),
            },
            DiscoveryError::Decode(e) => ExecutionError::Decode(e),
            DiscoveryError::Ledger(e) => e.into(),
        }
    }
}

impl From<LedgerError> for ExecutionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(message) => ExecutionError::TransactionFailed(message),
            LedgerError::RateLimitExceeded { endpoint } => ExecutionError::RateLimited(endpoint),
            other => ExecutionError::Ledger(other),
        }
    }
}

impl From<AggregatorError> for ExecutionError {
    fn from(err: AggregatorError) -> Self {
        match err {
            AggregatorError::Http { status: 429, endpoint, .. } => {
                ExecutionError::RateLimited(format!("aggregator {}", endpoint))
            }
            other => ExecutionError::Aggregator(other),
        }
    }
}

/// Classifies an on-chain failure on `venue` from its error text or program logs.
///
/// Custom error codes are program specific, so the same number can mean slippage on one
/// venue and something unrelated on another.
pub fn classify_program_error(venue: Venue, message: &str) -> ExecutionError {
    let lower = message.to_lowercase();

    if has_code(&lower, slippage_codes(venue)) || SLIPPAGE_MARKERS.iter().any(|m| lower.contains(m)) {
        ExecutionError::SlippageExceeded(message.to_string())
    } else if has_code(&lower, closed_codes(venue)) || CLOSED_MARKERS.iter().any(|m| lower.contains(m)) {
        ExecutionError::VenueUnavailable {
            venue,
            reason: message.to_string(),
        }
    } else if lower.contains("insufficient lamports") || lower.contains("insufficient funds") {
        ExecutionError::Ledger(LedgerError::InsufficientFunds {
            endpoint: "on-chain".to_string(),
        })
    } else {
        ExecutionError::TransactionFailed(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_error_codes() {
        let err = classify_program_error(Venue::PumpCurve, "InstructionError(3, Custom(6002))");
        assert_eq!(err.kind(), ErrorKind::SlippageExceeded);

        let err = classify_program_error(
            Venue::PumpAmm,
            "Transaction simulation failed: Error processing Instruction 4: custom program error: 0x1774",
        );
        assert_eq!(err.kind(), ErrorKind::SlippageExceeded);

        let err = classify_program_error(Venue::Aggregator, "custom program error: 0x1771");
        assert_eq!(err.kind(), ErrorKind::SlippageExceeded);

        let err = classify_program_error(Venue::PumpCurve, "InstructionError(2, Custom(6020))");
        assert_eq!(err.kind(), ErrorKind::TransactionFailed);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_codes_are_read_per_program() {
        // 6004 is MintDoesNotMatchBondingCurve on the curve program
        let err = classify_program_error(Venue::PumpCurve, "InstructionError(3, Custom(6004))");
        assert_eq!(err.kind(), ErrorKind::TransactionFailed);

        let err = classify_program_error(Venue::PumpAmm, "InstructionError(3, Custom(6002))");
        assert_eq!(err.kind(), ErrorKind::TransactionFailed);
    }

    #[test]
    fn test_completed_curve_falls_back() {
        let err = classify_program_error(Venue::PumpCurve, "InstructionError(3, Custom(6005))");
        assert_eq!(err.kind(), ErrorKind::VenueUnavailable);
        assert_eq!(err.disposition(), Disposition::Fallback);

        let err = classify_program_error(
            Venue::PumpCurve,
            "Program log: AnchorError occurred. Error Code: BondingCurveComplete.",
        );
        assert_eq!(err.disposition(), Disposition::Fallback);

        let err = classify_program_error(Venue::PumpAmm, "InstructionError(3, Custom(6005))");
        assert_eq!(err.kind(), ErrorKind::TransactionFailed);
    }

    #[test]
    fn test_rejected_submission_uses_venue_codes() {
        let rejected = || LedgerError::Rejected("custom program error: 0x1772".to_string());
        assert_eq!(
            ExecutionError::from_submission(Venue::PumpCurve, rejected()).kind(),
            ErrorKind::SlippageExceeded
        );
        assert_eq!(
            ExecutionError::from_submission(Venue::PumpAmm, rejected()).kind(),
            ErrorKind::TransactionFailed
        );
        assert_eq!(
            ExecutionError::from_submission(
                Venue::PumpAmm,
                LedgerError::RateLimitExceeded {
                    endpoint: "rpc".to_string()
                }
            )
            .kind(),
            ErrorKind::RateLimited
        );
    }

    #[test]
    fn test_blockhash_failure_retries() {
        let err: ExecutionError = TransactionBuilderError::blockhash_unavailable("node behind").into();
        assert_eq!(err.kind(), ErrorKind::BuildFailed);
        assert_eq!(err.disposition(), Disposition::Retry);

        let err: ExecutionError = TransactionBuilderError::invalid_order("trade before setup").into();
        assert_eq!(err.disposition(), Disposition::Abort);
    }

    #[test]
    fn test_classify_log_text() {
        let err = classify_program_error(
            Venue::LaunchpadCurve,
            "Program log: AnchorError occurred. Error Code: TooLittleSolReceived.",
        );
        assert_eq!(err.kind(), ErrorKind::SlippageExceeded);

        let err = classify_program_error(Venue::PumpCurve, "Transfer: insufficient lamports 10, need 20");
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(err.disposition(), Disposition::Abort);
    }

    #[test]
    fn test_non_retryable_kinds_abort() {
        let cases = [
            ExecutionError::VenueNotFound(Pubkey::new_unique()),
            ExecutionError::InsufficientBalance { required: 2, available: 1 },
            ExecutionError::Quote(QuoteError::ZeroOutput),
            ExecutionError::Decode(DecodeError::short_buffer("pool", 10, 3)),
            ExecutionError::DeadlineExceeded,
        ];
        for err in cases {
            assert_eq!(err.disposition(), Disposition::Abort, "{}", err);
        }
    }

    #[test]
    fn test_discovery_errors_map_to_kinds() {
        let mint = Pubkey::new_unique();
        let err: ExecutionError = DiscoveryError::VenueNotFound { mint }.into();
        assert_eq!(err.kind(), ErrorKind::VenueNotFound);

        let err: ExecutionError = DiscoveryError::StateUnavailable {
            venue: Venue::PumpCurve,
            mint,
            reason: "bonding curve complete".to_string(),
        }
        .into();
        assert_eq!(err.disposition(), Disposition::Fallback);

        let err: ExecutionError = DiscoveryError::Ledger(LedgerError::RateLimitExceeded {
            endpoint: "rpc".to_string(),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn test_aggregator_errors() {
        let err: ExecutionError = AggregatorError::NoRoute("none".to_string()).into();
        assert_eq!(err.disposition(), Disposition::Fallback);

        let err: ExecutionError = AggregatorError::Http {
            endpoint: "quote",
            status: 429,
            body: String::new(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_retryable());
    }
}
