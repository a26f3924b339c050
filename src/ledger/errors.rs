use solana_client::client_error::ClientError;
use thiserror::Error;

/// Errors surfaced by the ledger boundary
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// RPC response errors (from the RPC server)
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimitExceeded { endpoint: String },

    #[error("Blockhash not found (endpoint: {endpoint})")]
    BlockhashNotFound { endpoint: String },

    #[error("Transaction expired (endpoint: {endpoint})")]
    TransactionExpired { endpoint: String },

    #[error("Insufficient funds (endpoint: {endpoint})")]
    InsufficientFunds { endpoint: String },

    /// Simulation or preflight rejected the transaction with program logs
    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

impl LedgerError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Transport { .. } => true,
            LedgerError::Timeout { .. } => true,
            LedgerError::RateLimitExceeded { .. } => true,
            LedgerError::BlockhashNotFound { .. } => true,
            LedgerError::TransactionExpired { .. } => true,

            LedgerError::InsufficientFunds { .. } => false,
            LedgerError::Rejected(_) => false,

            // Retry on server errors (5xx)
            LedgerError::RpcResponse { code, .. } => {
                matches!(code, Some(c) if (500..600).contains(c))
            }
        }
    }

    /// Short label for logs and metrics
    pub fn category(&self) -> &'static str {
        match self {
            LedgerError::Transport { .. } => "transport",
            LedgerError::Timeout { .. } => "timeout",
            LedgerError::RpcResponse { .. } => "rpc_response",
            LedgerError::RateLimitExceeded { .. } => "rate_limit",
            LedgerError::BlockhashNotFound { .. } => "blockhash",
            LedgerError::TransactionExpired { .. } => "expired",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::Rejected(_) => "rejected",
        }
    }

    /// Classifies a client error by its message
    pub fn from_client_error(err: ClientError, endpoint: &str) -> Self {
        Self::classify(&err.to_string(), endpoint)
    }

    pub(crate) fn classify(message: &str, endpoint: &str) -> Self {
        let err_str = message.to_lowercase();
        let endpoint = endpoint.to_string();

        if err_str.contains("blockhash not found") {
            LedgerError::BlockhashNotFound { endpoint }
        } else if err_str.contains("transaction expired")
            || err_str.contains("block height exceeded")
        {
            LedgerError::TransactionExpired { endpoint }
        } else if err_str.contains("insufficient funds")
            || err_str.contains("insufficient lamports")
        {
            LedgerError::InsufficientFunds { endpoint }
        } else if err_str.contains("rate limit")
            || err_str.contains("too many requests")
            || is_throttle_status(&err_str)
        {
            LedgerError::RateLimitExceeded { endpoint }
        } else if err_str.contains("timeout") || err_str.contains("timed out") {
            LedgerError::Timeout {
                endpoint,
                timeout_ms: 5000,
            }
        } else if err_str.contains("custom program error")
            || err_str.contains("transaction simulation failed")
        {
            LedgerError::Rejected(message.to_string())
        } else if err_str.contains("connection") || err_str.contains("dns error") {
            LedgerError::Transport {
                endpoint,
                message: message.to_string(),
            }
        } else {
            // Extract error code if available
            let code = err_str
                .split("code:")
                .nth(1)
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.trim_end_matches(',').parse::<i64>().ok());

            LedgerError::RpcResponse {
                endpoint,
                message: message.to_string(),
                code,
            }
        }
    }
}

/// HTTP or JSON-RPC status 429, not any number that happens to contain the digits
fn is_throttle_status(lower: &str) -> bool {
    lower.match_indices("429").any(|(i, _)| {
        let before = lower[..i].trim_end();
        let next = lower[i + 3..].chars().next();
        !next.is_some_and(|c| c.is_ascii_digit())
            && (before.ends_with("status") || before.ends_with("code:") || before.ends_with('('))
    })
}

/// Retry policy for ledger reads
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    pub base_delay_ms: u64,

    pub max_delay_ms: u64,

    /// Jitter factor (0.0 - 1.0)
    pub jitter_factor: f64,

    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 1000,
            jitter_factor: 0.1,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-based), `None` once attempts are used up
    pub fn calculate_delay(&self, attempt: u32) -> Option<std::time::Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }

        let delay_ms = self.base_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        let delay_ms = delay_ms.min(self.max_delay_ms as f64);

        // Add jitter to prevent thundering herd
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * self.jitter_factor;
        let jittered_delay = (delay_ms * (1.0 + jitter)).max(0.0) as u64;

        Some(std::time::Duration::from_millis(jittered_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(LedgerError::Transport {
            endpoint: "test".to_string(),
            message: "connection failed".to_string(),
        }
        .is_retryable());

        assert!(LedgerError::Timeout {
            endpoint: "test".to_string(),
            timeout_ms: 5000,
        }
        .is_retryable());

        assert!(!LedgerError::InsufficientFunds {
            endpoint: "test".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_classify_messages() {
        assert!(matches!(
            LedgerError::classify("HTTP status 429 Too Many Requests", "e"),
            LedgerError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            LedgerError::classify("Blockhash not found", "e"),
            LedgerError::BlockhashNotFound { .. }
        ));
        assert!(matches!(
            LedgerError::classify(
                "Transaction simulation failed: Error processing Instruction 2: custom program error: 0x1772",
                "e"
            ),
            LedgerError::Rejected(_)
        ));
        assert!(matches!(
            LedgerError::classify("HTTP status client error (429 Too Many Requests) for url (https://rpc)", "e"),
            LedgerError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            LedgerError::classify("RPC response error -32602: code: 429, message: busy", "e"),
            LedgerError::RateLimitExceeded { .. }
        ));
        // Numbers that merely contain 429 are not throttling
        assert!(matches!(
            LedgerError::classify("Minimum context slot 284290 has not been reached", "e"),
            LedgerError::RpcResponse { .. }
        ));
        assert!(matches!(
            LedgerError::classify("Account has 14290 lamports, need 5000000", "e"),
            LedgerError::RpcResponse { .. }
        ));
        assert!(matches!(
            LedgerError::classify("server error code: 4291", "e"),
            LedgerError::RpcResponse { .. }
        ));
        match LedgerError::classify("server said code: 503 unavailable", "e") {
            LedgerError::RpcResponse { code, .. } => assert_eq!(code, Some(503)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_retry_policy_delay() {
        let policy = RetryPolicy::default();

        let delay1 = policy.calculate_delay(0);
        assert!(delay1.is_some());

        let delay2 = policy.calculate_delay(1);
        assert!(delay2.is_some());
        assert!(delay2.unwrap() >= delay1.unwrap());

        // third attempt is the last one
        assert!(policy.calculate_delay(2).is_none());
    }
}
