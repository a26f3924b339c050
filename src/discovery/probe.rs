//! Account probes used by discovery
//!
//! A probe reads one account at the three commitment levels concurrently and keeps the
//! first response that decodes. Losing reads are dropped; they are side-effect free.

use crate::ledger::{Commitment, LedgerClient, LedgerError, RetryPolicy};
use futures::stream::{FuturesUnordered, StreamExt};
use solana_sdk::{account::Account, pubkey::Pubkey};
use std::future::Future;
use tracing::{debug, trace, warn};

/// Result of probing one address
#[derive(Debug)]
pub enum ProbeOutcome<T> {
    /// Some commitment level returned an account that decoded
    Found(T),
    /// The account is missing, owned by another program or does not decode
    Absent,
    /// Every read failed
    Failed(LedgerError),
}

impl<T> ProbeOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            ProbeOutcome::Found(v) => Some(v),
            _ => None,
        }
    }
}

/// Races reads of `address` at every commitment level and returns the first that
/// decodes. Accounts not owned by `owner` are ignored.
pub async fn race_decode<T, F>(
    ledger: &dyn LedgerClient,
    address: &Pubkey,
    owner: &Pubkey,
    decode: F,
) -> ProbeOutcome<T>
where
    F: Fn(&Account) -> Option<T>,
{
    let mut reads: FuturesUnordered<_> = Commitment::ASCENDING
        .into_iter()
        .map(|commitment| async move { (commitment, ledger.get_account(address, commitment).await) })
        .collect();

    let mut responded = false;
    let mut last_error = None;

    while let Some((commitment, result)) = reads.next().await {
        match result {
            Ok(Some(account)) => {
                responded = true;
                if account.owner != *owner {
                    trace!(address = %address, owner = %account.owner, "Probe owner mismatch");
                    continue;
                }
                if let Some(decoded) = decode(&account) {
                    debug!(address = %address, ?commitment, "Probe decoded");
                    return ProbeOutcome::Found(decoded);
                }
            }
            Ok(None) => responded = true,
            Err(e) => {
                trace!(address = %address, ?commitment, error = %e, "Probe read failed");
                last_error = Some(e);
            }
        }
    }

    match (responded, last_error) {
        (false, Some(e)) => ProbeOutcome::Failed(e),
        _ => ProbeOutcome::Absent,
    }
}

/// Repeats a probe while it fails with a retryable error
pub async fn probe_with_retry<T, F, Fut>(
    probe_name: &str,
    policy: &RetryPolicy,
    mut probe: F,
) -> ProbeOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeOutcome<T>>,
{
    let mut attempt = 0;
    loop {
        match probe().await {
            ProbeOutcome::Failed(err) if err.is_retryable() => {
                match policy.calculate_delay(attempt) {
                    Some(backoff) => {
                        debug!(
                            probe = probe_name,
                            attempt = attempt + 1,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %err,
                            "Transient probe failure, backing off"
                        );
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                    }
                    None => {
                        warn!(probe = probe_name, error = %err, "Probe failed after retries");
                        return ProbeOutcome::Failed(err);
                    }
                }
            }
            outcome => return outcome,
        }
    }
}

/// Same as [`probe_with_retry`] for a plain ledger call
pub async fn call_with_retry<T, F, Fut>(
    call_name: &str,
    policy: &RetryPolicy,
    mut call: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Err(err) if err.is_retryable() => match policy.calculate_delay(attempt) {
                Some(backoff) => {
                    debug!(call = call_name, attempt = attempt + 1, error = %err, "Retrying ledger call");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                None => return Err(err),
            },
            result => return result,
        }
    }
}
