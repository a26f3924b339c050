//! Ledger boundary
//!
//! The engine needs exactly five ledger operations. They are modelled as the
//! [`LedgerClient`] trait so discovery and execution can run against the live RPC
//! ([`SolanaLedger`]) or an in-memory double in tests.

pub mod client;
pub mod errors;
pub mod rate_limit;

pub use client::SolanaLedger;
pub use errors::{LedgerError, RetryPolicy};
pub use rate_limit::RequestBudget;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::VersionedTransaction,
};

/// Read-consistency level, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub const ASCENDING: [Commitment; 3] = [
        Commitment::Processed,
        Commitment::Confirmed,
        Commitment::Finalized,
    ];

    pub fn as_config(&self) -> CommitmentConfig {
        match self {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// Status of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Unknown to the cluster or below the confirmed level
    Pending,
    Confirmed,
    Finalized,
    /// Landed with an on-chain error
    Failed(String),
}

impl SignatureState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignatureState::Pending)
    }
}

/// Async ledger client consumed by discovery and execution
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch an account; `Ok(None)` when it does not exist
    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: Commitment,
    ) -> Result<Option<Account>, LedgerError>;

    /// Accounts owned by `program` whose data at `offset` equals `bytes`
    async fn find_program_accounts(
        &self,
        program: &Pubkey,
        offset: usize,
        bytes: &[u8],
    ) -> Result<Vec<(Pubkey, Account)>, LedgerError>;

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, LedgerError>;

    async fn get_signature_status(&self, signature: &Signature) -> Result<SignatureState, LedgerError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError>;
}
