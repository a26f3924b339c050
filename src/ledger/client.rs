//! Ledger client over the Solana JSON-RPC nonblocking client

use super::{Commitment, LedgerClient, LedgerError, SignatureState};
use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig,
};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::VersionedTransaction,
};
use solana_transaction_status::TransactionConfirmationStatus;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct SolanaLedger {
    rpc: Arc<RpcClient>,
    endpoint: String,
    skip_preflight: bool,
}

impl std::fmt::Debug for SolanaLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaLedger")
            .field("endpoint", &self.endpoint)
            .field("skip_preflight", &self.skip_preflight)
            .finish()
    }
}

impl SolanaLedger {
    pub fn new(endpoint: &str, timeout: Duration, skip_preflight: bool) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            endpoint.to_string(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self {
            rpc: Arc::new(rpc),
            endpoint: endpoint.to_string(),
            skip_preflight,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_err(&self, err: solana_client::client_error::ClientError) -> LedgerError {
        LedgerError::from_client_error(err, &self.endpoint)
    }
}

#[async_trait]
impl LedgerClient for SolanaLedger {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: Commitment,
    ) -> Result<Option<Account>, LedgerError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, commitment.as_config())
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(response.value)
    }

    #[instrument(skip(self, bytes), fields(endpoint = %self.endpoint))]
    async fn find_program_accounts(
        &self,
        program: &Pubkey,
        offset: usize,
        bytes: &[u8],
    ) -> Result<Vec<(Pubkey, Account)>, LedgerError> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                offset,
                bytes.to_vec(),
            ))]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(CommitmentConfig::confirmed()),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(program, config)
            .await
            .map_err(|e| self.map_err(e))?;
        debug!(count = accounts.len(), "Program account search complete");
        Ok(accounts)
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: self.skip_preflight,
            max_retries: Some(0),
            ..Default::default()
        };
        self.rpc
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<SignatureState, LedgerError> {
        let response = self
            .rpc
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| self.map_err(e))?;

        let Some(Some(status)) = response.value.into_iter().next() else {
            return Ok(SignatureState::Pending);
        };

        if let Some(err) = status.err {
            return Ok(SignatureState::Failed(err.to_string()));
        }

        Ok(match status.confirmation_status {
            Some(TransactionConfirmationStatus::Finalized) => SignatureState::Finalized,
            Some(TransactionConfirmationStatus::Confirmed) => SignatureState::Confirmed,
            _ => SignatureState::Pending,
        })
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| self.map_err(e))
    }
}
