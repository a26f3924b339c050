//! Test Utilities Module
//!
//! In-memory [`LedgerClient`] with scripted submission outcomes plus fixtures that
//! install venue accounts in their real byte layouts.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::codec::{
    launchpad::LaunchpadStatus, launchpad::VestingSchedule, LaunchpadPool, PumpAmmPool,
    PumpBondingCurve, TokenAccount,
};
use crate::ledger::{Commitment, LedgerClient, LedgerError, SignatureState};
use crate::tx_builder::accounts::{self, launchpad, pump, pump_amm, WSOL_MINT};
use async_trait::async_trait;
use dashmap::DashMap;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// What happens to the next submitted transaction
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// Accepted and confirmed on the first status poll
    Confirm,
    /// Accepted, then fails on-chain with this error text
    FailOnChain(String),
    /// Accepted but never leaves `Pending`
    NeverConfirm,
    /// Rejected at submission
    Reject(LedgerError),
}

/// In-memory ledger. Clones share state.
#[derive(Clone, Default)]
pub struct MockLedger {
    accounts: Arc<DashMap<Pubkey, Account>>,
    /// Remaining transport failures per address
    failing_reads: Arc<DashMap<Pubkey, u32>>,
    /// Remaining blockhash fetch failures
    failing_blockhashes: Arc<AtomicUsize>,
    statuses: Arc<DashMap<Signature, SignatureState>>,
    outcomes: Arc<Mutex<VecDeque<SendOutcome>>>,
    sent: Arc<Mutex<Vec<VersionedTransaction>>>,
    account_reads: Arc<AtomicUsize>,
    program_searches: Arc<AtomicUsize>,
    status_polls: Arc<AtomicUsize>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.accounts.insert(
            address,
            Account {
                lamports: 1_000_000,
                data,
                owner,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    pub fn remove_account(&self, address: &Pubkey) {
        self.accounts.remove(address);
    }

    /// Makes the next `count` reads of `address` fail with a transport error
    pub fn fail_reads(&self, address: Pubkey, count: u32) {
        if count > 0 {
            self.failing_reads.insert(address, count);
        }
    }

    /// Makes the next `count` blockhash fetches fail
    pub fn fail_blockhashes(&self, count: usize) {
        self.failing_blockhashes.store(count, Ordering::SeqCst);
    }

    /// Queues outcomes for upcoming submissions; once empty every send confirms
    pub async fn push_outcomes(&self, outcomes: impl IntoIterator<Item = SendOutcome>) {
        self.outcomes.lock().await.extend(outcomes);
    }

    pub async fn sent_transactions(&self) -> Vec<VersionedTransaction> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub fn account_reads(&self) -> usize {
        self.account_reads.load(Ordering::SeqCst)
    }

    pub fn program_searches(&self) -> usize {
        self.program_searches.load(Ordering::SeqCst)
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    // Fixtures

    /// System-owned wallet holding `lamports`
    pub fn fund_wallet(&self, owner: &Pubkey, lamports: u64) {
        self.accounts.insert(
            *owner,
            Account {
                lamports,
                data: vec![],
                owner: solana_sdk::system_program::id(),
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    /// SPL mint account, so the token program resolves to classic SPL Token
    pub fn install_mint(&self, mint: &Pubkey) {
        self.set_account(*mint, accounts::token_program(), vec![0; 82]);
    }

    /// Token balance in `owner`'s ATA for `mint`
    pub fn fund_token(&self, owner: &Pubkey, mint: &Pubkey, amount: u64) {
        let ata = accounts::associated_token_address(owner, mint, &accounts::token_program());
        let data = TokenAccount {
            mint: *mint,
            owner: *owner,
            amount,
        }
        .encode();
        self.set_account(ata, accounts::token_program(), data);
    }

    /// pump.fun curve at launch reserves plus some trading
    pub fn install_pump_curve(&self, mint: &Pubkey, complete: bool) -> PumpBondingCurve {
        let curve = PumpBondingCurve {
            virtual_token_reserves: 1_000_000_000_000_000,
            virtual_sol_reserves: 35_000_000_000,
            real_token_reserves: 720_000_000_000_000,
            real_sol_reserves: 5_000_000_000,
            token_total_supply: 1_000_000_000_000_000,
            complete,
            creator: Pubkey::new_unique(),
        };
        self.set_account(pump::bonding_curve(mint), pump::PROGRAM_ID, curve.encode());
        curve
    }

    /// PumpSwap pool at the canonical address with funded vaults
    pub fn install_pump_amm_pool(&self, mint: &Pubkey, base_reserve: u64, quote_reserve: u64) -> Pubkey {
        let address = pump_amm::canonical_pool(mint);
        self.install_pump_amm_pool_at(address, mint, base_reserve, quote_reserve);
        address
    }

    /// PumpSwap pool at an arbitrary address, reachable only through the mint search
    pub fn install_pump_amm_pool_at(&self, address: Pubkey, mint: &Pubkey, base_reserve: u64, quote_reserve: u64) {
        let pool = PumpAmmPool {
            pool_bump: 255,
            index: pump_amm::CANONICAL_POOL_INDEX,
            creator: pump::pool_authority(mint),
            base_mint: *mint,
            quote_mint: WSOL_MINT,
            lp_mint: Pubkey::new_unique(),
            pool_base_token_account: Pubkey::new_unique(),
            pool_quote_token_account: Pubkey::new_unique(),
            lp_supply: 4_193_388_358_552,
            coin_creator: Pubkey::new_unique(),
        };
        self.set_vault(&pool.pool_base_token_account, mint, &address, base_reserve);
        self.set_vault(&pool.pool_quote_token_account, &WSOL_MINT, &address, quote_reserve);
        self.set_account(address, pump_amm::PROGRAM_ID, pool.encode());
    }

    /// LaunchLab pool for `mint` quoted in WSOL
    pub fn install_launchpad_pool(&self, mint: &Pubkey, status: LaunchpadStatus) -> Pubkey {
        let address = launchpad::pool(mint, &WSOL_MINT);
        let pool = LaunchpadPool {
            epoch: 800,
            auth_bump: 254,
            status,
            base_decimals: 6,
            quote_decimals: 9,
            migrate_type: 1,
            supply: 1_000_000_000_000_000,
            total_base_sell: 793_100_000_000_000,
            virtual_base: 1_073_025_605_596_382,
            virtual_quote: 30_000_852_951,
            real_base: 100_000_000_000_000,
            real_quote: 4_000_000_000,
            total_quote_fund_raising: 85_000_000_000,
            quote_protocol_fee: 0,
            platform_fee: 0,
            migrate_fee: 0,
            vesting: VestingSchedule::default(),
            global_config: Pubkey::new_unique(),
            platform_config: Pubkey::new_unique(),
            base_mint: *mint,
            quote_mint: WSOL_MINT,
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            creator: Pubkey::new_unique(),
        };
        self.set_account(address, launchpad::PROGRAM_ID, pool.encode());
        address
    }

    fn set_vault(&self, address: &Pubkey, mint: &Pubkey, owner: &Pubkey, amount: u64) {
        let data = TokenAccount {
            mint: *mint,
            owner: *owner,
            amount,
        }
        .encode();
        self.set_account(*address, accounts::token_program(), data);
    }

    fn take_read_failure(&self, address: &Pubkey) -> bool {
        let mut failed = false;
        self.failing_reads.remove_if_mut(address, |_, remaining| {
            failed = true;
            *remaining -= 1;
            *remaining == 0
        });
        failed
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_account(&self, address: &Pubkey, _commitment: Commitment) -> Result<Option<Account>, LedgerError> {
        self.account_reads.fetch_add(1, Ordering::SeqCst);
        if self.take_read_failure(address) {
            return Err(LedgerError::Transport {
                endpoint: "mock".to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(self.accounts.get(address).map(|a| a.value().clone()))
    }

    async fn find_program_accounts(
        &self,
        program: &Pubkey,
        offset: usize,
        bytes: &[u8],
    ) -> Result<Vec<(Pubkey, Account)>, LedgerError> {
        self.program_searches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .accounts
            .iter()
            .filter(|entry| {
                entry.owner == *program && entry.data.get(offset..offset + bytes.len()) == Some(bytes)
            })
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect())
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, LedgerError> {
        let outcome = self.outcomes.lock().await.pop_front().unwrap_or(SendOutcome::Confirm);
        let signature = tx.signatures.first().copied().unwrap_or_default();

        let state = match outcome {
            SendOutcome::Reject(err) => return Err(err),
            SendOutcome::Confirm => SignatureState::Confirmed,
            SendOutcome::FailOnChain(message) => SignatureState::Failed(message),
            SendOutcome::NeverConfirm => SignatureState::Pending,
        };
        self.sent.lock().await.push(tx.clone());
        self.statuses.insert(signature, state);
        Ok(signature)
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<SignatureState, LedgerError> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .statuses
            .get(signature)
            .map(|s| s.value().clone())
            .unwrap_or(SignatureState::Pending))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        let failing = self
            .failing_blockhashes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LedgerError::BlockhashNotFound {
                endpoint: "mock".to_string(),
            });
        }
        Ok(Hash::new_unique())
    }
}
