//! Venue discovery
//!
//! Resolves which venue currently holds tradable liquidity for a token and loads fresh
//! venue state for quoting.
//!
//! ## Probe order
//! 1. pump.fun bonding curve (active → `PumpCurve`; complete → AMM probes)
//! 2. LaunchLab pool PDA (owned by LaunchLab, trading → `LaunchpadCurve`)
//! 3. PumpSwap canonical pool PDA, then a memcmp search on the pool's base mint
//! 4. `Aggregator` when enabled, otherwise [`DiscoveryError::VenueNotFound`]
//!
//! A probe that keeps failing on the network degrades to the next candidate; it never
//! aborts discovery.

pub mod cache;
pub mod probe;

pub use cache::{CacheEntry, CacheStats, VenueCache};
pub use probe::ProbeOutcome;

use crate::codec::{
    pump_amm::BASE_MINT_OFFSET, DecodeError, LaunchpadPool, PoolState, PumpAmmPool,
    PumpBondingCurve, TokenAccount,
};
use crate::ledger::{Commitment, LedgerClient, LedgerError, RetryPolicy};
use crate::metrics::{metrics, Timer};
use crate::tx_builder::accounts::{self, launchpad, pump, pump_amm, TOKEN_2022_PROGRAM_ID, WSOL_MINT};
use crate::tx_builder::{LaunchpadAccounts, PumpAmmAccounts, PumpCurveAccounts, VenueAccounts};
use crate::types::Venue;
use probe::{call_with_retry, probe_with_retry, race_decode};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug, Clone)]
pub enum DiscoveryError {
    /// Every candidate was ruled out and the aggregator is disabled
    #[error("No venue found for {mint}")]
    VenueNotFound { mint: Pubkey },

    /// The venue resolved earlier no longer has tradable state (migrated, closed)
    #[error("Venue {venue} unavailable for {mint}: {reason}")]
    StateUnavailable {
        venue: Venue,
        mint: Pubkey,
        reason: String,
    },

    /// The aggregator has no on-chain state to load
    #[error("Venue {0} has no on-chain state")]
    NoOnChainState(Venue),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl DiscoveryError {
    pub fn is_retryable(&self) -> bool {
        match self {
            DiscoveryError::Ledger(e) => e.is_retryable(),
            DiscoveryError::VenueNotFound { .. } => false,
            DiscoveryError::StateUnavailable { .. } => false,
            DiscoveryError::NoOnChainState(_) => false,
            DiscoveryError::Decode(_) => false,
        }
    }
}

/// Discovery tuning
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub cache_ttl: Duration,
    /// Attempts per probe, including the first
    pub probe_attempts: u32,
    pub probe_backoff_ms: u64,
    pub aggregator_enabled: bool,
    /// Cache size past which expired entries are swept on insert
    pub cache_max_entries: usize,
    pub cache_prune_interval: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: cache::DEFAULT_CACHE_TTL,
            probe_attempts: 3,
            probe_backoff_ms: 100,
            aggregator_enabled: true,
            cache_max_entries: cache::DEFAULT_MAX_ENTRIES,
            cache_prune_interval: Duration::from_secs(60),
        }
    }
}

/// Fresh on-chain state for one venue: everything needed to quote and build
#[derive(Debug, Clone)]
pub struct VenueSnapshot {
    pub venue: Venue,
    pub mint: Pubkey,
    pub state: PoolState,
    pub accounts: VenueAccounts,
}

pub struct VenueDiscovery {
    ledger: Arc<dyn LedgerClient>,
    cache: Arc<VenueCache>,
    retry: RetryPolicy,
    aggregator_enabled: bool,
}

impl VenueDiscovery {
    pub fn new(ledger: Arc<dyn LedgerClient>, cache: Arc<VenueCache>, config: &DiscoveryConfig) -> Self {
        Self {
            ledger,
            cache,
            retry: RetryPolicy::new(config.probe_attempts, config.probe_backoff_ms),
            aggregator_enabled: config.aggregator_enabled,
        }
    }

    pub fn cache(&self) -> &Arc<VenueCache> {
        &self.cache
    }

    pub fn aggregator_enabled(&self) -> bool {
        self.aggregator_enabled
    }

    /// Resolves the venue for `mint`, consulting the cache first
    #[instrument(skip(self), fields(token = %mint))]
    pub async fn discover(&self, mint: &Pubkey) -> Result<Venue, DiscoveryError> {
        if let Some(entry) = self.cache.get(mint) {
            debug!(venue = %entry.venue, permanent = entry.permanent, "Venue cache hit");
            metrics().discovery_cache_hits.inc();
            return Ok(entry.venue);
        }
        metrics().discovery_cache_misses.inc();

        let timer = Timer::with_name("discovery_latency_seconds");
        let venue = self.classify(mint).await;
        timer.finish();
        let venue = venue?;
        self.cache.insert_transient(*mint, venue);
        info!(venue = %venue, "Venue discovered");
        Ok(venue)
    }

    /// Promotes the cache entry after an observed successful trade
    pub fn mark_confirmed(&self, mint: &Pubkey, venue: Venue) {
        self.cache.mark_confirmed(*mint, venue);
    }

    pub fn invalidate(&self, mint: &Pubkey) -> bool {
        self.cache.invalidate(mint)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Uncached probe sequence
    async fn classify(&self, mint: &Pubkey) -> Result<Venue, DiscoveryError> {
        match self.probe_pump_curve(mint).await {
            ProbeOutcome::Found(curve) if !curve.complete => return Ok(Venue::PumpCurve),
            ProbeOutcome::Found(_) => {
                debug!(token = %mint, "Bonding curve complete, probing AMM");
                return self.after_curve(mint).await;
            }
            ProbeOutcome::Failed(e) => {
                warn!(token = %mint, error = %e, "Bonding curve probe failed, continuing")
            }
            ProbeOutcome::Absent => {}
        }

        match self.probe_launchpad(mint).await {
            ProbeOutcome::Found(pool) if pool.is_trading() => return Ok(Venue::LaunchpadCurve),
            ProbeOutcome::Found(pool) => {
                debug!(token = %mint, status = ?pool.status, "LaunchLab pool no longer trading")
            }
            ProbeOutcome::Failed(e) => {
                warn!(token = %mint, error = %e, "LaunchLab probe failed, continuing")
            }
            ProbeOutcome::Absent => {}
        }

        self.after_curve(mint).await
    }

    /// Pool probes, then the aggregator
    async fn after_curve(&self, mint: &Pubkey) -> Result<Venue, DiscoveryError> {
        if self.resolve_amm_pool(mint).await.is_some() {
            return Ok(Venue::PumpAmm);
        }
        if self.aggregator_enabled {
            debug!(token = %mint, "No on-chain venue, routing through aggregator");
            return Ok(Venue::Aggregator);
        }
        Err(DiscoveryError::VenueNotFound { mint: *mint })
    }

    async fn probe_pump_curve(&self, mint: &Pubkey) -> ProbeOutcome<PumpBondingCurve> {
        let address = pump::bonding_curve(mint);
        let ledger = self.ledger.as_ref();
        probe_with_retry("pump_curve", &self.retry, || {
            race_decode(ledger, &address, &pump::PROGRAM_ID, |account| {
                PumpBondingCurve::decode(&account.data).ok()
            })
        })
        .await
    }

    async fn probe_launchpad(&self, mint: &Pubkey) -> ProbeOutcome<LaunchpadPool> {
        let address = launchpad::pool(mint, &WSOL_MINT);
        let ledger = self.ledger.as_ref();
        probe_with_retry("launchpad", &self.retry, || {
            race_decode(ledger, &address, &launchpad::PROGRAM_ID, |account| {
                LaunchpadPool::decode(&account.data).ok()
            })
        })
        .await
    }

    /// Canonical pool PDA first, then a program-account search on the base mint
    async fn resolve_amm_pool(&self, mint: &Pubkey) -> Option<Pubkey> {
        if let Some(pool) = self.cache.pool(mint) {
            return Some(pool);
        }

        let canonical = pump_amm::canonical_pool(mint);
        let ledger = self.ledger.as_ref();
        let outcome = probe_with_retry("pump_amm_canonical", &self.retry, || {
            race_decode(ledger, &canonical, &pump_amm::PROGRAM_ID, |account| {
                PumpAmmPool::decode(&account.data)
                    .ok()
                    .filter(|p| p.base_mint == *mint)
            })
        })
        .await;
        if outcome.found().is_some() {
            self.cache.insert_pool(*mint, canonical);
            return Some(canonical);
        }

        let found = call_with_retry("pump_amm_search", &self.retry, || {
            ledger.find_program_accounts(&pump_amm::PROGRAM_ID, BASE_MINT_OFFSET, mint.as_ref())
        })
        .await;

        match found {
            Ok(accounts) => {
                let pool = accounts.into_iter().find_map(|(address, account)| {
                    PumpAmmPool::decode(&account.data)
                        .ok()
                        .filter(|p| p.base_mint == *mint && p.quote_mint == WSOL_MINT)
                        .map(|_| address)
                })?;
                debug!(token = %mint, pool = %pool, "AMM pool found by search");
                self.cache.insert_pool(*mint, pool);
                Some(pool)
            }
            Err(e) => {
                warn!(token = %mint, error = %e, "AMM pool search failed");
                None
            }
        }
    }

    /// Fetches decoded state, vault reserves and the account set for `venue`
    #[instrument(skip(self), fields(token = %mint, venue = %venue))]
    pub async fn load_state(&self, mint: &Pubkey, venue: Venue) -> Result<VenueSnapshot, DiscoveryError> {
        let (state, accounts) = match venue {
            Venue::PumpCurve => {
                let data = self.fetch_data(&pump::bonding_curve(mint), &pump::PROGRAM_ID).await?;
                let curve = data
                    .ok_or_else(|| unavailable(venue, mint, "bonding curve account missing"))
                    .and_then(|d| PumpBondingCurve::decode(&d).map_err(DiscoveryError::from))?;
                if curve.complete {
                    return Err(unavailable(venue, mint, "bonding curve complete"));
                }
                let token_program = self.mint_token_program(mint).await?;
                (
                    PoolState::BondingCurve(curve.to_state()),
                    VenueAccounts::PumpCurve(PumpCurveAccounts::new(*mint, curve.creator, token_program)),
                )
            }
            Venue::LaunchpadCurve => {
                let address = launchpad::pool(mint, &WSOL_MINT);
                let data = self.fetch_data(&address, &launchpad::PROGRAM_ID).await?;
                let pool = data
                    .ok_or_else(|| unavailable(venue, mint, "pool account missing"))
                    .and_then(|d| LaunchpadPool::decode(&d).map_err(DiscoveryError::from))?;
                if !pool.is_trading() {
                    return Err(unavailable(venue, mint, "pool no longer trading"));
                }
                let token_program = self.mint_token_program(mint).await?;
                (
                    PoolState::BondingCurve(pool.to_state()?),
                    VenueAccounts::LaunchpadCurve(LaunchpadAccounts::from_pool(address, &pool, token_program)),
                )
            }
            Venue::PumpAmm => {
                let address = self
                    .resolve_amm_pool(mint)
                    .await
                    .ok_or_else(|| unavailable(venue, mint, "no AMM pool"))?;
                let data = self.fetch_data(&address, &pump_amm::PROGRAM_ID).await?;
                let pool = data
                    .ok_or_else(|| unavailable(venue, mint, "pool account missing"))
                    .and_then(|d| PumpAmmPool::decode(&d).map_err(DiscoveryError::from))?;

                let base_reserve = self.token_balance(&pool.pool_base_token_account).await?;
                let quote_reserve = self.token_balance(&pool.pool_quote_token_account).await?;
                let token_program = self.mint_token_program(mint).await?;

                let state = pool.to_state(address, pump_amm::fee_config(), base_reserve, quote_reserve);
                (
                    PoolState::Pool(state),
                    VenueAccounts::PumpAmm(PumpAmmAccounts::from_state(&state, token_program)),
                )
            }
            Venue::Aggregator => return Err(DiscoveryError::NoOnChainState(venue)),
        };

        let (base, quote) = state.pricing_reserves();
        debug!(base_reserve = base, quote_reserve = quote, "Venue state loaded");

        Ok(VenueSnapshot {
            venue,
            mint: *mint,
            state,
            accounts,
        })
    }

    /// Account data at `Confirmed`, `None` when missing or owned by another program
    async fn fetch_data(&self, address: &Pubkey, owner: &Pubkey) -> Result<Option<Vec<u8>>, DiscoveryError> {
        let ledger = self.ledger.as_ref();
        let account = call_with_retry("get_account", &self.retry, || {
            ledger.get_account(address, Commitment::Confirmed)
        })
        .await?;
        Ok(account.filter(|a| a.owner == *owner).map(|a| a.data))
    }

    async fn token_balance(&self, address: &Pubkey) -> Result<u64, DiscoveryError> {
        let ledger = self.ledger.as_ref();
        let account = call_with_retry("get_token_account", &self.retry, || {
            ledger.get_account(address, Commitment::Confirmed)
        })
        .await?;
        match account {
            Some(account) => Ok(TokenAccount::decode(&account.data)?.amount),
            None => Ok(0),
        }
    }

    /// SPL Token or Token-2022, read from the mint's owner
    pub async fn mint_token_program(&self, mint: &Pubkey) -> Result<Pubkey, DiscoveryError> {
        let ledger = self.ledger.as_ref();
        let account = call_with_retry("get_mint", &self.retry, || {
            ledger.get_account(mint, Commitment::Confirmed)
        })
        .await?;
        Ok(match account {
            Some(a) if a.owner == TOKEN_2022_PROGRAM_ID => TOKEN_2022_PROGRAM_ID,
            _ => accounts::token_program(),
        })
    }
}

fn unavailable(venue: Venue, mint: &Pubkey, reason: &str) -> DiscoveryError {
    DiscoveryError::StateUnavailable {
        venue,
        mint: *mint,
        reason: reason.to_string(),
    }
}
