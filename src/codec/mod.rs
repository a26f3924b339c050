//! On-chain account codecs
//!
//! Fixed-layout decoders (and matching encoders) for every venue account the engine reads.
//! Decoders are pure: they accept bytes already fetched by discovery and never perform I/O.
//!
//! ## Layouts
//! - [`pump_curve::PumpBondingCurve`]: pump.fun bonding curve, 81 bytes
//! - [`launchpad::LaunchpadPool`]: Raydium LaunchLab pool state, 365 bytes
//! - [`pump_amm::PumpAmmPool`]: PumpSwap AMM pool, 243 bytes
//! - [`token_account::TokenAccount`]: SPL / Token-2022 token account, 165 bytes
//!
//! Venue-specific layouts are normalised into the closed [`PoolState`] union consumed by
//! the quote engine and the instruction builders.

pub mod errors;
pub(crate) mod layout;
pub mod launchpad;
pub mod pump_amm;
pub mod pump_curve;
pub mod token_account;

pub use errors::DecodeError;
pub use launchpad::LaunchpadPool;
pub use pump_amm::PumpAmmPool;
pub use pump_curve::PumpBondingCurve;
pub use token_account::TokenAccount;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Normalised bonding-curve reserves.
///
/// `virtual_*` reserves price the trade, `real_*` reserves bound it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondingCurveState {
    pub creator: Pubkey,
    pub virtual_base_reserve: u64,
    pub virtual_quote_reserve: u64,
    pub real_base_reserve: u64,
    pub real_quote_reserve: u64,
    pub is_complete: bool,
}

/// Shared AMM pool. Reserves are read from the vault token accounts, not the pool account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmPoolState {
    pub pool_id: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub fee_config: Pubkey,
    pub coin_creator: Pubkey,
    pub lp_supply: u64,
    pub base_reserve: u64,
    pub quote_reserve: u64,
}

/// Decoded venue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolState {
    BondingCurve(BondingCurveState),
    Pool(AmmPoolState),
}

impl PoolState {
    /// Reserves used for pricing as `(base, quote)`
    pub fn pricing_reserves(&self) -> (u64, u64) {
        match self {
            PoolState::BondingCurve(c) => (c.virtual_base_reserve, c.virtual_quote_reserve),
            PoolState::Pool(p) => (p.base_reserve, p.quote_reserve),
        }
    }

    /// Quote-side liquidity actually held by the venue
    pub fn quote_liquidity(&self) -> u64 {
        match self {
            PoolState::BondingCurve(c) => c.real_quote_reserve,
            PoolState::Pool(p) => p.quote_reserve,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, PoolState::BondingCurve(c) if c.is_complete)
    }
}

/// Computes an Anchor account discriminator: `sha256("account:<name>")[..8]`
pub fn account_discriminator(name: &str) -> [u8; 8] {
    anchor_discriminator("account", name)
}

pub(crate) fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}
