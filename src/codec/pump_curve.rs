//! pump.fun bonding curve account

use super::layout::{LayoutReader, LayoutWriter};
use super::{BondingCurveState, DecodeError, PoolState};
use solana_sdk::pubkey::Pubkey;

pub const BONDING_CURVE_DISCRIMINATOR: [u8; 8] = [23, 183, 248, 55, 96, 216, 172, 96];

/// discriminator + 5 u64 + bool + creator
pub const BONDING_CURVE_LEN: usize = 81;

const ACCOUNT: &str = "pump_bonding_curve";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpBondingCurve {
    pub virtual_token_reserves: u64,
    pub virtual_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub token_total_supply: u64,
    pub complete: bool,
    pub creator: Pubkey,
}

impl PumpBondingCurve {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let r = LayoutReader::new(ACCOUNT, data, BONDING_CURVE_LEN, &BONDING_CURVE_DISCRIMINATOR)?;
        Ok(Self {
            virtual_token_reserves: r.u64(8)?,
            virtual_sol_reserves: r.u64(16)?,
            real_token_reserves: r.u64(24)?,
            real_sol_reserves: r.u64(32)?,
            token_total_supply: r.u64(40)?,
            complete: r.bool(48, "complete")?,
            creator: r.pubkey(49)?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        LayoutWriter::with_discriminator(&BONDING_CURVE_DISCRIMINATOR, BONDING_CURVE_LEN)
            .u64(self.virtual_token_reserves)
            .u64(self.virtual_sol_reserves)
            .u64(self.real_token_reserves)
            .u64(self.real_sol_reserves)
            .u64(self.token_total_supply)
            .u8(self.complete as u8)
            .pubkey(&self.creator)
            .finish()
    }

    pub fn to_state(&self) -> BondingCurveState {
        BondingCurveState {
            creator: self.creator,
            virtual_base_reserve: self.virtual_token_reserves,
            virtual_quote_reserve: self.virtual_sol_reserves,
            real_base_reserve: self.real_token_reserves,
            real_quote_reserve: self.real_sol_reserves,
            is_complete: self.complete,
        }
    }
}

/// Decodes raw bonding curve bytes straight into the common model
pub fn decode(data: &[u8]) -> Result<PoolState, DecodeError> {
    Ok(PoolState::BondingCurve(PumpBondingCurve::decode(data)?.to_state()))
}
