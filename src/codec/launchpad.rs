//! Raydium LaunchLab pool state

use super::layout::{LayoutReader, LayoutWriter};
use super::{BondingCurveState, DecodeError, PoolState};
use solana_sdk::pubkey::Pubkey;

pub const POOL_STATE_DISCRIMINATOR: [u8; 8] = [247, 237, 227, 245, 215, 195, 222, 70];

pub const POOL_STATE_LEN: usize = 365;

const ACCOUNT: &str = "launchpad_pool_state";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LaunchpadStatus {
    Trading = 0,
    Migrating = 1,
    Migrated = 2,
}

impl TryFrom<u8> for LaunchpadStatus {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Trading),
            1 => Ok(Self::Migrating),
            2 => Ok(Self::Migrated),
            other => Err(DecodeError::ValueOutOfRange {
                account: ACCOUNT,
                field: "status",
                value: other as u64,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VestingSchedule {
    pub total_locked_amount: u64,
    pub cliff_period: u64,
    pub unlock_period: u64,
    pub start_time: u64,
    pub allocated_share_amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchpadPool {
    pub epoch: u64,
    pub auth_bump: u8,
    pub status: LaunchpadStatus,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub migrate_type: u8,
    pub supply: u64,
    pub total_base_sell: u64,
    pub virtual_base: u64,
    pub virtual_quote: u64,
    /// Base tokens sold so far
    pub real_base: u64,
    pub real_quote: u64,
    pub total_quote_fund_raising: u64,
    pub quote_protocol_fee: u64,
    pub platform_fee: u64,
    pub migrate_fee: u64,
    pub vesting: VestingSchedule,
    pub global_config: Pubkey,
    pub platform_config: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub creator: Pubkey,
}

impl LaunchpadPool {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let r = LayoutReader::new(ACCOUNT, data, POOL_STATE_LEN, &POOL_STATE_DISCRIMINATOR)?;
        Ok(Self {
            epoch: r.u64(8)?,
            auth_bump: r.u8(16)?,
            status: LaunchpadStatus::try_from(r.u8(17)?)?,
            base_decimals: r.u8(18)?,
            quote_decimals: r.u8(19)?,
            migrate_type: r.u8(20)?,
            supply: r.u64(21)?,
            total_base_sell: r.u64(29)?,
            virtual_base: r.u64(37)?,
            virtual_quote: r.u64(45)?,
            real_base: r.u64(53)?,
            real_quote: r.u64(61)?,
            total_quote_fund_raising: r.u64(69)?,
            quote_protocol_fee: r.u64(77)?,
            platform_fee: r.u64(85)?,
            migrate_fee: r.u64(93)?,
            vesting: VestingSchedule {
                total_locked_amount: r.u64(101)?,
                cliff_period: r.u64(109)?,
                unlock_period: r.u64(117)?,
                start_time: r.u64(125)?,
                allocated_share_amount: r.u64(133)?,
            },
            global_config: r.pubkey(141)?,
            platform_config: r.pubkey(173)?,
            base_mint: r.pubkey(205)?,
            quote_mint: r.pubkey(237)?,
            base_vault: r.pubkey(269)?,
            quote_vault: r.pubkey(301)?,
            creator: r.pubkey(333)?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        LayoutWriter::with_discriminator(&POOL_STATE_DISCRIMINATOR, POOL_STATE_LEN)
            .u64(self.epoch)
            .u8(self.auth_bump)
            .u8(self.status as u8)
            .u8(self.base_decimals)
            .u8(self.quote_decimals)
            .u8(self.migrate_type)
            .u64(self.supply)
            .u64(self.total_base_sell)
            .u64(self.virtual_base)
            .u64(self.virtual_quote)
            .u64(self.real_base)
            .u64(self.real_quote)
            .u64(self.total_quote_fund_raising)
            .u64(self.quote_protocol_fee)
            .u64(self.platform_fee)
            .u64(self.migrate_fee)
            .u64(self.vesting.total_locked_amount)
            .u64(self.vesting.cliff_period)
            .u64(self.vesting.unlock_period)
            .u64(self.vesting.start_time)
            .u64(self.vesting.allocated_share_amount)
            .pubkey(&self.global_config)
            .pubkey(&self.platform_config)
            .pubkey(&self.base_mint)
            .pubkey(&self.quote_mint)
            .pubkey(&self.base_vault)
            .pubkey(&self.quote_vault)
            .pubkey(&self.creator)
            .finish()
    }

    pub fn is_trading(&self) -> bool {
        self.status == LaunchpadStatus::Trading
    }

    /// Effective curve reserves. The program prices against
    /// `(virtual_base - real_base, virtual_quote + real_quote)`.
    pub fn to_state(&self) -> Result<BondingCurveState, DecodeError> {
        let virtual_base_reserve =
            self.virtual_base
                .checked_sub(self.real_base)
                .ok_or(DecodeError::ValueOutOfRange {
                    account: ACCOUNT,
                    field: "real_base",
                    value: self.real_base,
                })?;
        let virtual_quote_reserve =
            self.virtual_quote
                .checked_add(self.real_quote)
                .ok_or(DecodeError::ValueOutOfRange {
                    account: ACCOUNT,
                    field: "real_quote",
                    value: self.real_quote,
                })?;
        let real_base_reserve = self
            .total_base_sell
            .checked_sub(self.real_base)
            .ok_or(DecodeError::ValueOutOfRange {
                account: ACCOUNT,
                field: "total_base_sell",
                value: self.total_base_sell,
            })?;

        Ok(BondingCurveState {
            creator: self.creator,
            virtual_base_reserve,
            virtual_quote_reserve,
            real_base_reserve,
            real_quote_reserve: self.real_quote,
            is_complete: !self.is_trading(),
        })
    }
}

pub fn decode(data: &[u8]) -> Result<PoolState, DecodeError> {
    Ok(PoolState::BondingCurve(LaunchpadPool::decode(data)?.to_state()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LaunchpadPool {
        LaunchpadPool {
            epoch: 812,
            auth_bump: 254,
            status: LaunchpadStatus::Trading,
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
            quote_protocol_fee: 10_000_000,
            platform_fee: 40_000_000,
            migrate_fee: 0,
            vesting: VestingSchedule::default(),
            global_config: Pubkey::new_unique(),
            platform_config: Pubkey::new_unique(),
            base_mint: Pubkey::new_unique(),
            quote_mint: Pubkey::new_unique(),
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            creator: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_round_trip() {
        let pool = sample();
        let bytes = pool.encode();
        assert_eq!(bytes.len(), POOL_STATE_LEN);
        assert_eq!(LaunchpadPool::decode(&bytes).unwrap(), pool);
    }

    #[test]
    fn test_field_offsets() {
        let pool = sample();
        let bytes = pool.encode();
        assert_eq!(bytes[17], 0);
        assert_eq!(&bytes[205..237], pool.base_mint.as_ref());
        assert_eq!(&bytes[333..365], pool.creator.as_ref());
        assert_eq!(u64::from_le_bytes(bytes[53..61].try_into().unwrap()), pool.real_base);
    }

    #[test]
    fn test_rejects_unknown_status() {
        let mut bytes = sample().encode();
        bytes[17] = 3;
        assert!(matches!(
            LaunchpadPool::decode(&bytes),
            Err(DecodeError::ValueOutOfRange { field: "status", .. })
        ));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let bytes = sample().encode();
        assert!(LaunchpadPool::decode(&bytes[..364]).is_err());
    }

    #[test]
    fn test_effective_reserves() {
        let pool = sample();
        let state = pool.to_state().unwrap();
        assert_eq!(state.virtual_base_reserve, pool.virtual_base - pool.real_base);
        assert_eq!(state.virtual_quote_reserve, pool.virtual_quote + pool.real_quote);
        assert_eq!(state.real_base_reserve, pool.total_base_sell - pool.real_base);
        assert_eq!(state.real_quote_reserve, pool.real_quote);
        assert!(!state.is_complete);
    }

    #[test]
    fn test_migrated_pool_is_complete() {
        let mut pool = sample();
        pool.status = LaunchpadStatus::Migrated;
        assert!(pool.to_state().unwrap().is_complete);
    }

    #[test]
    fn test_underflow_is_decode_error() {
        let mut pool = sample();
        pool.real_base = pool.virtual_base + 1;
        assert!(matches!(
            decode(&pool.encode()),
            Err(DecodeError::ValueOutOfRange { field: "real_base", .. })
        ));
    }
}
