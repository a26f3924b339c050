//! PumpSwap AMM pool account

use super::layout::{LayoutReader, LayoutWriter};
use super::{AmmPoolState, DecodeError};
use solana_sdk::pubkey::Pubkey;

pub const POOL_DISCRIMINATOR: [u8; 8] = [241, 154, 109, 4, 17, 177, 109, 188];

pub const POOL_LEN: usize = 243;

/// memcmp offset of `base_mint` used to search pools by token
pub const BASE_MINT_OFFSET: usize = 43;
/// memcmp offset of `quote_mint`
pub const QUOTE_MINT_OFFSET: usize = 75;

const ACCOUNT: &str = "pump_amm_pool";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpAmmPool {
    pub pool_bump: u8,
    pub index: u16,
    pub creator: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub pool_base_token_account: Pubkey,
    pub pool_quote_token_account: Pubkey,
    pub lp_supply: u64,
    pub coin_creator: Pubkey,
}

impl PumpAmmPool {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let r = LayoutReader::new(ACCOUNT, data, POOL_LEN, &POOL_DISCRIMINATOR)?;
        Ok(Self {
            pool_bump: r.u8(8)?,
            index: r.u16(9)?,
            creator: r.pubkey(11)?,
            base_mint: r.pubkey(BASE_MINT_OFFSET)?,
            quote_mint: r.pubkey(QUOTE_MINT_OFFSET)?,
            lp_mint: r.pubkey(107)?,
            pool_base_token_account: r.pubkey(139)?,
            pool_quote_token_account: r.pubkey(171)?,
            lp_supply: r.u64(203)?,
            coin_creator: r.pubkey(211)?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        LayoutWriter::with_discriminator(&POOL_DISCRIMINATOR, POOL_LEN)
            .u8(self.pool_bump)
            .u16(self.index)
            .pubkey(&self.creator)
            .pubkey(&self.base_mint)
            .pubkey(&self.quote_mint)
            .pubkey(&self.lp_mint)
            .pubkey(&self.pool_base_token_account)
            .pubkey(&self.pool_quote_token_account)
            .u64(self.lp_supply)
            .pubkey(&self.coin_creator)
            .finish()
    }

    /// Combines the pool account with vault balances fetched separately
    pub fn to_state(
        &self,
        pool_id: Pubkey,
        fee_config: Pubkey,
        base_reserve: u64,
        quote_reserve: u64,
    ) -> AmmPoolState {
        AmmPoolState {
            pool_id,
            base_vault: self.pool_base_token_account,
            quote_vault: self.pool_quote_token_account,
            base_mint: self.base_mint,
            quote_mint: self.quote_mint,
            fee_config,
            coin_creator: self.coin_creator,
            lp_supply: self.lp_supply,
            base_reserve,
            quote_reserve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PumpAmmPool {
        PumpAmmPool {
            pool_bump: 255,
            index: 0,
            creator: Pubkey::new_unique(),
            base_mint: Pubkey::new_unique(),
            quote_mint: Pubkey::new_unique(),
            lp_mint: Pubkey::new_unique(),
            pool_base_token_account: Pubkey::new_unique(),
            pool_quote_token_account: Pubkey::new_unique(),
            lp_supply: 4_193_388_284_112,
            coin_creator: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_round_trip() {
        let pool = sample();
        let bytes = pool.encode();
        assert_eq!(bytes.len(), POOL_LEN);
        assert_eq!(PumpAmmPool::decode(&bytes).unwrap(), pool);
    }

    #[test]
    fn test_mint_offsets_are_stable() {
        let pool = sample();
        let bytes = pool.encode();
        assert_eq!(&bytes[BASE_MINT_OFFSET..BASE_MINT_OFFSET + 32], pool.base_mint.as_ref());
        assert_eq!(&bytes[QUOTE_MINT_OFFSET..QUOTE_MINT_OFFSET + 32], pool.quote_mint.as_ref());
    }

    #[test]
    fn test_index_little_endian() {
        let mut pool = sample();
        pool.index = 0x0102;
        let bytes = pool.encode();
        assert_eq!(&bytes[9..11], &[0x02, 0x01]);
    }

    #[test]
    fn test_rejects_curve_bytes() {
        let curve = crate::codec::PumpBondingCurve {
            virtual_token_reserves: 1,
            virtual_sol_reserves: 1,
            real_token_reserves: 1,
            real_sol_reserves: 1,
            token_total_supply: 1,
            complete: false,
            creator: Pubkey::new_unique(),
        };
        let mut bytes = curve.encode();
        bytes.resize(POOL_LEN, 0);
        assert!(matches!(
            PumpAmmPool::decode(&bytes),
            Err(DecodeError::BadLayout { .. })
        ));
    }

    #[test]
    fn test_to_state_uses_vault_reserves() {
        let pool = sample();
        let id = Pubkey::new_unique();
        let state = pool.to_state(id, Pubkey::default(), 500, 900);
        assert_eq!(state.pool_id, id);
        assert_eq!(state.base_vault, pool.pool_base_token_account);
        assert_eq!((state.base_reserve, state.quote_reserve), (500, 900));
    }
}
