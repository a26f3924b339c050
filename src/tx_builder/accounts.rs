//! Program ids and PDA derivations for every venue

use solana_sdk::pubkey::Pubkey;

pub const WSOL_MINT: Pubkey = solana_sdk::pubkey!("So11111111111111111111111111111111111111112");
pub const TOKEN_2022_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
pub const FEE_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("pfeeUxB6jkeY1Hxd7CsFCAjcbHA9rWtchMGdZ6VojVZ");

pub fn token_program() -> Pubkey {
    spl_token::id()
}

pub fn associated_token_program() -> Pubkey {
    spl_associated_token_account::id()
}

pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        owner,
        mint,
        token_program,
    )
}

/// pump.fun bonding curve program
pub mod pump {
    use super::*;

    pub const PROGRAM_ID: Pubkey =
        solana_sdk::pubkey!("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P");
    pub const FEE_RECIPIENT: Pubkey =
        solana_sdk::pubkey!("CebN5WGQ4jvEPvsVU4EoHEpgzq1VV7AbicfhtW4xC9iM");

    fn pda(seeds: &[&[u8]]) -> Pubkey {
        Pubkey::find_program_address(seeds, &PROGRAM_ID).0
    }

    pub fn global() -> Pubkey {
        pda(&[b"global"])
    }

    pub fn bonding_curve(mint: &Pubkey) -> Pubkey {
        pda(&[b"bonding-curve", mint.as_ref()])
    }

    pub fn creator_vault(creator: &Pubkey) -> Pubkey {
        pda(&[b"creator-vault", creator.as_ref()])
    }

    pub fn event_authority() -> Pubkey {
        pda(&[b"__event_authority"])
    }

    pub fn global_volume_accumulator() -> Pubkey {
        pda(&[b"global_volume_accumulator"])
    }

    pub fn user_volume_accumulator(user: &Pubkey) -> Pubkey {
        pda(&[b"user_volume_accumulator", user.as_ref()])
    }

    pub fn fee_config() -> Pubkey {
        Pubkey::find_program_address(&[b"fee_config", PROGRAM_ID.as_ref()], &FEE_PROGRAM_ID).0
    }

    /// Authority that owns the AMM pool a graduated curve migrates into
    pub fn pool_authority(mint: &Pubkey) -> Pubkey {
        pda(&[b"pool-authority", mint.as_ref()])
    }
}

/// PumpSwap AMM program
pub mod pump_amm {
    use super::*;

    pub const PROGRAM_ID: Pubkey =
        solana_sdk::pubkey!("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA");
    pub const GLOBAL_CONFIG: Pubkey =
        solana_sdk::pubkey!("ADyA8hdefvWN2dbGGWFotbzWxrAvLW83WG6QCVXvJKqw");
    pub const PROTOCOL_FEE_RECIPIENT: Pubkey =
        solana_sdk::pubkey!("62qc2CNXwrYqQScmEdiZFFAnJR262PxWEuNQtxfafNgV");

    /// Index of the pool created by curve migration
    pub const CANONICAL_POOL_INDEX: u16 = 0;

    fn pda(seeds: &[&[u8]]) -> Pubkey {
        Pubkey::find_program_address(seeds, &PROGRAM_ID).0
    }

    /// Canonical WSOL pool created when a pump.fun curve graduates
    pub fn canonical_pool(mint: &Pubkey) -> Pubkey {
        let creator = super::pump::pool_authority(mint);
        pda(&[
            b"pool",
            &CANONICAL_POOL_INDEX.to_le_bytes(),
            creator.as_ref(),
            mint.as_ref(),
            WSOL_MINT.as_ref(),
        ])
    }

    pub fn event_authority() -> Pubkey {
        pda(&[b"__event_authority"])
    }

    pub fn coin_creator_vault_authority(coin_creator: &Pubkey) -> Pubkey {
        pda(&[b"creator_vault", coin_creator.as_ref()])
    }

    pub fn coin_creator_vault_ata(coin_creator: &Pubkey, quote_mint: &Pubkey) -> Pubkey {
        associated_token_address(
            &coin_creator_vault_authority(coin_creator),
            quote_mint,
            &token_program(),
        )
    }

    pub fn protocol_fee_recipient_ata(quote_mint: &Pubkey) -> Pubkey {
        associated_token_address(&PROTOCOL_FEE_RECIPIENT, quote_mint, &token_program())
    }

    pub fn global_volume_accumulator() -> Pubkey {
        pda(&[b"global_volume_accumulator"])
    }

    pub fn user_volume_accumulator(user: &Pubkey) -> Pubkey {
        pda(&[b"user_volume_accumulator", user.as_ref()])
    }

    pub fn fee_config() -> Pubkey {
        Pubkey::find_program_address(&[b"fee_config", PROGRAM_ID.as_ref()], &FEE_PROGRAM_ID).0
    }
}

/// Raydium LaunchLab program
pub mod launchpad {
    use super::*;

    pub const PROGRAM_ID: Pubkey =
        solana_sdk::pubkey!("LanMV9sAd7wArD4vJFi2qDdfnVhFxYSUg6eADduJ3uj");

    fn pda(seeds: &[&[u8]]) -> Pubkey {
        Pubkey::find_program_address(seeds, &PROGRAM_ID).0
    }

    pub fn pool(base_mint: &Pubkey, quote_mint: &Pubkey) -> Pubkey {
        pda(&[b"pool", base_mint.as_ref(), quote_mint.as_ref()])
    }

    pub fn authority() -> Pubkey {
        pda(&[b"vault_auth_seed"])
    }

    pub fn event_authority() -> Pubkey {
        pda(&[b"__event_authority"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdas_are_deterministic_and_distinct() {
        let mint = Pubkey::new_unique();
        assert_eq!(pump::bonding_curve(&mint), pump::bonding_curve(&mint));
        assert_ne!(pump::bonding_curve(&mint), pump::pool_authority(&mint));
        assert_ne!(pump::event_authority(), pump_amm::event_authority());
        assert_ne!(pump::fee_config(), pump_amm::fee_config());
        assert_ne!(
            launchpad::pool(&mint, &WSOL_MINT),
            launchpad::pool(&WSOL_MINT, &mint)
        );
    }

    #[test]
    fn test_canonical_pool_matches_manual_derivation() {
        let mint = Pubkey::new_unique();
        let (authority, _) =
            Pubkey::find_program_address(&[b"pool-authority", mint.as_ref()], &pump::PROGRAM_ID);
        let (expected, _) = Pubkey::find_program_address(
            &[
                b"pool",
                &[0, 0],
                authority.as_ref(),
                mint.as_ref(),
                WSOL_MINT.as_ref(),
            ],
            &pump_amm::PROGRAM_ID,
        );
        assert_eq!(pump_amm::canonical_pool(&mint), expected);
    }

    #[test]
    fn test_known_program_ids() {
        assert_eq!(WSOL_MINT, spl_token::native_mint::id());
        assert_eq!(
            pump::PROGRAM_ID.to_string(),
            "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P"
        );
    }
}
