//! Raydium LaunchLab curve buy/sell

use super::accounts::{associated_token_address, launchpad, token_program};
use crate::codec::layout::LayoutWriter;
use crate::codec::LaunchpadPool;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

pub const BUY_EXACT_IN_DISCRIMINATOR: [u8; 8] = [250, 234, 13, 123, 213, 156, 19, 236];
pub const SELL_EXACT_IN_DISCRIMINATOR: [u8; 8] = [149, 39, 222, 155, 211, 124, 152, 26];

/// No share-fee receiver
pub const SHARE_FEE_RATE: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchpadAccounts {
    pub pool_state: Pubkey,
    pub global_config: Pubkey,
    pub platform_config: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_token_program: Pubkey,
}

impl LaunchpadAccounts {
    pub fn from_pool(pool_state: Pubkey, pool: &LaunchpadPool, base_token_program: Pubkey) -> Self {
        Self {
            pool_state,
            global_config: pool.global_config,
            platform_config: pool.platform_config,
            base_mint: pool.base_mint,
            quote_mint: pool.quote_mint,
            base_vault: pool.base_vault,
            quote_vault: pool.quote_vault,
            base_token_program,
        }
    }
}

pub fn buy(accounts: &LaunchpadAccounts, user: &Pubkey, amount_in: u64, minimum_amount_out: u64) -> Instruction {
    trade(BUY_EXACT_IN_DISCRIMINATOR, accounts, user, amount_in, minimum_amount_out)
}

pub fn sell(accounts: &LaunchpadAccounts, user: &Pubkey, amount_in: u64, minimum_amount_out: u64) -> Instruction {
    trade(SELL_EXACT_IN_DISCRIMINATOR, accounts, user, amount_in, minimum_amount_out)
}

// Buy and sell share one account list
fn trade(
    discriminator: [u8; 8],
    accounts: &LaunchpadAccounts,
    user: &Pubkey,
    amount_in: u64,
    minimum_amount_out: u64,
) -> Instruction {
    let data = LayoutWriter::with_discriminator(&discriminator, 32)
        .u64(amount_in)
        .u64(minimum_amount_out)
        .u64(SHARE_FEE_RATE)
        .finish();

    let quote_token_program = token_program();
    let metas = vec![
        AccountMeta::new_readonly(*user, true),
        AccountMeta::new_readonly(launchpad::authority(), false),
        AccountMeta::new_readonly(accounts.global_config, false),
        AccountMeta::new_readonly(accounts.platform_config, false),
        AccountMeta::new(accounts.pool_state, false),
        AccountMeta::new(
            associated_token_address(user, &accounts.base_mint, &accounts.base_token_program),
            false,
        ),
        AccountMeta::new(
            associated_token_address(user, &accounts.quote_mint, &quote_token_program),
            false,
        ),
        AccountMeta::new(accounts.base_vault, false),
        AccountMeta::new(accounts.quote_vault, false),
        AccountMeta::new_readonly(accounts.base_mint, false),
        AccountMeta::new_readonly(accounts.quote_mint, false),
        AccountMeta::new_readonly(accounts.base_token_program, false),
        AccountMeta::new_readonly(quote_token_program, false),
        AccountMeta::new_readonly(launchpad::event_authority(), false),
        AccountMeta::new_readonly(launchpad::PROGRAM_ID, false),
    ];

    Instruction::new_with_bytes(launchpad::PROGRAM_ID, &data, metas)
}
