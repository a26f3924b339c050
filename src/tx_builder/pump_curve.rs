//! pump.fun bonding curve buy/sell

use super::accounts::{associated_token_address, pump, FEE_PROGRAM_ID};
use crate::codec::layout::LayoutWriter;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

/// `buy_exact_sol_in`: spend a fixed amount of SOL
pub const BUY_EXACT_SOL_IN_DISCRIMINATOR: [u8; 8] = [56, 252, 116, 8, 158, 223, 205, 95];
pub const SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];

/// Volume tracking flag passed on buys
pub const TRACK_VOLUME: u8 = 1;

/// Accounts needed to trade against one curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpCurveAccounts {
    pub mint: Pubkey,
    pub bonding_curve: Pubkey,
    pub creator: Pubkey,
    /// Owner of the mint (SPL Token or Token-2022)
    pub token_program: Pubkey,
}

impl PumpCurveAccounts {
    pub fn new(mint: Pubkey, creator: Pubkey, token_program: Pubkey) -> Self {
        Self {
            mint,
            bonding_curve: pump::bonding_curve(&mint),
            creator,
            token_program,
        }
    }

    fn associated_bonding_curve(&self) -> Pubkey {
        associated_token_address(&self.bonding_curve, &self.mint, &self.token_program)
    }

    pub fn user_token_account(&self, user: &Pubkey) -> Pubkey {
        associated_token_address(user, &self.mint, &self.token_program)
    }
}

pub fn buy(accounts: &PumpCurveAccounts, user: &Pubkey, sol_in: u64, min_tokens_out: u64) -> Instruction {
    let data = LayoutWriter::with_discriminator(&BUY_EXACT_SOL_IN_DISCRIMINATOR, 25)
        .u64(sol_in)
        .u64(min_tokens_out)
        .u8(TRACK_VOLUME)
        .finish();

    let metas = vec![
        AccountMeta::new_readonly(pump::global(), false),
        AccountMeta::new(pump::FEE_RECIPIENT, false),
        AccountMeta::new_readonly(accounts.mint, false),
        AccountMeta::new(accounts.bonding_curve, false),
        AccountMeta::new(accounts.associated_bonding_curve(), false),
        AccountMeta::new(accounts.user_token_account(user), false),
        AccountMeta::new(*user, true),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(accounts.token_program, false),
        AccountMeta::new(pump::creator_vault(&accounts.creator), false),
        AccountMeta::new_readonly(pump::event_authority(), false),
        AccountMeta::new_readonly(pump::PROGRAM_ID, false),
        AccountMeta::new_readonly(pump::global_volume_accumulator(), false),
        AccountMeta::new(pump::user_volume_accumulator(user), false),
        AccountMeta::new_readonly(pump::fee_config(), false),
        AccountMeta::new_readonly(FEE_PROGRAM_ID, false),
    ];

    Instruction::new_with_bytes(pump::PROGRAM_ID, &data, metas)
}

pub fn sell(accounts: &PumpCurveAccounts, user: &Pubkey, tokens_in: u64, min_sol_out: u64) -> Instruction {
    let data = LayoutWriter::with_discriminator(&SELL_DISCRIMINATOR, 24)
        .u64(tokens_in)
        .u64(min_sol_out)
        .finish();

    let metas = vec![
        AccountMeta::new_readonly(pump::global(), false),
        AccountMeta::new(pump::FEE_RECIPIENT, false),
        AccountMeta::new_readonly(accounts.mint, false),
        AccountMeta::new(accounts.bonding_curve, false),
        AccountMeta::new(accounts.associated_bonding_curve(), false),
        AccountMeta::new(accounts.user_token_account(user), false),
        AccountMeta::new(*user, true),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new(pump::creator_vault(&accounts.creator), false),
        AccountMeta::new_readonly(accounts.token_program, false),
        AccountMeta::new_readonly(pump::event_authority(), false),
        AccountMeta::new_readonly(pump::PROGRAM_ID, false),
        AccountMeta::new_readonly(pump::fee_config(), false),
        AccountMeta::new_readonly(FEE_PROGRAM_ID, false),
    ];

    Instruction::new_with_bytes(pump::PROGRAM_ID, &data, metas)
}
