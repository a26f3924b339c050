//! PumpSwap AMM buy/sell

use super::accounts::{associated_token_address, associated_token_program, pump_amm, token_program, FEE_PROGRAM_ID};
use crate::codec::layout::LayoutWriter;
use crate::codec::AmmPoolState;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

/// `buy_exact_quote_in`: spend a fixed amount of the quote asset
pub const BUY_EXACT_QUOTE_IN_DISCRIMINATOR: [u8; 8] = [198, 46, 21, 82, 180, 217, 232, 112];
pub const SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];

pub const TRACK_VOLUME: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpAmmAccounts {
    pub pool: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub pool_base_token_account: Pubkey,
    pub pool_quote_token_account: Pubkey,
    pub coin_creator: Pubkey,
    pub base_token_program: Pubkey,
}

impl PumpAmmAccounts {
    pub fn from_state(state: &AmmPoolState, base_token_program: Pubkey) -> Self {
        Self {
            pool: state.pool_id,
            base_mint: state.base_mint,
            quote_mint: state.quote_mint,
            pool_base_token_account: state.base_vault,
            pool_quote_token_account: state.quote_vault,
            coin_creator: state.coin_creator,
            base_token_program,
        }
    }
}

pub fn buy(accounts: &PumpAmmAccounts, user: &Pubkey, quote_in: u64, min_base_out: u64) -> Instruction {
    let data = LayoutWriter::with_discriminator(&BUY_EXACT_QUOTE_IN_DISCRIMINATOR, 25)
        .u64(quote_in)
        .u64(min_base_out)
        .u8(TRACK_VOLUME)
        .finish();

    let mut metas = common_accounts(accounts, user);
    metas.push(AccountMeta::new_readonly(pump_amm::global_volume_accumulator(), false));
    metas.push(AccountMeta::new(pump_amm::user_volume_accumulator(user), false));
    metas.push(AccountMeta::new_readonly(pump_amm::fee_config(), false));
    metas.push(AccountMeta::new_readonly(FEE_PROGRAM_ID, false));

    Instruction::new_with_bytes(pump_amm::PROGRAM_ID, &data, metas)
}

pub fn sell(accounts: &PumpAmmAccounts, user: &Pubkey, base_in: u64, min_quote_out: u64) -> Instruction {
    let data = LayoutWriter::with_discriminator(&SELL_DISCRIMINATOR, 24)
        .u64(base_in)
        .u64(min_quote_out)
        .finish();

    let mut metas = common_accounts(accounts, user);
    metas.push(AccountMeta::new_readonly(pump_amm::fee_config(), false));
    metas.push(AccountMeta::new_readonly(FEE_PROGRAM_ID, false));

    Instruction::new_with_bytes(pump_amm::PROGRAM_ID, &data, metas)
}

fn common_accounts(accounts: &PumpAmmAccounts, user: &Pubkey) -> Vec<AccountMeta> {
    let quote_token_program = token_program();
    vec![
        AccountMeta::new_readonly(accounts.pool, false),
        AccountMeta::new(*user, true),
        AccountMeta::new_readonly(pump_amm::GLOBAL_CONFIG, false),
        AccountMeta::new_readonly(accounts.base_mint, false),
        AccountMeta::new_readonly(accounts.quote_mint, false),
        AccountMeta::new(
            associated_token_address(user, &accounts.base_mint, &accounts.base_token_program),
            false,
        ),
        AccountMeta::new(
            associated_token_address(user, &accounts.quote_mint, &quote_token_program),
            false,
        ),
        AccountMeta::new(accounts.pool_base_token_account, false),
        AccountMeta::new(accounts.pool_quote_token_account, false),
        AccountMeta::new_readonly(pump_amm::PROTOCOL_FEE_RECIPIENT, false),
        AccountMeta::new(pump_amm::protocol_fee_recipient_ata(&accounts.quote_mint), false),
        AccountMeta::new_readonly(accounts.base_token_program, false),
        AccountMeta::new_readonly(quote_token_program, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(associated_token_program(), false),
        AccountMeta::new_readonly(pump_amm::event_authority(), false),
        AccountMeta::new_readonly(pump_amm::PROGRAM_ID, false),
        AccountMeta::new(
            pump_amm::coin_creator_vault_ata(&accounts.coin_creator, &accounts.quote_mint),
            false,
        ),
        AccountMeta::new_readonly(
            pump_amm::coin_creator_vault_authority(&accounts.coin_creator),
            false,
        ),
    ]
}
