//! Supporting instructions around a trade: token accounts and SOL wrapping

use super::accounts::{associated_token_address, token_program, WSOL_MINT};
use super::errors::TransactionBuilderError;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_instruction};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;

/// Creates `owner`'s ATA for `mint` if missing. `token_program` must be the mint's owner
/// so Token-2022 mints resolve to the right address.
pub fn create_ata_idempotent(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, token_program)
}

pub fn wsol_account(owner: &Pubkey) -> Pubkey {
    associated_token_address(owner, &WSOL_MINT, &token_program())
}

/// Moves `lamports` into the WSOL ATA and syncs its token balance
pub fn wrap_sol(owner: &Pubkey, lamports: u64) -> Result<Vec<Instruction>, TransactionBuilderError> {
    let wsol = wsol_account(owner);
    let sync = spl_token::instruction::sync_native(&token_program(), &wsol)
        .map_err(|e| TransactionBuilderError::instruction_failed("spl_token", e.to_string()))?;
    Ok(vec![system_instruction::transfer(owner, &wsol, lamports), sync])
}

/// Closes the WSOL ATA, returning the wrapped balance and rent to the owner
pub fn unwrap_sol(owner: &Pubkey) -> Result<Instruction, TransactionBuilderError> {
    let wsol = wsol_account(owner);
    spl_token::instruction::close_account(&token_program(), &wsol, owner, owner, &[])
        .map_err(|e| TransactionBuilderError::instruction_failed("spl_token", e.to_string()))
}
