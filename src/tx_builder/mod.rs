//! Transaction builder
//!
//! One encoder per on-chain venue plus the support instructions every trade needs.
//!
//! ## Architecture
//! - **accounts**: program ids and PDA derivations
//! - **pump_curve / launchpad / pump_amm**: byte-exact trade instruction encoders
//! - **support**: ATA creation and SOL wrap/unwrap
//! - **instructions**: compute-budget-first planning and order validation
//! - **errors**: builder error taxonomy
//!
//! [`build_trade`] encodes the single venue instruction; [`plan_trade`] wraps it with
//! compute budget, setup and cleanup; [`assemble_transaction`] compiles and signs a v0
//! transaction.

pub mod accounts;
pub mod errors;
pub mod instructions;
pub mod launchpad;
pub mod pump_amm;
pub mod pump_curve;
pub mod support;

pub use errors::TransactionBuilderError;
pub use instructions::{plan_trade_instructions, sanity_check_ix_order, InstructionPlan};
pub use launchpad::LaunchpadAccounts;
pub use pump_amm::PumpAmmAccounts;
pub use pump_curve::PumpCurveAccounts;

use crate::types::{TradeSide, Venue};
use accounts::{token_program, WSOL_MINT};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::VersionedTransaction,
};
use tracing::debug;

/// Per-venue account set resolved by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueAccounts {
    PumpCurve(PumpCurveAccounts),
    LaunchpadCurve(LaunchpadAccounts),
    PumpAmm(PumpAmmAccounts),
}

impl VenueAccounts {
    pub fn venue(&self) -> Venue {
        match self {
            VenueAccounts::PumpCurve(_) => Venue::PumpCurve,
            VenueAccounts::LaunchpadCurve(_) => Venue::LaunchpadCurve,
            VenueAccounts::PumpAmm(_) => Venue::PumpAmm,
        }
    }

    /// The traded token and its token program
    pub fn base(&self) -> (Pubkey, Pubkey) {
        match self {
            VenueAccounts::PumpCurve(a) => (a.mint, a.token_program),
            VenueAccounts::LaunchpadCurve(a) => (a.base_mint, a.base_token_program),
            VenueAccounts::PumpAmm(a) => (a.base_mint, a.base_token_program),
        }
    }
}

/// Knobs for one built transaction
#[derive(Debug, Clone, Copy)]
pub struct TradeParams {
    pub side: TradeSide,
    pub amount_in: u64,
    pub minimum_amount_out: u64,
    pub compute_unit_limit: u32,
    pub priority_fee_micro: u64,
}

/// Encodes the venue trade instruction
pub fn build_trade(
    venue: Venue,
    side: TradeSide,
    accounts: &VenueAccounts,
    user: &Pubkey,
    amount_in: u64,
    minimum_amount_out: u64,
) -> Result<Instruction, TransactionBuilderError> {
    if accounts.venue() != venue {
        return Err(TransactionBuilderError::instruction_failed(
            venue.as_str(),
            format!("accounts resolved for {}", accounts.venue()),
        ));
    }

    let ix = match (accounts, side) {
        (VenueAccounts::PumpCurve(a), TradeSide::Buy) => {
            pump_curve::buy(a, user, amount_in, minimum_amount_out)
        }
        (VenueAccounts::PumpCurve(a), TradeSide::Sell) => {
            pump_curve::sell(a, user, amount_in, minimum_amount_out)
        }
        (VenueAccounts::LaunchpadCurve(a), TradeSide::Buy) => {
            launchpad::buy(a, user, amount_in, minimum_amount_out)
        }
        (VenueAccounts::LaunchpadCurve(a), TradeSide::Sell) => {
            launchpad::sell(a, user, amount_in, minimum_amount_out)
        }
        (VenueAccounts::PumpAmm(a), TradeSide::Buy) => {
            pump_amm::buy(a, user, amount_in, minimum_amount_out)
        }
        (VenueAccounts::PumpAmm(a), TradeSide::Sell) => {
            pump_amm::sell(a, user, amount_in, minimum_amount_out)
        }
    };
    Ok(ix)
}

/// Full instruction list for one trade: compute budget, ATA setup, SOL wrapping,
/// the trade itself and WSOL cleanup.
pub fn plan_trade(
    accounts: &VenueAccounts,
    user: &Pubkey,
    params: &TradeParams,
) -> Result<InstructionPlan, TransactionBuilderError> {
    let venue = accounts.venue();
    let (mint, mint_program) = accounts.base();

    let mut setup = Vec::with_capacity(4);
    let mut cleanup = Vec::with_capacity(1);

    if params.side == TradeSide::Buy {
        setup.push(support::create_ata_idempotent(user, user, &mint, &mint_program));
    }
    if venue.uses_wsol() {
        setup.push(support::create_ata_idempotent(user, user, &WSOL_MINT, &token_program()));
        if params.side == TradeSide::Buy {
            setup.extend(support::wrap_sol(user, params.amount_in)?);
        }
        cleanup.push(support::unwrap_sol(user)?);
    }

    let trade_ix = build_trade(
        venue,
        params.side,
        accounts,
        user,
        params.amount_in,
        params.minimum_amount_out,
    )?;

    let plan = plan_trade_instructions(
        params.compute_unit_limit,
        params.priority_fee_micro,
        setup,
        trade_ix,
        cleanup,
    )?;
    sanity_check_ix_order(&plan.instructions, plan.trade_index)?;

    debug!(
        venue = %venue,
        side = %params.side,
        instructions = plan.instructions.len(),
        "Planned trade instructions"
    );
    Ok(plan)
}

/// Compiles a v0 message and signs it with the payer
pub fn assemble_transaction(
    payer: &Keypair,
    instructions: &[Instruction],
    blockhash: Hash,
) -> Result<VersionedTransaction, TransactionBuilderError> {
    let message = v0::Message::try_compile(&payer.pubkey(), instructions, &[], blockhash)
        .map_err(|e| TransactionBuilderError::Compile(e.to_string()))?;
    VersionedTransaction::try_new(VersionedMessage::V0(message), &[payer])
        .map_err(|e| TransactionBuilderError::Signing(e.to_string()))
}
