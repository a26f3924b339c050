//! Instruction planning and ordering validation
//!
//! Every trade transaction has the same shape:
//! 1. Compute budget instructions (CU limit, priority fee)
//! 2. Setup: idempotent ATA creation, SOL wrapping
//! 3. The venue trade instruction
//! 4. Cleanup: closing the WSOL account

use crate::tx_builder::errors::TransactionBuilderError;
use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

// ComputeBudgetInstruction variant tags
const SET_COMPUTE_UNIT_LIMIT: u8 = 2;
const SET_COMPUTE_UNIT_PRICE: u8 = 3;
// spl-token CloseAccount
const CLOSE_ACCOUNT: u8 = 9;

/// Ordered instructions plus the position of the trade instruction
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    pub instructions: Vec<Instruction>,
    pub trade_index: usize,
}

impl InstructionPlan {
    pub fn trade_instruction(&self) -> Option<&Instruction> {
        self.instructions.get(self.trade_index)
    }
}

/// Plans a trade transaction. A zero `cu_limit` or `prio_fee` skips that instruction.
pub fn plan_trade_instructions(
    cu_limit: u32,
    prio_fee: u64,
    setup: Vec<Instruction>,
    trade_ix: Instruction,
    cleanup: Vec<Instruction>,
) -> Result<InstructionPlan, TransactionBuilderError> {
    if trade_ix.accounts.is_empty() {
        return Err(TransactionBuilderError::Configuration(
            "Trade instruction has no accounts".to_string(),
        ));
    }

    let mut instructions = Vec::with_capacity(3 + setup.len() + cleanup.len());

    if cu_limit > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(cu_limit));
    }
    if prio_fee > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(prio_fee));
    }

    instructions.extend(setup);
    let trade_index = instructions.len();
    instructions.push(trade_ix);
    instructions.extend(cleanup);

    Ok(InstructionPlan {
        instructions,
        trade_index,
    })
}

fn is_compute_budget(ix: &Instruction) -> bool {
    ix.program_id == solana_sdk::compute_budget::id()
}

/// Validate instruction ordering (debug/test only)
///
/// Compute budget instructions must form a prefix with at most one limit and one price,
/// the trade must not be a budget instruction, and no token account may be closed before
/// the trade runs.
#[cfg(debug_assertions)]
pub fn sanity_check_ix_order(
    instructions: &[Instruction],
    trade_index: usize,
) -> Result<(), TransactionBuilderError> {
    if instructions.is_empty() {
        return Err(TransactionBuilderError::invalid_order("Instruction list is empty"));
    }

    let Some(trade) = instructions.get(trade_index) else {
        return Err(TransactionBuilderError::invalid_order(format!(
            "Trade index {} out of bounds ({} instructions)",
            trade_index,
            instructions.len()
        )));
    };
    if is_compute_budget(trade) {
        return Err(TransactionBuilderError::invalid_order(
            "Trade position holds a compute budget instruction",
        ));
    }

    let prefix_len = instructions
        .iter()
        .take_while(|ix| is_compute_budget(ix))
        .count();
    if let Some(idx) = instructions
        .iter()
        .skip(prefix_len)
        .position(is_compute_budget)
    {
        return Err(TransactionBuilderError::invalid_order(format!(
            "Compute budget instruction at position {} follows program instructions",
            prefix_len + idx
        )));
    }

    for tag in [SET_COMPUTE_UNIT_LIMIT, SET_COMPUTE_UNIT_PRICE] {
        let count = instructions[..prefix_len]
            .iter()
            .filter(|ix| ix.data.first() == Some(&tag))
            .count();
        if count > 1 {
            return Err(TransactionBuilderError::invalid_order(format!(
                "Duplicate compute budget instruction (tag {})",
                tag
            )));
        }
    }

    let is_close = |ix: &Instruction| {
        ix.program_id == spl_token::id() && ix.data.first() == Some(&CLOSE_ACCOUNT)
    };
    if let Some(idx) = instructions[..trade_index].iter().position(is_close) {
        return Err(TransactionBuilderError::invalid_order(format!(
            "Token account closed at position {} before the trade",
            idx
        )));
    }

    Ok(())
}

/// No-op version of sanity_check_ix_order for release builds
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_ix_order(
    _instructions: &[Instruction],
    _trade_index: usize,
) -> Result<(), TransactionBuilderError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

    fn trade_ix() -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[1, 2, 3, 4],
            vec![AccountMeta::new(Pubkey::new_unique(), false)],
        )
    }

    fn close_ix() -> Instruction {
        let owner = Pubkey::new_unique();
        spl_token::instruction::close_account(
            &spl_token::id(),
            &Pubkey::new_unique(),
            &owner,
            &owner,
            &[],
        )
        .unwrap()
    }

    #[test]
    fn test_plan_orders_budget_setup_trade_cleanup() {
        let setup = vec![trade_ix()];
        let trade = trade_ix();
        let trade_program = trade.program_id;

        let plan = plan_trade_instructions(200_000, 10_000, setup, trade, vec![close_ix()])
            .expect("Should plan instructions");

        assert_eq!(plan.instructions.len(), 5);
        assert_eq!(plan.trade_index, 3);
        assert_eq!(plan.instructions[0].program_id, solana_sdk::compute_budget::id());
        assert_eq!(plan.instructions[1].program_id, solana_sdk::compute_budget::id());
        assert_eq!(plan.trade_instruction().unwrap().program_id, trade_program);
        assert_eq!(plan.instructions[4].program_id, spl_token::id());
        assert!(sanity_check_ix_order(&plan.instructions, plan.trade_index).is_ok());
    }

    #[test]
    fn test_plan_without_compute_budget() {
        let plan = plan_trade_instructions(0, 0, vec![], trade_ix(), vec![])
            .expect("Should plan without compute budget");
        assert_eq!(plan.instructions.len(), 1);
        assert_eq!(plan.trade_index, 0);
    }

    #[test]
    fn test_plan_only_priority_fee() {
        let plan = plan_trade_instructions(0, 10_000, vec![], trade_ix(), vec![]).unwrap();
        assert_eq!(plan.instructions.len(), 2);
        assert_eq!(plan.instructions[0].data[0], SET_COMPUTE_UNIT_PRICE);
    }

    #[test]
    fn test_plan_rejects_empty_trade_accounts() {
        let ix = Instruction::new_with_bytes(Pubkey::new_unique(), &[1], vec![]);
        let result = plan_trade_instructions(200_000, 10_000, vec![], ix, vec![]);
        if let Err(TransactionBuilderError::Configuration(msg)) = result {
            assert!(msg.contains("no accounts"));
        } else {
            panic!("Expected Configuration error");
        }
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_budget_after_program() {
        let instructions = vec![
            trade_ix(),
            ComputeBudgetInstruction::set_compute_unit_price(10_000),
        ];
        let err = sanity_check_ix_order(&instructions, 0).unwrap_err();
        assert!(err.to_string().contains("follows program instructions"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_duplicate_limit() {
        let instructions = vec![
            ComputeBudgetInstruction::set_compute_unit_limit(200_000),
            ComputeBudgetInstruction::set_compute_unit_limit(300_000),
            trade_ix(),
        ];
        let err = sanity_check_ix_order(&instructions, 2).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_close_before_trade() {
        let instructions = vec![close_ix(), trade_ix()];
        let err = sanity_check_ix_order(&instructions, 1).unwrap_err();
        assert!(err.to_string().contains("before the trade"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_bad_index() {
        assert!(sanity_check_ix_order(&[], 0).is_err());
        assert!(sanity_check_ix_order(&[trade_ix()], 3).is_err());
        let budget = vec![ComputeBudgetInstruction::set_compute_unit_limit(1), trade_ix()];
        assert!(sanity_check_ix_order(&budget, 0).is_err());
    }
}
