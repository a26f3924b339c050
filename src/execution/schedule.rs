//! Slippage and priority-fee escalation
//!
//! `attempt` is the order-wide attempt counter, so escalation carries across venue
//! fallbacks. Slippage is capped by the venue's ceiling and fees by the configured range.

use crate::config::ExecutionConfig;

const MAX_BPS: u32 = 10_000;

/// Slippage bonuses applied up front for thin liquidity
pub fn liquidity_bias(config: &ExecutionConfig, quote_liquidity: u64) -> u32 {
    if quote_liquidity < config.low_liquidity_lamports {
        2
    } else if quote_liquidity < config.medium_liquidity_lamports {
        1
    } else {
        0
    }
}

/// `base + bonus * (attempt + bias)`, capped at `venue_max_bps`
pub fn slippage_bps(config: &ExecutionConfig, attempt: u32, bias: u32, venue_max_bps: u16) -> u16 {
    let steps = attempt.saturating_add(bias);
    let raw = (config.base_slippage_bps as u32)
        .saturating_add((config.slippage_bonus_bps as u32).saturating_mul(steps));
    raw.min(venue_max_bps as u32).min(MAX_BPS) as u16
}

/// `base * multiplier^attempt`, discounted by parallel rank and clamped to `[min, max]`.
///
/// Rank 0 pays the full fee; each later rank in a batch takes `rank_discount_pct` percent
/// off so parallel orders from the same operator do not outbid each other.
pub fn priority_fee_micro(config: &ExecutionConfig, attempt: u32, rank: usize) -> u64 {
    let exponent = attempt.min(i32::MAX as u32) as i32;
    let escalated = config.base_priority_fee_micro as f64 * config.fee_multiplier.powi(exponent);
    let discount = 100.0 / (100.0 + rank as f64 * config.rank_discount_pct as f64);
    let fee = (escalated * discount) as u64;
    fee.max(config.min_priority_fee_micro)
        .min(config.max_priority_fee_micro)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExecutionConfig {
        ExecutionConfig {
            base_slippage_bps: 3_500,
            slippage_bonus_bps: 1_000,
            base_priority_fee_micro: 100_000,
            min_priority_fee_micro: 10_000,
            max_priority_fee_micro: 1_000_000,
            fee_multiplier: 1.5,
            rank_discount_pct: 10,
            low_liquidity_lamports: 5_000_000_000,
            medium_liquidity_lamports: 20_000_000_000,
            ..ExecutionConfig::default()
        }
    }

    #[test]
    fn test_liquidity_bias_thresholds() {
        let c = config();
        assert_eq!(liquidity_bias(&c, 1_000_000_000), 2);
        assert_eq!(liquidity_bias(&c, 5_000_000_000), 1);
        assert_eq!(liquidity_bias(&c, 19_999_999_999), 1);
        assert_eq!(liquidity_bias(&c, 20_000_000_000), 0);
    }

    #[test]
    fn test_slippage_steps_and_cap() {
        let c = config();
        assert_eq!(slippage_bps(&c, 0, 0, 9_500), 3_500);
        assert_eq!(slippage_bps(&c, 1, 0, 9_500), 4_500);
        assert_eq!(slippage_bps(&c, 0, 2, 9_500), 5_500);
        assert_eq!(slippage_bps(&c, 10, 0, 7_000), 7_000);
        assert_eq!(slippage_bps(&c, u32::MAX, u32::MAX, 10_000), 10_000);
    }

    #[test]
    fn test_priority_fee_escalates() {
        let c = config();
        assert_eq!(priority_fee_micro(&c, 0, 0), 100_000);
        assert_eq!(priority_fee_micro(&c, 1, 0), 150_000);
        assert_eq!(priority_fee_micro(&c, 2, 0), 225_000);
        assert_eq!(priority_fee_micro(&c, 20, 0), 1_000_000);
    }

    #[test]
    fn test_priority_fee_rank_discount() {
        let c = config();
        // 100_000 * 100 / 110
        assert_eq!(priority_fee_micro(&c, 0, 1), 90_909);
        assert!(priority_fee_micro(&c, 0, 5) < priority_fee_micro(&c, 0, 1));
        assert_eq!(priority_fee_micro(&c, 0, 10_000), 10_000);
    }

    #[test]
    fn test_escalation_never_decreases() {
        let c = config();
        for rank in [0usize, 3] {
            let mut last_fee = 0;
            let mut last_slippage = 0;
            for attempt in 0..12 {
                let fee = priority_fee_micro(&c, attempt, rank);
                let slippage = slippage_bps(&c, attempt, 1, 9_000);
                assert!(fee >= last_fee && fee <= c.max_priority_fee_micro);
                assert!(slippage >= last_slippage && slippage <= 9_000);
                last_fee = fee;
                last_slippage = slippage;
            }
        }
    }
}
