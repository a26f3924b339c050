//! Constant-product quote engine
//!
//! Pure integer math shared by every on-chain venue. Both curve and pool states are priced
//! with `x * y = k`; they differ only in which reserves are virtual and which bound the
//! trade. All intermediate products are carried in `u128`.
//!
//! Rounding always favours the protocol: the fee is rounded up and the post-trade output
//! reserve is `k / (reserve_in + net_in) + 1`, so a projected trade never leaves the
//! product lower than it found it.

use crate::codec::{AmmPoolState, BondingCurveState, PoolState};
use crate::types::{Quote, TradeSide, Venue};
use thiserror::Error;

pub const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// Zero input, zero reserve or a projection that does not fit the reserve type
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Quote produces zero output")]
    ZeroOutput,
}

/// Quotes spending `amount_in` of the quote asset. Returns the base amount received and
/// the projected state after the trade.
pub fn quote_buy(
    state: &PoolState,
    amount_in: u64,
    fee_bps: u16,
) -> Result<(u64, PoolState), QuoteError> {
    let (base, quote) = state.pricing_reserves();
    ensure_tradeable(amount_in, base, quote)?;

    let net_in = amount_after_fee(amount_in, fee_bps)?;
    let mut amount_out = swap_out(quote, base, net_in)?;

    let projected = match state {
        PoolState::BondingCurve(curve) => {
            amount_out = amount_out.min(curve.real_base_reserve);
            if amount_out == 0 {
                return Err(QuoteError::ZeroOutput);
            }
            PoolState::BondingCurve(BondingCurveState {
                virtual_base_reserve: sub(curve.virtual_base_reserve, amount_out)?,
                virtual_quote_reserve: add(curve.virtual_quote_reserve, net_in)?,
                real_base_reserve: sub(curve.real_base_reserve, amount_out)?,
                real_quote_reserve: add(curve.real_quote_reserve, net_in)?,
                ..*curve
            })
        }
        PoolState::Pool(pool) => PoolState::Pool(AmmPoolState {
            base_reserve: sub(pool.base_reserve, amount_out)?,
            quote_reserve: add(pool.quote_reserve, net_in)?,
            ..*pool
        }),
    };

    Ok((amount_out, projected))
}

/// Quotes selling `amount_in` base tokens. The input is clamped to the real base reserve
/// and the output to the real quote reserve.
pub fn quote_sell(
    state: &PoolState,
    amount_in: u64,
    fee_bps: u16,
) -> Result<(u64, PoolState), QuoteError> {
    let (base, quote) = state.pricing_reserves();
    ensure_tradeable(amount_in, base, quote)?;

    let amount_in = match state {
        PoolState::BondingCurve(curve) => amount_in.min(curve.real_base_reserve),
        PoolState::Pool(pool) => amount_in.min(pool.base_reserve),
    };
    if amount_in == 0 {
        return Err(QuoteError::InvalidState("no real base reserve to sell into"));
    }

    let net_in = amount_after_fee(amount_in, fee_bps)?;
    let mut amount_out = swap_out(base, quote, net_in)?;

    let projected = match state {
        PoolState::BondingCurve(curve) => {
            amount_out = amount_out.min(curve.real_quote_reserve);
            if amount_out == 0 {
                return Err(QuoteError::ZeroOutput);
            }
            PoolState::BondingCurve(BondingCurveState {
                virtual_base_reserve: add(curve.virtual_base_reserve, net_in)?,
                virtual_quote_reserve: sub(curve.virtual_quote_reserve, amount_out)?,
                real_base_reserve: add(curve.real_base_reserve, net_in)?,
                real_quote_reserve: sub(curve.real_quote_reserve, amount_out)?,
                ..*curve
            })
        }
        PoolState::Pool(pool) => PoolState::Pool(AmmPoolState {
            base_reserve: add(pool.base_reserve, net_in)?,
            quote_reserve: sub(pool.quote_reserve, amount_out)?,
            ..*pool
        }),
    };

    Ok((amount_out, projected))
}

/// Slippage-bounded minimum output: `amount_out * (10000 - slippage - pad) / 10000`
pub fn min_amount_out(amount_out: u64, slippage_bps: u16, pad_bps: u16) -> Result<u64, QuoteError> {
    let discount = (slippage_bps as u64 + pad_bps as u64).min(BPS_DENOMINATOR);
    let min_out = (amount_out as u128 * (BPS_DENOMINATOR - discount) as u128
        / BPS_DENOMINATOR as u128) as u64;
    if min_out == 0 {
        return Err(QuoteError::ZeroOutput);
    }
    Ok(min_out)
}

/// Distance between the execution price and the spot price, in basis points
pub fn price_impact_bps(state: &PoolState, side: TradeSide, amount_in: u64, amount_out: u64) -> u64 {
    let (base, quote) = state.pricing_reserves();
    let (reserve_in, reserve_out) = match side {
        TradeSide::Buy => (quote, base),
        TradeSide::Sell => (base, quote),
    };
    if reserve_in == 0 || amount_in == 0 {
        return 0;
    }
    let spot_out = amount_in as u128 * reserve_out as u128 / reserve_in as u128;
    if spot_out == 0 {
        return 0;
    }
    let shortfall = spot_out.saturating_sub(amount_out as u128);
    (shortfall * BPS_DENOMINATOR as u128 / spot_out) as u64
}

/// Full quote for one venue attempt
pub fn quote_trade(
    venue: Venue,
    state: &PoolState,
    side: TradeSide,
    amount_in: u64,
    fee_bps: u16,
    slippage_bps: u16,
    pad_bps: u16,
) -> Result<Quote, QuoteError> {
    let (amount_out, _) = match side {
        TradeSide::Buy => quote_buy(state, amount_in, fee_bps)?,
        TradeSide::Sell => quote_sell(state, amount_in, fee_bps)?,
    };
    Ok(Quote {
        amount_in,
        amount_out,
        minimum_amount_out: min_amount_out(amount_out, slippage_bps, pad_bps)?,
        slippage_bps,
        venue,
    })
}

fn ensure_tradeable(amount_in: u64, base: u64, quote: u64) -> Result<(), QuoteError> {
    if amount_in == 0 {
        return Err(QuoteError::InvalidState("amount_in is zero"));
    }
    if base == 0 || quote == 0 {
        return Err(QuoteError::InvalidState("zero reserve"));
    }
    Ok(())
}

/// Input left after the protocol fee, fee rounded up
fn amount_after_fee(amount_in: u64, fee_bps: u16) -> Result<u64, QuoteError> {
    let fee_bps = (fee_bps as u128).min(BPS_DENOMINATOR as u128);
    let fee = (amount_in as u128 * fee_bps).div_ceil(BPS_DENOMINATOR as u128) as u64;
    match amount_in - fee {
        0 => Err(QuoteError::ZeroOutput),
        net => Ok(net),
    }
}

fn swap_out(reserve_in: u64, reserve_out: u64, net_in: u64) -> Result<u64, QuoteError> {
    let k = reserve_in as u128 * reserve_out as u128;
    let new_reserve_in = reserve_in as u128 + net_in as u128;
    let new_reserve_out = k / new_reserve_in + 1;
    match (reserve_out as u128).checked_sub(new_reserve_out) {
        Some(out) if out > 0 => Ok(out as u64),
        _ => Err(QuoteError::ZeroOutput),
    }
}

fn add(a: u64, b: u64) -> Result<u64, QuoteError> {
    a.checked_add(b)
        .ok_or(QuoteError::InvalidState("projected reserve overflows u64"))
}

fn sub(a: u64, b: u64) -> Result<u64, QuoteError> {
    a.checked_sub(b)
        .ok_or(QuoteError::InvalidState("projected reserve underflows"))
}
