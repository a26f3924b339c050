//! Common types used throughout the engine

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

/// Concrete trading venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    /// pump.fun bonding curve, native SOL quoted
    PumpCurve,
    /// Raydium LaunchLab bonding curve, WSOL quoted
    LaunchpadCurve,
    /// PumpSwap constant-product pool
    PumpAmm,
    /// HTTP quote/swap relay
    Aggregator,
}

/// Pricing mechanism behind a venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenueKind {
    BondingCurve,
    Pool,
    Aggregator,
}

impl Venue {
    pub const ALL: [Venue; 4] = [
        Venue::PumpCurve,
        Venue::LaunchpadCurve,
        Venue::PumpAmm,
        Venue::Aggregator,
    ];

    pub fn kind(&self) -> VenueKind {
        match self {
            Venue::PumpCurve | Venue::LaunchpadCurve => VenueKind::BondingCurve,
            Venue::PumpAmm => VenueKind::Pool,
            Venue::Aggregator => VenueKind::Aggregator,
        }
    }

    /// Whether trades settle in wrapped SOL held in the wallet's WSOL ATA
    pub fn uses_wsol(&self) -> bool {
        matches!(self, Venue::LaunchpadCurve | Venue::PumpAmm)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::PumpCurve => "pump_curve",
            Venue::LaunchpadCurve => "launchpad_curve",
            Venue::PumpAmm => "pump_amm",
            Venue::Aggregator => "aggregator",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Venue::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown venue: {}", s))
    }
}

/// Trade direction relative to the token: buys spend SOL, sells spend tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.write_str("buy"),
            TradeSide::Sell => f.write_str("sell"),
        }
    }
}

impl FromStr for TradeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeSide::Buy),
            "sell" => Ok(TradeSide::Sell),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

/// Price quote for one attempt. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub amount_in: u64,
    pub amount_out: u64,
    pub minimum_amount_out: u64,
    pub slippage_bps: u16,
    pub venue: Venue,
}

/// One logical order: sell `amount` tokens or spend `amount` lamports
#[derive(Debug, Clone)]
pub struct TradeRequest {
    pub mint: Pubkey,
    pub side: TradeSide,
    pub amount: u64,
    /// No new attempt starts once this instant has passed
    pub deadline: Option<tokio::time::Instant>,
}

impl TradeRequest {
    pub fn new(mint: Pubkey, side: TradeSide, amount: u64) -> Self {
        Self {
            mint,
            side,
            amount,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: tokio::time::Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Ordered venues to try for one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenuePriority(Vec<Venue>);

impl VenuePriority {
    /// Active curves try the curve first and fall back to the pool the curve graduates
    /// into; pooled and unknown tokens go pool first, then the relay.
    pub fn for_primary(primary: Venue, aggregator_enabled: bool) -> Self {
        let mut order = match primary {
            Venue::PumpCurve => vec![Venue::PumpCurve, Venue::PumpAmm, Venue::Aggregator],
            Venue::LaunchpadCurve => vec![Venue::LaunchpadCurve, Venue::Aggregator],
            Venue::PumpAmm => vec![Venue::PumpAmm, Venue::Aggregator],
            Venue::Aggregator => vec![Venue::Aggregator],
        };
        if !aggregator_enabled {
            order.retain(|v| *v != Venue::Aggregator);
        }
        Self(order)
    }

    pub fn venues(&self) -> &[Venue] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_kind() {
        assert_eq!(Venue::PumpCurve.kind(), VenueKind::BondingCurve);
        assert_eq!(Venue::LaunchpadCurve.kind(), VenueKind::BondingCurve);
        assert_eq!(Venue::PumpAmm.kind(), VenueKind::Pool);
        assert_eq!(Venue::Aggregator.kind(), VenueKind::Aggregator);
    }

    #[test]
    fn test_venue_parse() {
        for venue in Venue::ALL {
            assert_eq!(venue.to_string().parse::<Venue>().unwrap(), venue);
        }
        assert!("raydium".parse::<Venue>().is_err());
        assert_eq!("SELL".parse::<TradeSide>().unwrap(), TradeSide::Sell);
    }

    #[test]
    fn test_priority_order() {
        let p = VenuePriority::for_primary(Venue::PumpCurve, true);
        assert_eq!(
            p.venues(),
            &[Venue::PumpCurve, Venue::PumpAmm, Venue::Aggregator]
        );

        let p = VenuePriority::for_primary(Venue::PumpAmm, false);
        assert_eq!(p.venues(), &[Venue::PumpAmm]);

        let p = VenuePriority::for_primary(Venue::Aggregator, false);
        assert!(p.is_empty());
    }
}
