//! Venue Router - Solana token venue discovery, quoting and execution
//!
//! Tokens launch on a bonding curve, graduate into a constant-product pool and may
//! eventually only be reachable through an aggregator relay. This library resolves
//! where a token trades right now, quotes it with the venue's own integer math and
//! drives the order through retries and venue fallbacks until it confirms or fails.
//!
//! - [`codec`]: on-chain account layouts
//! - [`quote`]: constant-product pricing and slippage bounds
//! - [`discovery`]: probe order and venue cache
//! - [`tx_builder`]: per-venue instruction encoding
//! - [`execution`]: retry/fallback state machine

pub mod aggregator;
pub mod codec;
pub mod config;
pub mod discovery;
pub mod endpoints;
pub mod execution;
pub mod ledger;
pub mod metrics;
pub mod observability;
pub mod quote;
pub mod test_utils;
pub mod tx_builder;
pub mod types;
pub mod wallet;

// Re-export commonly used types
pub use execution::{ExecutionController, TradeResult};
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
pub use types::{Quote, TradeRequest, TradeSide, Venue};
