//! Execution controller
//!
//! Drives one order through `QUOTING → BUILDING → SUBMITTED → CONFIRMING` per attempt.
//! A failed attempt either retries on the same venue with fresh state and escalated
//! slippage and fee, falls through to the next venue in [`VenuePriority`] order, or
//! aborts the order when the error cannot be fixed by trying again.
//!
//! Attempts for one order are strictly sequential. Independent orders (one per wallet)
//! run concurrently through [`ExecutionController::execute_batch`].

pub mod errors;
pub mod schedule;

pub use errors::{classify_program_error, Disposition, ErrorKind, ExecutionError};

use crate::aggregator::{self, AggregatorClient, AggregatorQuote};
use crate::codec::TokenAccount;
use crate::config::{ExecutionConfig, VenuesConfig};
use crate::discovery::{VenueDiscovery, VenueSnapshot};
use crate::ledger::{Commitment, LedgerClient, SignatureState};
use crate::metrics::{metrics, Timer};
use crate::observability::CorrelationId;
use crate::quote::{price_impact_bps, quote_trade, QuoteError};
use crate::tx_builder::{
    accounts::associated_token_address, assemble_transaction, plan_trade, TradeParams, TransactionBuilderError,
};
use crate::types::{Quote, TradeRequest, TradeSide, Venue, VenuePriority};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, debug_span, info, info_span, warn, Instrument};

/// Where an attempt was when it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStage {
    #[default]
    Quoting,
    Building,
    Submitted,
    Confirming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Confirmed,
    Failed {
        stage: ExecutionStage,
        kind: ErrorKind,
        message: String,
    },
}

/// One retry or fallback step, kept for telemetry
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionAttempt {
    pub venue: Venue,
    /// Order-wide attempt number, starting at 0
    pub attempt: u32,
    pub slippage_bps: u16,
    pub priority_fee_micro: u64,
    #[serde(serialize_with = "display_opt")]
    pub signature: Option<Signature>,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Result handed back to callers
#[derive(Debug, Clone, Serialize)]
pub struct TradeResult {
    pub success: bool,
    #[serde(serialize_with = "display_opt")]
    pub signature: Option<Signature>,
    /// Venue that filled the order, or the last venue attempted on failure
    pub venue: Option<Venue>,
    /// Output amount quoted for the confirmed attempt
    pub realized_amount: Option<u64>,
    pub error: Option<TradeError>,
    pub attempts: Vec<ExecutionAttempt>,
    pub correlation_id: CorrelationId,
}

fn display_opt<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: std::fmt::Display,
{
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_none(),
    }
}

/// Priced attempt together with what is needed to build it
enum Priced {
    OnChain { snapshot: VenueSnapshot, quote: Quote },
    Relay { route: AggregatorQuote, quote: Quote },
}

impl Priced {
    fn quote(&self) -> &Quote {
        match self {
            Priced::OnChain { quote, .. } | Priced::Relay { quote, .. } => quote,
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    stage: ExecutionStage,
    slippage_bps: u16,
    priority_fee_micro: u64,
    signature: Option<Signature>,
}

impl Progress {
    fn finish(self, venue: Venue, attempt: u32, result: Result<(), &ExecutionError>) -> ExecutionAttempt {
        let outcome = match result {
            Ok(()) => AttemptOutcome::Confirmed,
            Err(err) => AttemptOutcome::Failed {
                stage: self.stage,
                kind: err.kind(),
                message: err.to_string(),
            },
        };
        ExecutionAttempt {
            venue,
            attempt,
            slippage_bps: self.slippage_bps,
            priority_fee_micro: self.priority_fee_micro,
            signature: self.signature,
            outcome,
        }
    }
}

struct Settled {
    venue: Venue,
    signature: Signature,
    realized_amount: u64,
}

struct Failure {
    venue: Option<Venue>,
    error: ExecutionError,
}

impl Failure {
    fn new(venue: Option<Venue>, error: impl Into<ExecutionError>) -> Self {
        Self {
            venue,
            error: error.into(),
        }
    }
}

pub struct ExecutionController {
    ledger: Arc<dyn LedgerClient>,
    discovery: Arc<VenueDiscovery>,
    aggregator: Option<Arc<AggregatorClient>>,
    config: ExecutionConfig,
    venues: VenuesConfig,
}

impl ExecutionController {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        discovery: Arc<VenueDiscovery>,
        config: ExecutionConfig,
        venues: VenuesConfig,
    ) -> Self {
        Self {
            ledger,
            discovery,
            aggregator: None,
            config,
            venues,
        }
    }

    pub fn with_aggregator(mut self, client: Arc<AggregatorClient>) -> Self {
        self.aggregator = Some(client);
        self
    }

    pub fn discovery(&self) -> &Arc<VenueDiscovery> {
        &self.discovery
    }

    fn relay_enabled(&self) -> bool {
        self.aggregator.is_some() && self.discovery.aggregator_enabled()
    }

    /// First-attempt quote on the discovered venue, without trading
    pub async fn quote(&self, request: &TradeRequest) -> Result<Quote, ExecutionError> {
        let venue = self.discovery.discover(&request.mint).await?;
        let mut progress = Progress::default();
        let priced = self.price(request, venue, 0, 0, &mut None, &mut progress).await?;
        Ok(*priced.quote())
    }

    /// Runs one order at full priority
    pub async fn execute(&self, wallet: &Keypair, request: &TradeRequest) -> TradeResult {
        self.execute_ranked(wallet, request, 0).await
    }

    /// Runs independent orders concurrently. The order index is its rank in the fee
    /// schedule; results come back in input order.
    pub async fn execute_batch(&self, orders: &[(Arc<Keypair>, TradeRequest)]) -> Vec<TradeResult> {
        stream::iter(orders.iter().enumerate())
            .map(|(rank, (wallet, request))| self.execute_ranked(wallet.as_ref(), request, rank))
            .buffered(self.config.max_parallel_orders.max(1))
            .collect()
            .await
    }

    pub async fn execute_ranked(&self, wallet: &Keypair, request: &TradeRequest, rank: usize) -> TradeResult {
        let correlation_id = CorrelationId::new();
        let span = info_span!(
            "trade",
            correlation_id = %correlation_id,
            token = %request.mint,
            side = %request.side,
            amount = request.amount,
            rank
        );

        let m = metrics();
        m.trades_total.inc();
        m.active_trades.inc();
        let timer = Timer::with_name("trade_latency_seconds");

        let mut attempts = Vec::new();
        let outcome = self
            .run(wallet, request, rank, &mut attempts)
            .instrument(span.clone())
            .await;

        m.active_trades.dec();
        timer.finish();
        span.in_scope(|| match outcome {
            Ok(settled) => {
                m.trades_success.inc();
                info!(
                    venue = %settled.venue,
                    signature = %settled.signature,
                    attempts = attempts.len(),
                    "Trade confirmed"
                );
                TradeResult {
                    success: true,
                    signature: Some(settled.signature),
                    venue: Some(settled.venue),
                    realized_amount: Some(settled.realized_amount),
                    error: None,
                    attempts,
                    correlation_id,
                }
            }
            Err(failure) => {
                m.trades_failed.inc();
                warn!(
                    venue = ?failure.venue,
                    kind = ?failure.error.kind(),
                    error = %failure.error,
                    attempts = attempts.len(),
                    "Trade failed"
                );
                TradeResult {
                    success: false,
                    signature: None,
                    venue: failure.venue,
                    realized_amount: None,
                    error: Some(TradeError {
                        kind: failure.error.kind(),
                        message: failure.error.to_string(),
                    }),
                    attempts,
                    correlation_id,
                }
            }
        })
    }

    async fn run(
        &self,
        wallet: &Keypair,
        request: &TradeRequest,
        rank: usize,
        attempts: &mut Vec<ExecutionAttempt>,
    ) -> Result<Settled, Failure> {
        if request.amount == 0 {
            return Err(Failure::new(None, QuoteError::InvalidState("amount is zero")));
        }

        let primary = self
            .discovery
            .discover(&request.mint)
            .await
            .map_err(|e| Failure::new(None, e))?;
        let priority = VenuePriority::for_primary(primary, self.relay_enabled());
        debug!(venues = ?priority.venues(), "Venue priority");

        let mut attempt: u32 = 0;
        // Highest slippage already used by this order
        let mut slippage_floor: u16 = 0;
        let mut last_failure = None;

        for (position, &venue) in priority.venues().iter().enumerate() {
            if position > 0 {
                metrics().venue_fallbacks.inc();
                info!(venue = %venue, "Falling back to next venue");
            }

            let ceiling = self.venues.get(venue).max_slippage_bps;
            if ceiling < slippage_floor {
                info!(venue = %venue, ceiling, slippage_floor, "Venue slippage ceiling below order floor, skipping");
                last_failure = Some(Failure::new(
                    Some(venue),
                    ExecutionError::VenueUnavailable {
                        venue,
                        reason: format!("slippage ceiling {ceiling} bps below order floor {slippage_floor} bps"),
                    },
                ));
                continue;
            }
            let mut bias = None;

            for _ in 0..self.config.max_retries {
                if request.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    warn!(venue = %venue, attempt, "Deadline passed, not starting another attempt");
                    return Err(Failure::new(Some(venue), ExecutionError::DeadlineExceeded));
                }

                metrics().execution_attempts.inc();
                let mut progress = Progress::default();
                let result = self
                    .attempt(wallet, request, venue, attempt, rank, slippage_floor, &mut bias, &mut progress)
                    .instrument(debug_span!("attempt", venue = %venue, attempt))
                    .await;
                let number = attempt;
                attempt += 1;
                slippage_floor = slippage_floor.max(progress.slippage_bps);

                let err = match result {
                    Ok(settled) => {
                        attempts.push(progress.finish(venue, number, Ok(())));
                        self.discovery.mark_confirmed(&request.mint, venue);
                        return Ok(settled);
                    }
                    Err(err) => err,
                };
                attempts.push(progress.finish(venue, number, Err(&err)));

                warn!(
                    venue = %venue,
                    attempt = number,
                    kind = ?err.kind(),
                    error = %err,
                    "Attempt failed"
                );
                if err.kind() == ErrorKind::SlippageExceeded {
                    metrics().slippage_failures.inc();
                }

                match err.disposition() {
                    Disposition::Abort => return Err(Failure::new(Some(venue), err)),
                    Disposition::Fallback => {
                        if matches!(err, ExecutionError::VenueUnavailable { .. }) {
                            self.discovery.invalidate(&request.mint);
                        }
                        last_failure = Some(Failure::new(Some(venue), err));
                        break;
                    }
                    Disposition::Retry => {
                        if err.kind() == ErrorKind::RateLimited {
                            tokio::time::sleep(Duration::from_millis(self.config.rate_limit_backoff_ms)).await;
                        }
                        last_failure = Some(Failure::new(Some(venue), err));
                    }
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| Failure::new(Some(primary), ExecutionError::VenueNotFound(request.mint))))
    }

    #[allow(clippy::too_many_arguments)]
    async fn attempt(
        &self,
        wallet: &Keypair,
        request: &TradeRequest,
        venue: Venue,
        attempt: u32,
        rank: usize,
        slippage_floor: u16,
        bias: &mut Option<u32>,
        progress: &mut Progress,
    ) -> Result<Settled, ExecutionError> {
        let user = wallet.pubkey();
        progress.priority_fee_micro = schedule::priority_fee_micro(&self.config, attempt, rank);

        progress.stage = ExecutionStage::Quoting;
        let priced = self.price(request, venue, attempt, slippage_floor, bias, progress).await?;
        let quote = *priced.quote();

        progress.stage = ExecutionStage::Building;
        let tx = self.build(wallet, &user, request, priced, progress.priority_fee_micro).await?;

        progress.stage = ExecutionStage::Submitted;
        let signature = self
            .ledger
            .send_transaction(&tx)
            .await
            .map_err(|e| ExecutionError::from_submission(venue, e))?;
        progress.signature = Some(signature);
        info!(
            signature = %signature,
            slippage_bps = progress.slippage_bps,
            priority_fee = progress.priority_fee_micro,
            min_out = quote.minimum_amount_out,
            "Transaction submitted"
        );

        progress.stage = ExecutionStage::Confirming;
        self.confirm(venue, &signature).await?;

        Ok(Settled {
            venue,
            signature,
            realized_amount: quote.amount_out,
        })
    }

    /// QUOTING: fresh state, escalated slippage, bounded quote.
    ///
    /// Slippage never drops below `slippage_floor`; callers only hand in a floor the
    /// venue's ceiling can honor.
    async fn price(
        &self,
        request: &TradeRequest,
        venue: Venue,
        attempt: u32,
        slippage_floor: u16,
        bias: &mut Option<u32>,
        progress: &mut Progress,
    ) -> Result<Priced, ExecutionError> {
        let venue_config = self.venues.get(venue);

        if venue == Venue::Aggregator {
            let relay = self.aggregator.as_ref().ok_or_else(|| ExecutionError::VenueUnavailable {
                venue,
                reason: "aggregator client not configured".to_string(),
            })?;
            progress.slippage_bps =
                schedule::slippage_bps(&self.config, attempt, 0, venue_config.max_slippage_bps).max(slippage_floor);
            let route = relay
                .quote(&request.mint, request.side, request.amount, progress.slippage_bps)
                .await?;
            let quote = route.to_quote()?;
            return Ok(Priced::Relay { route, quote });
        }

        let snapshot = self.discovery.load_state(&request.mint, venue).await?;
        let bias = *bias.get_or_insert_with(|| {
            schedule::liquidity_bias(&self.config, snapshot.state.quote_liquidity())
        });
        progress.slippage_bps =
            schedule::slippage_bps(&self.config, attempt, bias, venue_config.max_slippage_bps).max(slippage_floor);

        let quote = quote_trade(
            venue,
            &snapshot.state,
            request.side,
            request.amount,
            venue_config.fee_bps,
            progress.slippage_bps,
            self.config.slippage_pad_bps,
        )?;
        debug!(
            amount_out = quote.amount_out,
            min_out = quote.minimum_amount_out,
            slippage_bps = quote.slippage_bps,
            liquidity_bias = bias,
            impact_bps = price_impact_bps(&snapshot.state, request.side, quote.amount_in, quote.amount_out),
            "Quoted"
        );
        Ok(Priced::OnChain { snapshot, quote })
    }

    /// BUILDING: balance check, then a signed transaction
    async fn build(
        &self,
        wallet: &Keypair,
        user: &Pubkey,
        request: &TradeRequest,
        priced: Priced,
        priority_fee_micro: u64,
    ) -> Result<VersionedTransaction, ExecutionError> {
        match priced {
            Priced::OnChain { snapshot, quote } => {
                let (_, token_program) = snapshot.accounts.base();
                self.check_balance(user, request, &token_program).await?;

                let params = TradeParams {
                    side: request.side,
                    amount_in: request.amount,
                    minimum_amount_out: quote.minimum_amount_out,
                    compute_unit_limit: self.config.compute_unit_limit,
                    priority_fee_micro,
                };
                let plan = plan_trade(&snapshot.accounts, user, &params)?;
                let blockhash = self
                    .ledger
                    .get_latest_blockhash()
                    .await
                    .map_err(|e| TransactionBuilderError::blockhash_unavailable(e.to_string()))?;
                Ok(assemble_transaction(wallet, &plan.instructions, blockhash)?)
            }
            Priced::Relay { route, .. } => {
                let token_program = self.discovery.mint_token_program(&request.mint).await?;
                self.check_balance(user, request, &token_program).await?;

                let relay = self.aggregator.as_ref().ok_or_else(|| ExecutionError::VenueUnavailable {
                    venue: Venue::Aggregator,
                    reason: "aggregator client not configured".to_string(),
                })?;
                let unsigned = relay.swap_transaction(&route, user, Some(priority_fee_micro)).await?;
                Ok(aggregator::sign_transaction(unsigned, wallet)?)
            }
        }
    }

    /// Buys need the amount plus the fee reserve in lamports; sells need the tokens
    async fn check_balance(
        &self,
        user: &Pubkey,
        request: &TradeRequest,
        token_program: &Pubkey,
    ) -> Result<(), ExecutionError> {
        let (required, available) = match request.side {
            TradeSide::Buy => {
                let lamports = self
                    .ledger
                    .get_account(user, Commitment::Confirmed)
                    .await?
                    .map(|account| account.lamports)
                    .unwrap_or(0);
                (request.amount.saturating_add(self.config.fee_reserve_lamports), lamports)
            }
            TradeSide::Sell => {
                let ata = associated_token_address(user, &request.mint, token_program);
                let tokens = match self.ledger.get_account(&ata, Commitment::Confirmed).await? {
                    Some(account) => TokenAccount::decode(&account.data)?.amount,
                    None => 0,
                };
                (request.amount, tokens)
            }
        };

        if available < required {
            return Err(ExecutionError::InsufficientBalance { required, available });
        }
        Ok(())
    }

    /// CONFIRMING: polls until a terminal status or the per-attempt timeout
    async fn confirm(&self, venue: Venue, signature: &Signature) -> Result<(), ExecutionError> {
        let timer = Timer::with_name("confirmation_latency_seconds");
        let poll_interval = self.config.poll_interval();
        let deadline = Instant::now() + self.config.confirm_timeout();

        loop {
            match self.ledger.get_signature_status(signature).await {
                Ok(SignatureState::Confirmed | SignatureState::Finalized) => {
                    timer.finish();
                    return Ok(());
                }
                Ok(SignatureState::Failed(message)) => return Err(classify_program_error(venue, &message)),
                Ok(SignatureState::Pending) => {}
                Err(e) => debug!(signature = %signature, error = %e, "Status poll failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ExecutionError::Timeout {
                    signature: signature.to_string(),
                    timeout_ms: self.config.confirm_timeout_ms,
                });
            }
            tokio::time::sleep((deadline - now).min(poll_interval)).await;
        }
    }
}
