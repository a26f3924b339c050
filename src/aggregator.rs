//! Swap aggregator relay client
//!
//! Tokens with no on-chain venue the engine understands are routed through a Jupiter-style
//! HTTP relay: `GET /quote` prices the route, `POST /swap` returns a serialized versioned
//! transaction that is re-signed locally. Every request first takes a slot from the shared
//! [`RequestBudget`], so bursts wait instead of tripping the relay's limit.

use crate::ledger::RequestBudget;
use crate::metrics::metrics;
use crate::tx_builder::accounts::WSOL_MINT;
use crate::types::{Quote, TradeSide, Venue};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Keypair, transaction::VersionedTransaction};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug, Clone)]
pub enum AggregatorError {
    #[error("Relay returned HTTP {status} for {endpoint}: {body}")]
    Http {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("Relay transport error: {0}")]
    Transport(String),

    /// The relay has no route between the two mints
    #[error("No route: {0}")]
    NoRoute(String),

    #[error("Malformed relay response: {0}")]
    Malformed(String),

    #[error("Failed to sign relay transaction: {0}")]
    Signing(String),
}

impl AggregatorError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AggregatorError::Transport(_) => true,
            AggregatorError::Http { status, .. } => *status == 429 || (500..600).contains(status),
            AggregatorError::NoRoute(_) => false,
            AggregatorError::Malformed(_) => false,
            AggregatorError::Signing(_) => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            AggregatorError::Http { status: 429, .. } => "rate_limit",
            AggregatorError::Http { .. } => "http",
            AggregatorError::Transport(_) => "transport",
            AggregatorError::NoRoute(_) => "no_route",
            AggregatorError::Malformed(_) => "malformed",
            AggregatorError::Signing(_) => "signing",
        }
    }
}

impl From<reqwest::Error> for AggregatorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AggregatorError::Malformed(err.to_string())
        } else {
            AggregatorError::Transport(err.to_string())
        }
    }
}

/// Quote response. Unknown fields are kept so the swap request can echo the quote back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorQuote {
    #[serde(rename = "inputMint")]
    pub input_mint: String,
    #[serde(rename = "inAmount")]
    pub in_amount: String,
    #[serde(rename = "outputMint")]
    pub output_mint: String,
    #[serde(rename = "outAmount")]
    pub out_amount: String,
    #[serde(rename = "otherAmountThreshold")]
    pub other_amount_threshold: String,
    #[serde(rename = "slippageBps")]
    pub slippage_bps: u16,
    #[serde(rename = "priceImpactPct", default)]
    pub price_impact_pct: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AggregatorQuote {
    /// Engine quote built from the relay's amounts
    pub fn to_quote(&self) -> Result<Quote, AggregatorError> {
        let parse = |field: &str, value: &str| {
            value
                .parse::<u64>()
                .map_err(|_| AggregatorError::Malformed(format!("{} is not an amount: {}", field, value)))
        };
        let amount_in = parse("inAmount", &self.in_amount)?;
        let amount_out = parse("outAmount", &self.out_amount)?;
        let minimum_amount_out = parse("otherAmountThreshold", &self.other_amount_threshold)?;
        if amount_out == 0 {
            return Err(AggregatorError::NoRoute("route yields zero output".to_string()));
        }
        Ok(Quote {
            amount_in,
            amount_out,
            minimum_amount_out,
            slippage_bps: self.slippage_bps,
            venue: Venue::Aggregator,
        })
    }
}

#[derive(Debug, Serialize)]
struct SwapRequest<'a> {
    #[serde(rename = "userPublicKey")]
    user_public_key: String,
    #[serde(rename = "quoteResponse")]
    quote_response: &'a AggregatorQuote,
    #[serde(rename = "wrapAndUnwrapSol")]
    wrap_and_unwrap_sol: bool,
    #[serde(rename = "computeUnitPriceMicroLamports", skip_serializing_if = "Option::is_none")]
    compute_unit_price_micro_lamports: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    #[serde(rename = "swapTransaction")]
    swap_transaction: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

/// Input and output mints for a trade on `token`
pub fn route_mints(token: &Pubkey, side: TradeSide) -> (Pubkey, Pubkey) {
    match side {
        TradeSide::Buy => (WSOL_MINT, *token),
        TradeSide::Sell => (*token, WSOL_MINT),
    }
}

pub struct AggregatorClient {
    http: reqwest::Client,
    base_url: String,
    budget: Arc<RequestBudget>,
}

impl AggregatorClient {
    pub fn new(base_url: &str, timeout: Duration, budget: Arc<RequestBudget>) -> Result<Self, AggregatorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AggregatorError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            budget,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self), fields(token = %token, side = %side))]
    pub async fn quote(
        &self,
        token: &Pubkey,
        side: TradeSide,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<AggregatorQuote, AggregatorError> {
        let (input, output) = route_mints(token, side);
        let params = [
            ("inputMint", input.to_string()),
            ("outputMint", output.to_string()),
            ("amount", amount.to_string()),
            ("slippageBps", slippage_bps.to_string()),
        ];

        self.budget.acquire().await;
        metrics().aggregator_requests.inc();
        let response = self
            .http
            .get(format!("{}/quote", self.base_url))
            .query(&params)
            .send()
            .await?;

        let response = check_status("quote", response).await?;
        let quote: AggregatorQuote = response.json().await?;
        debug!(
            out_amount = %quote.out_amount,
            threshold = %quote.other_amount_threshold,
            "Relay quote received"
        );
        Ok(quote)
    }

    /// Unsigned swap transaction for `quote`, as returned by the relay
    #[instrument(skip(self, quote), fields(user = %user))]
    pub async fn swap_transaction(
        &self,
        quote: &AggregatorQuote,
        user: &Pubkey,
        priority_fee_micro: Option<u64>,
    ) -> Result<VersionedTransaction, AggregatorError> {
        let request = SwapRequest {
            user_public_key: user.to_string(),
            quote_response: quote,
            wrap_and_unwrap_sol: true,
            compute_unit_price_micro_lamports: priority_fee_micro,
        };

        self.budget.acquire().await;
        metrics().aggregator_requests.inc();
        let response = self
            .http
            .post(format!("{}/swap", self.base_url))
            .json(&request)
            .send()
            .await?;

        let response = check_status("swap", response).await?;
        let body: SwapResponse = response.json().await?;
        decode_transaction(&body.swap_transaction)
    }
}

async fn check_status(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AggregatorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
        let code = parsed.error_code.unwrap_or_default();
        if code.contains("ROUTE") || code == "TOKEN_NOT_TRADABLE" {
            return Err(AggregatorError::NoRoute(parsed.error.unwrap_or(code)));
        }
    }
    warn!(endpoint, status = status.as_u16(), "Relay request failed");
    Err(AggregatorError::Http {
        endpoint,
        status: status.as_u16(),
        body,
    })
}

/// base64 + bincode versioned transaction
pub fn decode_transaction(encoded: &str) -> Result<VersionedTransaction, AggregatorError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| AggregatorError::Malformed(format!("swap transaction base64: {}", e)))?;
    bincode::deserialize(&bytes)
        .map_err(|e| AggregatorError::Malformed(format!("swap transaction bytes: {}", e)))
}

/// Re-signs a relay transaction whose only required signer is `payer`
pub fn sign_transaction(
    tx: VersionedTransaction,
    payer: &Keypair,
) -> Result<VersionedTransaction, AggregatorError> {
    VersionedTransaction::try_new(tx.message, &[payer]).map_err(|e| AggregatorError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        message::{v0, VersionedMessage},
        signature::Signature,
        signer::Signer,
        system_instruction,
    };

    fn unsigned_swap(user: &Pubkey) -> String {
        let ix = system_instruction::transfer(user, &Pubkey::new_unique(), 1_000);
        let message = v0::Message::try_compile(user, &[ix], &[], Hash::new_unique()).unwrap();
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::V0(message),
        };
        STANDARD.encode(bincode::serialize(&tx).unwrap())
    }

    fn quote_body(token: &Pubkey) -> String {
        serde_json::json!({
            "inputMint": WSOL_MINT.to_string(),
            "inAmount": "1000000000",
            "outputMint": token.to_string(),
            "outAmount": "35000000",
            "otherAmountThreshold": "34000000",
            "swapMode": "ExactIn",
            "slippageBps": 300,
            "priceImpactPct": "0.01",
            "routePlan": []
        })
        .to_string()
    }

    fn client(url: &str) -> AggregatorClient {
        AggregatorClient::new(url, Duration::from_secs(5), Arc::new(RequestBudget::per_second(5))).unwrap()
    }

    #[tokio::test]
    async fn test_quote_and_swap_round() {
        let mut server = mockito::Server::new_async().await;
        let token = Pubkey::new_unique();
        let user = Keypair::new();

        let quote_mock = server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("outputMint".into(), token.to_string()),
                mockito::Matcher::UrlEncoded("amount".into(), "1000000000".into()),
                mockito::Matcher::UrlEncoded("slippageBps".into(), "300".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(quote_body(&token))
            .create_async()
            .await;

        let swap_mock = server
            .mock("POST", "/swap")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "userPublicKey": user.pubkey().to_string(),
                "computeUnitPriceMicroLamports": 50_000
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({ "swapTransaction": unsigned_swap(&user.pubkey()) }).to_string())
            .create_async()
            .await;

        let relay = client(&server.url());
        let quote = relay.quote(&token, TradeSide::Buy, 1_000_000_000, 300).await.unwrap();
        let engine_quote = quote.to_quote().unwrap();
        assert_eq!(engine_quote.amount_out, 35_000_000);
        assert_eq!(engine_quote.minimum_amount_out, 34_000_000);
        assert_eq!(engine_quote.venue, Venue::Aggregator);

        let tx = relay.swap_transaction(&quote, &user.pubkey(), Some(50_000)).await.unwrap();
        let signed = sign_transaction(tx, &user).unwrap();
        assert_ne!(signed.signatures[0], Signature::default());
        assert!(signed.verify_with_results().iter().all(|ok| *ok));

        quote_mock.assert_async().await;
        swap_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_route_is_not_retryable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"Could not find any route","errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .quote(&Pubkey::new_unique(), TradeSide::Sell, 10, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::NoRoute(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let err = client(&server.url())
            .quote(&Pubkey::new_unique(), TradeSide::Buy, 10, 100)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.category(), "http");
    }

    #[test]
    fn test_route_mints_by_side() {
        let token = Pubkey::new_unique();
        assert_eq!(route_mints(&token, TradeSide::Buy), (WSOL_MINT, token));
        assert_eq!(route_mints(&token, TradeSide::Sell), (token, WSOL_MINT));
    }

    #[test]
    fn test_malformed_transaction_rejected() {
        assert!(matches!(decode_transaction("not base64!"), Err(AggregatorError::Malformed(_))));
        let garbage = STANDARD.encode([1u8, 2, 3]);
        assert!(matches!(decode_transaction(&garbage), Err(AggregatorError::Malformed(_))));
    }

    #[test]
    fn test_quote_with_bad_amount() {
        let token = Pubkey::new_unique();
        let mut quote: AggregatorQuote = serde_json::from_str(&quote_body(&token)).unwrap();
        quote.out_amount = "abc".to_string();
        assert!(matches!(quote.to_quote(), Err(AggregatorError::Malformed(_))));
    }
}
