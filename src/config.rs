//! Configuration module for the venue router
//!
//! Loaded from a TOML file with `.env` support and environment overrides. Every knob has a
//! serde default, so a file containing only `[rpc]` and `[wallet]` is enough.

use crate::discovery::DiscoveryConfig;
use crate::types::Venue;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_RPC_URL: &str = "ENGINE_RPC_URL";
pub const ENV_KEYPAIR_PATH: &str = "ENGINE_KEYPAIR_PATH";
pub const ENV_AGGREGATOR_URL: &str = "ENGINE_AGGREGATOR_URL";

const MAX_BPS: u16 = 10_000;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    /// Slippage, priority fee and retry knobs
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Per-venue protocol fee and slippage ceiling
    #[serde(default)]
    pub venues: VenuesConfig,

    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub aggregator: AggregatorConfig,

    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Submit without preflight simulation
    #[serde(default = "default_true")]
    pub skip_preflight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Slippage on the first attempt
    #[serde(default = "default_base_slippage")]
    pub base_slippage_bps: u16,

    /// Added per retry and per liquidity bias step
    #[serde(default = "default_slippage_bonus")]
    pub slippage_bonus_bps: u16,

    /// Extra margin subtracted from the minimum output on top of the slippage
    #[serde(default)]
    pub slippage_pad_bps: u16,

    /// Attempts per venue before falling back
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_priority_fee")]
    pub base_priority_fee_micro: u64,

    #[serde(default = "default_min_priority_fee")]
    pub min_priority_fee_micro: u64,

    #[serde(default = "default_max_priority_fee")]
    pub max_priority_fee_micro: u64,

    /// Priority fee growth per attempt
    #[serde(default = "default_fee_multiplier")]
    pub fee_multiplier: f64,

    /// Fee discount per parallel order rank, in percent
    #[serde(default = "default_rank_discount")]
    pub rank_discount_pct: u64,

    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,

    /// Quote-side reserve below which two slippage bonuses are pre-applied
    #[serde(default = "default_low_liquidity")]
    pub low_liquidity_lamports: u64,

    /// Quote-side reserve below which one slippage bonus is pre-applied
    #[serde(default = "default_medium_liquidity")]
    pub medium_liquidity_lamports: u64,

    /// Lamports kept back for fees and rent on buys
    #[serde(default = "default_fee_reserve")]
    pub fee_reserve_lamports: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Confirmation window per attempt
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_ms: u64,

    /// Pause before retrying a rate-limited attempt
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff_ms: u64,

    /// Orders in flight at once during a batch
    #[serde(default = "default_max_parallel_orders")]
    pub max_parallel_orders: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VenueConfig {
    pub fee_bps: u16,
    pub max_slippage_bps: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenuesConfig {
    #[serde(default = "default_pump_curve")]
    pub pump_curve: VenueConfig,

    #[serde(default = "default_launchpad_curve")]
    pub launchpad_curve: VenueConfig,

    #[serde(default = "default_pump_amm")]
    pub pump_amm: VenueConfig,

    /// Fee is taken by the relay route; only the slippage ceiling applies
    #[serde(default = "default_aggregator_venue")]
    pub aggregator: VenueConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Attempts per probe, including the first
    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,

    #[serde(default = "default_probe_backoff")]
    pub probe_backoff_ms: u64,

    /// Cache size past which expired transient entries are swept on insert
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Background sweep period for expired cache entries
    #[serde(default = "default_cache_prune_interval")]
    pub cache_prune_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_aggregator_url")]
    pub base_url: String,

    /// Hard request ceiling imposed by the relay
    #[serde(default = "default_aggregator_rps")]
    pub requests_per_second: u32,

    #[serde(default = "default_aggregator_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Serve Prometheus metrics
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_rpc_endpoint() -> String { "https://api.mainnet-beta.solana.com".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_base_slippage() -> u16 { 3_500 }
fn default_slippage_bonus() -> u16 { 1_000 }
fn default_max_retries() -> u32 { 3 }
fn default_base_priority_fee() -> u64 { 200_000 }
fn default_min_priority_fee() -> u64 { 10_000 }
fn default_max_priority_fee() -> u64 { 2_000_000 }
fn default_fee_multiplier() -> f64 { 1.5 }
fn default_rank_discount() -> u64 { 10 }
fn default_compute_unit_limit() -> u32 { 200_000 }
fn default_low_liquidity() -> u64 { 5_000_000_000 }
fn default_medium_liquidity() -> u64 { 20_000_000_000 }
fn default_fee_reserve() -> u64 { 10_000_000 }
fn default_poll_interval() -> u64 { 1_000 }
fn default_confirm_timeout() -> u64 { 10_000 }
fn default_rate_limit_backoff() -> u64 { 500 }
fn default_max_parallel_orders() -> usize { 8 }
fn default_pump_curve() -> VenueConfig { VenueConfig { fee_bps: 100, max_slippage_bps: 9_500 } }
fn default_launchpad_curve() -> VenueConfig { VenueConfig { fee_bps: 25, max_slippage_bps: 9_000 } }
fn default_pump_amm() -> VenueConfig { VenueConfig { fee_bps: 25, max_slippage_bps: 7_000 } }
fn default_aggregator_venue() -> VenueConfig { VenueConfig { fee_bps: 0, max_slippage_bps: 5_000 } }
fn default_cache_ttl() -> u64 { 300 }
fn default_probe_attempts() -> u32 { 3 }
fn default_probe_backoff() -> u64 { 100 }
fn default_cache_max_entries() -> usize { 4_096 }
fn default_cache_prune_interval() -> u64 { 60 }
fn default_aggregator_url() -> String { "https://quote-api.jup.ag/v6".to_string() }
fn default_aggregator_rps() -> u32 { 5 }
fn default_aggregator_timeout() -> u64 { 10 }
fn default_metrics_port() -> u16 { 9090 }
fn default_true() -> bool { true }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_secs: default_rpc_timeout(),
            skip_preflight: true,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            base_slippage_bps: default_base_slippage(),
            slippage_bonus_bps: default_slippage_bonus(),
            slippage_pad_bps: 0,
            max_retries: default_max_retries(),
            base_priority_fee_micro: default_base_priority_fee(),
            min_priority_fee_micro: default_min_priority_fee(),
            max_priority_fee_micro: default_max_priority_fee(),
            fee_multiplier: default_fee_multiplier(),
            rank_discount_pct: default_rank_discount(),
            compute_unit_limit: default_compute_unit_limit(),
            low_liquidity_lamports: default_low_liquidity(),
            medium_liquidity_lamports: default_medium_liquidity(),
            fee_reserve_lamports: default_fee_reserve(),
            poll_interval_ms: default_poll_interval(),
            confirm_timeout_ms: default_confirm_timeout(),
            rate_limit_backoff_ms: default_rate_limit_backoff(),
            max_parallel_orders: default_max_parallel_orders(),
        }
    }
}

impl Default for VenuesConfig {
    fn default() -> Self {
        Self {
            pump_curve: default_pump_curve(),
            launchpad_curve: default_launchpad_curve(),
            pump_amm: default_pump_amm(),
            aggregator: default_aggregator_venue(),
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            probe_attempts: default_probe_attempts(),
            probe_backoff_ms: default_probe_backoff(),
            cache_max_entries: default_cache_max_entries(),
            cache_prune_interval_secs: default_cache_prune_interval(),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_aggregator_url(),
            requests_per_second: default_aggregator_rps(),
            timeout_secs: default_aggregator_timeout(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: default_metrics_port(),
        }
    }
}

impl ExecutionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_slippage_bps > MAX_BPS || self.slippage_pad_bps > MAX_BPS {
            bail!("execution: slippage values must be at most {} bps", MAX_BPS);
        }
        if self.max_retries == 0 {
            bail!("execution.max_retries must be at least 1");
        }
        if self.min_priority_fee_micro > self.max_priority_fee_micro {
            bail!("execution.min_priority_fee_micro exceeds max_priority_fee_micro");
        }
        if !self.fee_multiplier.is_finite() || self.fee_multiplier < 1.0 {
            bail!("execution.fee_multiplier must be a finite value >= 1.0");
        }
        if self.low_liquidity_lamports > self.medium_liquidity_lamports {
            bail!("execution.low_liquidity_lamports exceeds medium_liquidity_lamports");
        }
        if self.poll_interval_ms == 0 || self.confirm_timeout_ms == 0 {
            bail!("execution: poll interval and confirmation timeout must be positive");
        }
        if self.max_parallel_orders == 0 {
            bail!("execution.max_parallel_orders must be at least 1");
        }
        Ok(())
    }
}

impl VenueConfig {
    fn validate(&self, venue: Venue) -> anyhow::Result<()> {
        if self.fee_bps >= MAX_BPS {
            bail!("venues.{}.fee_bps must be below {}", venue, MAX_BPS);
        }
        if self.max_slippage_bps > MAX_BPS {
            bail!("venues.{}.max_slippage_bps must be at most {}", venue, MAX_BPS);
        }
        Ok(())
    }
}

impl VenuesConfig {
    pub fn get(&self, venue: Venue) -> &VenueConfig {
        match venue {
            Venue::PumpCurve => &self.pump_curve,
            Venue::LaunchpadCurve => &self.launchpad_curve,
            Venue::PumpAmm => &self.pump_amm,
            Venue::Aggregator => &self.aggregator,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Venue::ALL
            .into_iter()
            .try_for_each(|venue| self.get(venue).validate(venue))
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// File (or defaults) plus `.env` and environment overrides, validated
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`, normally the process environment
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc.endpoint = url;
        }
        if let Some(path) = lookup(ENV_KEYPAIR_PATH) {
            self.wallet.keypair_path = path;
        }
        if let Some(url) = lookup(ENV_AGGREGATOR_URL) {
            self.aggregator.base_url = url;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.endpoint.trim().is_empty() {
            bail!("rpc.endpoint must not be empty");
        }
        if self.rpc.timeout_secs == 0 {
            bail!("rpc.timeout_secs must be positive");
        }
        self.execution.validate()?;
        self.venues.validate()?;
        if self.discovery.probe_attempts == 0 {
            bail!("discovery.probe_attempts must be at least 1");
        }
        if self.discovery.cache_max_entries == 0 {
            bail!("discovery.cache_max_entries must be at least 1");
        }
        if self.discovery.cache_prune_interval_secs == 0 {
            bail!("discovery.cache_prune_interval_secs must be at least 1");
        }
        if self.aggregator.enabled {
            if self.aggregator.base_url.trim().is_empty() {
                bail!("aggregator.base_url must not be empty when the aggregator is enabled");
            }
            if self.aggregator.requests_per_second == 0 {
                bail!("aggregator.requests_per_second must be positive");
            }
        }
        Ok(())
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            cache_ttl: Duration::from_secs(self.discovery.cache_ttl_secs),
            probe_attempts: self.discovery.probe_attempts,
            probe_backoff_ms: self.discovery.probe_backoff_ms,
            cache_max_entries: self.discovery.cache_max_entries,
            cache_prune_interval: Duration::from_secs(self.discovery.cache_prune_interval_secs),
            aggregator_enabled: self.aggregator.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[rpc]
endpoint = "http://localhost:8899"

[wallet]
keypair_path = "/tmp/id.json"

[venues.pump_amm]
fee_bps = 30
max_slippage_bps = 6000
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.rpc.endpoint, "http://localhost:8899");
        assert_eq!(config.rpc.timeout_secs, 30);
        assert_eq!(config.execution.base_slippage_bps, 3_500);
        assert_eq!(config.execution.slippage_pad_bps, 0);
        assert_eq!(config.venues.get(Venue::PumpAmm).fee_bps, 30);
        assert_eq!(config.venues.get(Venue::PumpCurve).fee_bps, 100);
        assert!(config.aggregator.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            ENV_RPC_URL => Some("http://rpc.local".to_string()),
            ENV_AGGREGATOR_URL => Some("http://relay.local".to_string()),
            _ => None,
        });
        assert_eq!(config.rpc.endpoint, "http://rpc.local");
        assert_eq!(config.aggregator.base_url, "http://relay.local");
        assert_eq!(config.wallet.keypair_path, default_keypair_path());
    }

    #[test]
    fn test_validate_rejects_bad_knobs() {
        let mut config = Config::default();
        config.execution.min_priority_fee_micro = 10;
        config.execution.max_priority_fee_micro = 5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.venues.pump_curve.max_slippage_bps = 12_000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.execution.fee_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.execution.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.discovery.cache_max_entries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discovery_config_follows_aggregator_switch() {
        let mut config = Config::default();
        config.aggregator.enabled = false;
        config.discovery.cache_ttl_secs = 60;
        let discovery = config.discovery_config();
        assert!(!discovery.aggregator_enabled);
        assert_eq!(discovery.cache_ttl, Duration::from_secs(60));
        assert_eq!(discovery.cache_max_entries, 4_096);
        assert_eq!(discovery.cache_prune_interval, Duration::from_secs(60));
    }
}
