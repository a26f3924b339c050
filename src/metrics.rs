//! Prometheus metrics for discovery and execution

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub trades_total: IntCounter,
    pub trades_success: IntCounter,
    pub trades_failed: IntCounter,
    pub execution_attempts: IntCounter,
    pub venue_fallbacks: IntCounter,
    pub slippage_failures: IntCounter,
    pub discovery_cache_hits: IntCounter,
    pub discovery_cache_misses: IntCounter,
    pub aggregator_requests: IntCounter,

    // Gauges
    pub active_trades: IntGauge,

    // Histograms
    pub trade_latency: Histogram,
    pub discovery_latency: Histogram,
    pub confirmation_latency: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let trades_total = IntCounter::with_opts(Opts::new(
            "trades_total",
            "Total number of trade requests executed",
        ))?;
        let trades_success =
            IntCounter::with_opts(Opts::new("trades_success", "Number of confirmed trades"))?;
        let trades_failed =
            IntCounter::with_opts(Opts::new("trades_failed", "Number of failed trades"))?;
        let execution_attempts = IntCounter::with_opts(Opts::new(
            "execution_attempts_total",
            "Transactions built and submitted across all venues",
        ))?;
        let venue_fallbacks = IntCounter::with_opts(Opts::new(
            "venue_fallbacks_total",
            "Times execution moved to the next venue in priority order",
        ))?;
        let slippage_failures = IntCounter::with_opts(Opts::new(
            "slippage_failures_total",
            "Attempts rejected on-chain for exceeding slippage",
        ))?;
        let discovery_cache_hits = IntCounter::with_opts(Opts::new(
            "discovery_cache_hits_total",
            "Venue lookups answered from cache",
        ))?;
        let discovery_cache_misses = IntCounter::with_opts(Opts::new(
            "discovery_cache_misses_total",
            "Venue lookups that required probing",
        ))?;
        let aggregator_requests = IntCounter::with_opts(Opts::new(
            "aggregator_requests_total",
            "HTTP requests sent to the swap aggregator",
        ))?;

        let active_trades = IntGauge::with_opts(Opts::new(
            "active_trades",
            "Number of trades currently in progress",
        ))?;

        let trade_latency = Histogram::with_opts(
            HistogramOpts::new("trade_latency_seconds", "End-to-end trade latency")
                .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0]),
        )?;
        let discovery_latency = Histogram::with_opts(
            HistogramOpts::new("discovery_latency_seconds", "Uncached venue discovery latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0]),
        )?;
        let confirmation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "confirmation_latency_seconds",
                "Time from submission to confirmation",
            )
            .buckets(vec![0.5, 1.0, 2.0, 4.0, 6.0, 8.0, 10.0]),
        )?;

        registry.register(Box::new(trades_total.clone()))?;
        registry.register(Box::new(trades_success.clone()))?;
        registry.register(Box::new(trades_failed.clone()))?;
        registry.register(Box::new(execution_attempts.clone()))?;
        registry.register(Box::new(venue_fallbacks.clone()))?;
        registry.register(Box::new(slippage_failures.clone()))?;
        registry.register(Box::new(discovery_cache_hits.clone()))?;
        registry.register(Box::new(discovery_cache_misses.clone()))?;
        registry.register(Box::new(aggregator_requests.clone()))?;
        registry.register(Box::new(active_trades.clone()))?;
        registry.register(Box::new(trade_latency.clone()))?;
        registry.register(Box::new(discovery_latency.clone()))?;
        registry.register(Box::new(confirmation_latency.clone()))?;

        Ok(Self {
            registry,
            trades_total,
            trades_success,
            trades_failed,
            execution_attempts,
            venue_fallbacks,
            slippage_failures,
            discovery_cache_hits,
            discovery_cache_misses,
            aggregator_requests,
            active_trades,
            trade_latency,
            discovery_latency,
            confirmation_latency,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Measures an operation and records it into a named histogram
pub struct Timer {
    start: Instant,
    histogram_name: &'static str,
}

impl Timer {
    pub fn with_name(histogram_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            histogram_name,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Records the elapsed time
    pub fn finish(self) {
        let duration = self.elapsed_secs();
        match self.histogram_name {
            "trade_latency_seconds" => metrics().trade_latency.observe(duration),
            "discovery_latency_seconds" => metrics().discovery_latency.observe(duration),
            "confirmation_latency_seconds" => metrics().confirmation_latency.observe(duration),
            other => tracing::debug!("Unknown histogram name: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_without_collision() {
        let m = Metrics::new().expect("Should build a fresh registry");
        m.trades_total.inc();
        m.discovery_cache_hits.inc_by(2);

        let text = m.render().unwrap();
        assert!(text.contains("trades_total 1"));
        assert!(text.contains("discovery_cache_hits_total 2"));
    }

    #[test]
    fn test_timer_records_into_histogram() {
        let before = metrics().discovery_latency.get_sample_count();
        Timer::with_name("discovery_latency_seconds").finish();
        assert!(metrics().discovery_latency.get_sample_count() > before);
    }
}
