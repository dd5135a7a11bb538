//! # Prometheus Metrics
//!
//! Ledger metrics scraped at `/metrics` on the metrics port. Everything is
//! registered in a dedicated [`prometheus::Registry`] under the `regalium`
//! namespace.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use regalium_contracts::RegaliumToken;
use regalium_protocol::config::UNIT;

/// Metric handles for the node. Prometheus handles are internally
/// reference-counted, so cloning is cheap.
#[derive(Clone)]
pub struct LedgerMetrics {
    registry: Registry,
    /// Accepted operations, labelled by operation name.
    pub operations_applied_total: IntCounterVec,
    /// Rejected operations, labelled by error kind.
    pub operations_rejected_total: IntCounterVec,
    /// Total supply in whole tokens.
    pub total_supply_tokens: Gauge,
    /// Reserve balance in whole reserve units.
    pub reserve_balance: Gauge,
    /// Number of known accounts.
    pub accounts: IntGauge,
    pub operation_latency_seconds: Histogram,
}

impl LedgerMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("regalium".into()), None)?;

        let operations_applied_total = IntCounterVec::new(
            Opts::new("operations_applied_total", "Operations accepted by the ledger"),
            &["operation"],
        )?;
        registry.register(Box::new(operations_applied_total.clone()))?;

        let operations_rejected_total = IntCounterVec::new(
            Opts::new("operations_rejected_total", "Operations rejected by the ledger"),
            &["kind"],
        )?;
        registry.register(Box::new(operations_rejected_total.clone()))?;

        let total_supply_tokens =
            Gauge::new("total_supply_tokens", "Total token supply in whole tokens")?;
        registry.register(Box::new(total_supply_tokens.clone()))?;

        let reserve_balance = Gauge::new(
            "reserve_balance",
            "Reserve currency held by the ledger, in whole units",
        )?;
        registry.register(Box::new(reserve_balance.clone()))?;

        let accounts = IntGauge::new("accounts", "Number of accounts known to the ledger")?;
        registry.register(Box::new(accounts.clone()))?;

        let operation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "operation_latency_seconds",
                "Time to apply and persist one operation, in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(operation_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            operations_applied_total,
            operations_rejected_total,
            total_supply_tokens,
            reserve_balance,
            accounts,
            operation_latency_seconds,
        })
    }

    /// Refreshes the state gauges from `token`.
    pub fn observe(&self, token: &RegaliumToken) {
        self.total_supply_tokens
            .set(whole_units(token.total_supply()));
        self.reserve_balance.set(whole_units(token.reserve_balance()));
        self.accounts
            .set(i64::try_from(token.ledger().account_count()).unwrap_or(i64::MAX));
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Base units to whole units. Lossy; gauges only.
fn whole_units(amount: u128) -> f64 {
    amount as f64 / UNIT as f64
}

/// Shared metrics handle passed to axum handlers.
pub type SharedMetrics = Arc<LedgerMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
