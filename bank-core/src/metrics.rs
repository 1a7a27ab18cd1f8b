//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_deposits_total` - Committed deposit operations
//! - `ledger_withdrawals_total` - Committed withdrawal operations
//! - `ledger_transfers_total` - Committed transfer operations
//! - `ledger_rejections_total` - Operations rejected before commit
//! - `ledger_commit_duration_seconds` - Histogram of commit latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed deposits
    pub deposits_total: IntCounter,

    /// Committed withdrawals
    pub withdrawals_total: IntCounter,

    /// Committed transfers
    pub transfers_total: IntCounter,

    /// Rejected operations (validation, funds, locks, storage)
    pub rejections_total: IntCounter,

    /// Commit latency histogram
    pub commit_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deposits_total =
            IntCounter::new("ledger_deposits_total", "Committed deposit operations")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total = IntCounter::new(
            "ledger_withdrawals_total",
            "Committed withdrawal operations",
        )?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let transfers_total =
            IntCounter::new("ledger_transfers_total", "Committed transfer operations")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let rejections_total = IntCounter::new(
            "ledger_rejections_total",
            "Operations rejected before commit",
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let commit_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_commit_duration_seconds",
                "Histogram of commit latencies",
            )
            .buckets(vec![
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0,
            ]),
        )?;
        registry.register(Box::new(commit_duration.clone()))?;

        Ok(Self {
            deposits_total,
            withdrawals_total,
            transfers_total,
            rejections_total,
            commit_duration,
            registry,
        })
    }

    /// Record a committed deposit
    pub fn record_deposit(&self) {
        self.deposits_total.inc();
    }

    /// Record a committed withdrawal
    pub fn record_withdrawal(&self) {
        self.withdrawals_total.inc();
    }

    /// Record a committed transfer
    pub fn record_transfer(&self) {
        self.transfers_total.inc();
    }

    /// Record a rejected operation
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Record commit latency
    pub fn record_commit_duration(&self, duration_seconds: f64) {
        self.commit_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("deposits_total", &self.deposits_total.get())
            .field("withdrawals_total", &self.withdrawals_total.get())
            .field("transfers_total", &self.transfers_total.get())
            .field("rejections_total", &self.rejections_total.get())
            .finish()
    }
}
