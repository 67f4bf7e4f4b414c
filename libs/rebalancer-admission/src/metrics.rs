// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Prometheus metrics for move admission
//!
//! Exports metrics for monitoring admission decisions including:
//! - Moves admitted and released
//! - Admission rejections by reason (delay_active, at_capacity, ...)
//! - Cooldowns activated and nodes marked failed
//! - Move outcomes recorded by the node table

use prometheus::{Counter, CounterVec, Opts, Registry, TextEncoder};
use rebalancer_types::{MoveOutcome, RejectReason};

// Static metric initialization uses expect because these are compile-time
// constant definitions that cannot fail in practice. If they do fail, it indicates
// a programming error (e.g., invalid metric name) that should cause a panic at startup.
//
// This module exists to scope the clippy allow attributes to just the metric definitions.
#[allow(clippy::expect_used)]
mod metrics_impl {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        /// Registry for all admission metrics
        pub static ref REGISTRY: Registry = Registry::new();

        /// Moves admitted onto a node
        pub static ref MOVES_ADMITTED: Counter = Counter::with_opts(
            Opts::new("rebalancer_moves_admitted_total", "Total moves admitted onto a node")
        ).expect("valid metric name");

        /// Moves refused by a node, by reason
        pub static ref MOVES_REJECTED: CounterVec = CounterVec::new(
            Opts::new("rebalancer_moves_rejected_total", "Moves refused by a node, by reason"),
            &["reason"]
        ).expect("valid metric name and labels");

        /// Moves removed from a node's pending set
        pub static ref MOVES_RELEASED: Counter = Counter::with_opts(
            Opts::new("rebalancer_moves_released_total", "Total moves released from a node")
        ).expect("valid metric name");

        /// Cooldowns activated after failures
        pub static ref DELAYS_ACTIVATED: Counter = Counter::with_opts(
            Opts::new("rebalancer_node_delays_total", "Total node cooldowns activated")
        ).expect("valid metric name");

        /// Nodes whose sticky failure flag was set
        pub static ref NODES_FAILED: Counter = Counter::with_opts(
            Opts::new("rebalancer_nodes_failed_total", "Total nodes marked as failed")
        ).expect("valid metric name");

        /// Move outcomes recorded by the dispatcher
        pub static ref MOVE_OUTCOMES: CounterVec = CounterVec::new(
            Opts::new("rebalancer_move_outcomes_total", "Move outcomes, by outcome"),
            &["outcome"]
        ).expect("valid metric name and labels");
    }
}

pub use metrics_impl::{
    DELAYS_ACTIVATED, MOVE_OUTCOMES, MOVES_ADMITTED, MOVES_REJECTED, MOVES_RELEASED,
    NODES_FAILED, REGISTRY,
};

/// Register all metrics with the registry
///
/// Should be called once during application startup.
/// Panics if registration fails (indicates a programming error).
#[allow(clippy::expect_used)]
pub fn register_metrics() {
    REGISTRY
        .register(Box::new(MOVES_ADMITTED.clone()))
        .expect("Failed to register MOVES_ADMITTED");
    REGISTRY
        .register(Box::new(MOVES_REJECTED.clone()))
        .expect("Failed to register MOVES_REJECTED");
    REGISTRY
        .register(Box::new(MOVES_RELEASED.clone()))
        .expect("Failed to register MOVES_RELEASED");
    REGISTRY
        .register(Box::new(DELAYS_ACTIVATED.clone()))
        .expect("Failed to register DELAYS_ACTIVATED");
    REGISTRY
        .register(Box::new(NODES_FAILED.clone()))
        .expect("Failed to register NODES_FAILED");
    REGISTRY
        .register(Box::new(MOVE_OUTCOMES.clone()))
        .expect("Failed to register MOVE_OUTCOMES");
}

/// Get metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

pub(crate) fn record_admitted() {
    MOVES_ADMITTED.inc();
}

pub(crate) fn record_rejected(reason: RejectReason) {
    MOVES_REJECTED
        .with_label_values(&[reason.to_string().as_str()])
        .inc();
}

pub(crate) fn record_released() {
    MOVES_RELEASED.inc();
}

pub(crate) fn record_delay() {
    DELAYS_ACTIVATED.inc();
}

pub(crate) fn record_node_failed() {
    NODES_FAILED.inc();
}

pub(crate) fn record_outcome(outcome: MoveOutcome) {
    MOVE_OUTCOMES
        .with_label_values(&[outcome.to_string().as_str()])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_counter_by_reason() {
        let label = RejectReason::AtCapacity.to_string();
        let before = MOVES_REJECTED.with_label_values(&[label.as_str()]).get();
        record_rejected(RejectReason::AtCapacity);
        record_rejected(RejectReason::AtCapacity);
        let after = MOVES_REJECTED.with_label_values(&[label.as_str()]).get();

        assert_eq!(after - before, 2.0);
    }

    #[test]
    fn test_gather_after_register() {
        register_metrics();
        record_outcome(MoveOutcome::Timeout);

        let text = gather_metrics();
        assert!(text.contains("rebalancer_move_outcomes_total"));
    }
}
