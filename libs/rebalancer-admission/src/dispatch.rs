// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Dispatcher-side bookkeeping for one rebalance pass
//!
//! A block move occupies a slot on both ends: on the node receiving the
//! block and on the node sending it. [`NodeTable`] keeps one
//! [`NodeController`] per node and reserves, releases and penalizes both
//! ends of a move together.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use rebalancer_types::{MoveOutcome, NodeIdentity, NodeStatus, StorageId};

use crate::clock::{Clock, SystemClock};
use crate::config::AdmissionConfig;
use crate::error::AdmissionError;
use crate::metrics;
use crate::node::NodeController;
use crate::pending::PendingMove;

/// Controllers for every node taking part in a pass
pub struct NodeTable {
    config: AdmissionConfig,
    clock: Arc<dyn Clock>,
    nodes: RwLock<HashMap<StorageId, Arc<NodeController>>>,
}

impl NodeTable {
    /// Create an empty table using the system monotonic clock
    pub fn new(config: AdmissionConfig) -> Result<Self, AdmissionError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an empty table whose controllers read time from `clock`
    pub fn with_clock(config: AdmissionConfig, clock: Arc<dyn Clock>) -> Result<Self, AdmissionError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            nodes: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Add a node, or return its controller if it is already present.
    pub fn add_node(&self, node: NodeIdentity) -> Result<Arc<NodeController>, AdmissionError> {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = nodes.get(&node.storage_id) {
            return Ok(Arc::clone(existing));
        }

        let storage_id = node.storage_id.clone();
        let controller = Arc::new(NodeController::from_config(
            node,
            &self.config,
            Arc::clone(&self.clock),
        )?);
        nodes.insert(storage_id.clone(), Arc::clone(&controller));
        drop(nodes);

        info!(
            node = %storage_id,
            max_concurrent_moves = self.config.max_concurrent_moves,
            "Added node to rebalance pass"
        );
        Ok(controller)
    }

    /// Controller for `storage_id`, if the node is part of this pass
    pub fn node(&self, storage_id: &str) -> Option<Arc<NodeController>> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(storage_id)
            .cloned()
    }

    fn snapshot(&self) -> Vec<Arc<NodeController>> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn ends(&self, mv: &PendingMove) -> Option<(Arc<NodeController>, Arc<NodeController>)> {
        let target = self.node(&mv.target().node().storage_id)?;
        let source = self.node(&mv.source().node().storage_id)?;
        Some((target, source))
    }

    /// Reserve a slot for `mv` on its target node and then on its source
    /// node.
    ///
    /// All or nothing: if the source refuses, the target reservation is
    /// released again. A move between two tiers of the same node takes a
    /// single slot. Returns false if either node is not in the table.
    pub fn try_reserve(&self, mv: &PendingMove) -> bool {
        let Some((target, source)) = self.ends(mv) else {
            debug!(move_id = %mv.id(), "Move references a node outside this pass");
            return false;
        };

        if !target.try_admit_move(mv) {
            return false;
        }
        if mv.is_local() || source.try_admit_move(mv) {
            return true;
        }

        target.release_move(mv);
        false
    }

    /// Record how `mv` ended and free its slots.
    ///
    /// - `Success`: release only
    /// - `Failed`: release, put the source node into cooldown, and mark the
    ///   target node failed
    /// - `Timeout`: release and put the source node into cooldown
    ///
    /// Only a report that actually frees a slot has any effect. Repeated or
    /// stale reports for a move that is no longer pending are ignored, so
    /// they neither restart a cooldown nor retire the target.
    ///
    /// Returns whether the move was pending on either end.
    pub fn record_outcome(&self, mv: &PendingMove, outcome: MoveOutcome) -> bool {
        let Some((target, source)) = self.ends(mv) else {
            return false;
        };

        let released_target = target.release_move(mv);
        let released_source = !mv.is_local() && source.release_move(mv);
        let released = released_target || released_source;

        if !released {
            debug!(move_id = %mv.id(), %outcome, "Ignoring outcome for move that is not pending");
            return false;
        }

        metrics::record_outcome(outcome);
        if outcome.triggers_delay() {
            source.activate_delay(self.config.failure_delay());
        }
        if outcome == MoveOutcome::Failed {
            target.mark_failed();
        }

        debug!(move_id = %mv.id(), %outcome, "Recorded move outcome");
        true
    }

    /// True while any node still has moves in flight; the pass cannot end
    /// until this is false.
    pub fn has_pending_moves(&self) -> bool {
        self.snapshot().iter().any(|node| node.has_pending_moves())
    }

    /// Nodes that have not been marked failed
    pub fn schedulable_nodes(&self) -> Vec<Arc<NodeController>> {
        let mut nodes: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|node| !node.has_failure())
            .collect();
        nodes.sort_by(|a, b| a.node().storage_id.cmp(&b.node().storage_id));
        nodes
    }

    /// Status of every node, sorted by storage id
    pub fn statuses(&self) -> Vec<NodeStatus> {
        let mut statuses: Vec<NodeStatus> =
            self.snapshot().iter().map(|node| node.status()).collect();
        statuses.sort_by(|a, b| a.node.cmp(&b.node));
        statuses
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
