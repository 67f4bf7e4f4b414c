// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Per-node move admission
//!
//! A [`NodeController`] gates how many block moves one storage node has in
//! flight and keeps the node out of rotation for a while after a failure.
//! The dispatcher creates one controller per node for a rebalance pass:
//!
//! 1. Register the node's storage groups (`register_source`/`register_target`)
//! 2. Call `try_admit_move` before handing a move to a transfer worker
//! 3. Call `release_move` when the move finishes, successfully or not
//! 4. On node-level failures, call `activate_delay` and optionally
//!    `mark_failed`
//!
//! All state lives behind one mutex per controller. Controllers for
//! different nodes never share a lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use rebalancer_types::{MoveId, NodeIdentity, NodeStatus, RejectReason, StorageTier};

use crate::clock::{Clock, SystemClock};
use crate::config::AdmissionConfig;
use crate::error::AdmissionError;
use crate::group::{Source, Target};
use crate::metrics;
use crate::pending::PendingMove;

/// A cooldown window started at `started` and lasting `length`.
#[derive(Debug, Clone, Copy)]
struct Cooldown {
    started: Instant,
    length: Duration,
}

impl Cooldown {
    /// Expired once `now` is strictly past the deadline.
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) > self.length
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.length
            .saturating_sub(now.saturating_duration_since(self.started))
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Default)]
struct NodeState {
    sources: HashMap<StorageTier, Source>,
    targets: HashMap<StorageTier, Target>,
    pending: HashMap<MoveId, PendingMove>,
    delay: Option<Cooldown>,
    has_failure: bool,
}

impl NodeState {
    /// Whether a cooldown is in effect, clearing it if it has run out.
    fn is_delay_active(&mut self, now: Instant) -> bool {
        match self.delay {
            None => false,
            Some(cooldown) if cooldown.expired(now) => {
                self.delay = None;
                false
            }
            Some(_) => true,
        }
    }
}

/// Admission controller for one storage node
pub struct NodeController {
    node: NodeIdentity,
    max_concurrent_moves: usize,
    clock: Arc<dyn Clock>,
    state: Mutex<NodeState>,
}

impl NodeController {
    /// Create a controller using the system monotonic clock
    pub fn new(node: NodeIdentity, max_concurrent_moves: usize) -> Result<Self, AdmissionError> {
        Self::with_clock(node, max_concurrent_moves, Arc::new(SystemClock))
    }

    /// Create a controller reading time from `clock`
    pub fn with_clock(
        node: NodeIdentity,
        max_concurrent_moves: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AdmissionError> {
        if max_concurrent_moves == 0 {
            return Err(AdmissionError::InvalidConcurrency(max_concurrent_moves));
        }

        Ok(Self {
            node,
            max_concurrent_moves,
            clock,
            state: Mutex::new(NodeState {
                pending: HashMap::with_capacity(max_concurrent_moves),
                ..Default::default()
            }),
        })
    }

    /// Create a controller from an [`AdmissionConfig`]
    pub fn from_config(
        node: NodeIdentity,
        config: &AdmissionConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AdmissionError> {
        config.validate()?;
        Self::with_clock(node, config.max_concurrent_moves, clock)
    }

    // Every critical section leaves the state consistent, so a panic in
    // another holder does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn node(&self) -> &NodeIdentity {
        &self.node
    }

    pub fn max_concurrent_moves(&self) -> usize {
        self.max_concurrent_moves
    }

    // ------------------------------------------------------------------
    // Storage group registry
    // ------------------------------------------------------------------

    /// Register `tier` on this node as a source of blocks.
    ///
    /// Fails if the tier is already registered as a source here.
    pub fn register_source(&self, tier: impl Into<StorageTier>) -> Result<Source, AdmissionError> {
        let tier = tier.into();
        let source = {
            let mut state = self.lock();
            if state.sources.contains_key(&tier) {
                return Err(AdmissionError::DuplicateSource {
                    node: self.node.storage_id.clone(),
                    tier,
                });
            }
            let source = Source::new(self.node.clone(), tier.clone());
            state.sources.insert(tier, source.clone());
            source
        };

        info!(node = %self.node, tier = %source.tier(), "Registered source storage group");
        Ok(source)
    }

    /// Register `tier` on this node as a target for blocks.
    ///
    /// Fails if the tier is already registered as a target here.
    pub fn register_target(&self, tier: impl Into<StorageTier>) -> Result<Target, AdmissionError> {
        let tier = tier.into();
        let target = {
            let mut state = self.lock();
            if state.targets.contains_key(&tier) {
                return Err(AdmissionError::DuplicateTarget {
                    node: self.node.storage_id.clone(),
                    tier,
                });
            }
            let target = Target::new(self.node.clone(), tier.clone());
            state.targets.insert(tier, target.clone());
            target
        };

        info!(node = %self.node, tier = %target.tier(), "Registered target storage group");
        Ok(target)
    }

    /// Look up a registered source
    pub fn source(&self, tier: &str) -> Option<Source> {
        self.lock().sources.get(tier).cloned()
    }

    /// Look up a registered target
    pub fn target(&self, tier: &str) -> Option<Target> {
        self.lock().targets.get(tier).cloned()
    }

    // ------------------------------------------------------------------
    // Admission
    // ------------------------------------------------------------------

    /// Try to reserve a concurrency slot for `mv`.
    ///
    /// The cooldown check, the capacity check and the insertion all happen
    /// under the controller lock, so concurrent callers can never push the
    /// pending set past `max_concurrent_moves`. A move that is already
    /// pending here is refused rather than counted twice.
    pub fn try_admit(&self, mv: &PendingMove) -> Result<(), RejectReason> {
        let (result, pending) = {
            let mut state = self.lock();
            let now = self.clock.now();
            let result = if state.is_delay_active(now) {
                Err(RejectReason::DelayActive)
            } else if state.pending.contains_key(&mv.id()) {
                Err(RejectReason::AlreadyPending)
            } else if state.pending.len() >= self.max_concurrent_moves {
                Err(RejectReason::AtCapacity)
            } else {
                state.pending.insert(mv.id(), mv.clone());
                Ok(())
            };
            (result, state.pending.len())
        };

        match result {
            Ok(()) => {
                metrics::record_admitted();
                debug!(node = %self.node, move_id = %mv.id(), block = %mv.block(), pending, "Admitted move");
            }
            Err(reason) => {
                metrics::record_rejected(reason);
                debug!(node = %self.node, move_id = %mv.id(), %reason, pending, "Refused move");
            }
        }

        result
    }

    /// Boolean form of [`NodeController::try_admit`].
    pub fn try_admit_move(&self, mv: &PendingMove) -> bool {
        self.try_admit(mv).is_ok()
    }

    /// Remove `mv` from the pending set.
    ///
    /// Returns false, and changes nothing, if the move is not pending here
    /// (never admitted, or already released).
    pub fn release_move(&self, mv: &PendingMove) -> bool {
        let removed = self.lock().pending.remove(&mv.id()).is_some();

        if removed {
            metrics::record_released();
            debug!(node = %self.node, move_id = %mv.id(), "Released move");
        }

        removed
    }

    // ------------------------------------------------------------------
    // Backoff
    // ------------------------------------------------------------------

    /// Refuse admissions for `duration` from now.
    ///
    /// Overwrites any cooldown already in effect: the last call wins, even
    /// when it is shorter than the remaining time of the previous one.
    /// Callers that report failures from several places and expect the
    /// longer deadline to hold must compare [`NodeController::delay_remaining`]
    /// themselves.
    pub fn activate_delay(&self, duration: Duration) {
        {
            let mut state = self.lock();
            state.delay = Some(Cooldown {
                started: self.clock.now(),
                length: duration,
            });
        }

        metrics::record_delay();
        warn!(node = %self.node, delay_ms = millis(duration), "Node cooldown activated");
    }

    /// Whether a cooldown is currently in effect. Clears an expired one.
    pub fn is_delay_active(&self) -> bool {
        let now = self.clock.now();
        self.lock().is_delay_active(now)
    }

    /// Time left on the current cooldown, if any. Clears an expired one.
    pub fn delay_remaining(&self) -> Option<Duration> {
        let mut state = self.lock();
        let now = self.clock.now();
        if !state.is_delay_active(now) {
            return None;
        }
        state.delay.map(|cooldown| cooldown.remaining(now))
    }

    /// Set the sticky failure flag.
    ///
    /// Does not block admission by itself; the dispatcher reads
    /// [`NodeController::has_failure`] to decide whether to keep scheduling
    /// onto this node.
    pub fn mark_failed(&self) {
        let first = {
            let mut state = self.lock();
            let first = !state.has_failure;
            state.has_failure = true;
            first
        };

        if first {
            metrics::record_node_failed();
            warn!(node = %self.node, "Node marked as failed");
        }
    }

    pub fn has_failure(&self) -> bool {
        self.lock().has_failure
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether any admitted move has not been released yet
    pub fn has_pending_moves(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// Whether the pending set is full
    pub fn is_at_capacity(&self) -> bool {
        self.lock().pending.len() >= self.max_concurrent_moves
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Snapshot of the moves currently in flight
    pub fn pending_moves(&self) -> Vec<PendingMove> {
        self.lock().pending.values().cloned().collect()
    }

    /// Serializable view of this node's admission state
    pub fn status(&self) -> NodeStatus {
        let mut state = self.lock();
        let now = self.clock.now();
        let delay_remaining_ms = if state.is_delay_active(now) {
            state
                .delay
                .map(|cooldown| millis(cooldown.remaining(now)))
        } else {
            None
        };

        let mut source_tiers: Vec<StorageTier> = state.sources.keys().cloned().collect();
        source_tiers.sort();
        let mut target_tiers: Vec<StorageTier> = state.targets.keys().cloned().collect();
        target_tiers.sort();

        NodeStatus {
            node: self.node.storage_id.clone(),
            source_tiers,
            target_tiers,
            pending: state.pending.len(),
            max_concurrent_moves: self.max_concurrent_moves,
            delay_remaining_ms,
            has_failure: state.has_failure,
        }
    }
}

impl fmt::Debug for NodeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeController")
            .field("node", &self.node.storage_id)
            .field("max_concurrent_moves", &self.max_concurrent_moves)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for NodeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeController:{}", self.node)
    }
}

// ============================================================================
// Tests
// ============================================================================
