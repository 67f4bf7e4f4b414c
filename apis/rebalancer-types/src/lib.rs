// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2020 Joyent, Inc.
// Copyright 2026 Edgecast Cloud LLC.

//! Shared types for block rebalancing.
//!
//! This crate contains the common data structures used by the per-node move
//! admission controller and by the dispatcher that drives it: node identity,
//! storage tier labels, move identifiers, and the outcome/status types that
//! flow between them.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, VariantNames};
use uuid::Uuid;

// ============================================================================
// Type Aliases
// ============================================================================

/// Storage node identifier (hostname)
pub type StorageId = String;

/// Block identifier
pub type BlockId = String;

/// Storage tier label (e.g., "SSD", "DISK", "ARCHIVE")
pub type StorageTier = String;

// ============================================================================
// Node Types
// ============================================================================

/// Identity of one physical storage node.
///
/// Only `storage_id` takes part in equality and hashing; the address and
/// datacenter are carried along for logging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// The storage node identifier (e.g., "1.stor.domain.com")
    pub storage_id: StorageId,
    /// Transfer address of the node (e.g., "10.0.0.5:9866")
    pub address: String,
    /// The datacenter name where this storage node is located
    pub datacenter: String,
}

impl NodeIdentity {
    /// Create a node identity
    pub fn new(
        storage_id: impl Into<String>,
        address: impl Into<String>,
        datacenter: impl Into<String>,
    ) -> Self {
        Self {
            storage_id: storage_id.into(),
            address: address.into(),
            datacenter: datacenter.into(),
        }
    }
}

impl PartialEq for NodeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.storage_id == other.storage_id
    }
}

impl Eq for NodeIdentity {}

impl std::hash::Hash for NodeIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.storage_id.hash(state);
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_id)
    }
}

// ============================================================================
// Move Types
// ============================================================================

/// Identifier of one pending move.
///
/// Every call to [`MoveId::new`] produces a distinct value, which is what
/// gives pending moves identity-based equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveId(Uuid);

impl MoveId {
    /// Allocate a fresh move identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MoveId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a move as observed by the dispatcher.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Block was copied to the target and the source replica dropped
    Success,
    /// Transfer failed because of trouble on one of the nodes
    Failed,
    /// The dispatcher gave up waiting for the transfer
    Timeout,
}

impl MoveOutcome {
    /// Whether this outcome should put the source node into cooldown.
    pub fn triggers_delay(&self) -> bool {
        !matches!(self, MoveOutcome::Success)
    }
}

/// Why a node refused to admit a move.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The node is cooling down after a failure
    DelayActive,
    /// The node already has its maximum number of moves in flight
    AtCapacity,
    /// The move is already pending on this node
    AlreadyPending,
}

// ============================================================================
// Status Types
// ============================================================================

/// Point-in-time view of one node's admission state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// The node this status describes
    pub node: StorageId,
    /// Tiers registered as sources, sorted
    pub source_tiers: Vec<StorageTier>,
    /// Tiers registered as targets, sorted
    pub target_tiers: Vec<StorageTier>,
    /// Number of moves currently in flight
    pub pending: usize,
    /// Configured concurrency cap
    pub max_concurrent_moves: usize,
    /// Milliseconds of cooldown left, if a delay is active
    pub delay_remaining_ms: Option<u64>,
    /// Sticky failure flag
    pub has_failure: bool,
}

impl NodeStatus {
    /// Whether the node can accept another move right now.
    pub fn is_available(&self) -> bool {
        self.delay_remaining_ms.is_none() && self.pending < self.max_concurrent_moves
    }
}

// ============================================================================
// Tests
// ============================================================================
