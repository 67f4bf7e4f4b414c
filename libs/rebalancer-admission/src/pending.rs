// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Pending block moves

use std::fmt;
use std::hash::{Hash, Hasher};

use rebalancer_types::{BlockId, MoveId};

use crate::group::{Source, Target};

/// Token for one block relocation from a source group to a target group.
///
/// Equality and hashing use only the [`MoveId`] allocated by
/// [`PendingMove::new`], so two moves built from identical parameters are
/// still distinct. A clone refers to the same move.
#[derive(Debug, Clone)]
pub struct PendingMove {
    id: MoveId,
    block: BlockId,
    source: Source,
    target: Target,
}

impl PendingMove {
    /// Create a move with a fresh identity
    pub fn new(block: impl Into<BlockId>, source: &Source, target: &Target) -> Self {
        Self {
            id: MoveId::new(),
            block: block.into(),
            source: source.clone(),
            target: target.clone(),
        }
    }

    pub fn id(&self) -> MoveId {
        self.id
    }

    pub fn block(&self) -> &str {
        &self.block
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Whether source and target live on the same node (a tier change
    /// rather than a network transfer).
    pub fn is_local(&self) -> bool {
        self.source.node() == self.target.node()
    }
}

impl PartialEq for PendingMove {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PendingMove {}

impl Hash for PendingMove {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for PendingMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}: {} -> {})",
            self.id, self.block, self.source, self.target
        )
    }
}
