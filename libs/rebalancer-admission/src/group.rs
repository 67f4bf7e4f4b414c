// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Storage groups: a (node, tier) pair acting as a source or a target

use std::fmt;

use rebalancer_types::{NodeIdentity, StorageTier};

/// One storage tier on one node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageGroup {
    node: NodeIdentity,
    tier: StorageTier,
}

impl StorageGroup {
    pub(crate) fn new(node: NodeIdentity, tier: StorageTier) -> Self {
        Self { node, tier }
    }

    /// The node this group lives on
    pub fn node(&self) -> &NodeIdentity {
        &self.node
    }

    /// The storage tier label
    pub fn tier(&self) -> &str {
        &self.tier
    }
}

impl fmt::Display for StorageGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.tier)
    }
}

/// A storage group that can donate blocks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source(StorageGroup);

/// A storage group that can receive blocks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(StorageGroup);

macro_rules! group_role {
    ($role:ident) => {
        impl $role {
            pub(crate) fn new(node: NodeIdentity, tier: StorageTier) -> Self {
                Self(StorageGroup::new(node, tier))
            }

            /// The underlying storage group
            pub fn group(&self) -> &StorageGroup {
                &self.0
            }

            /// The node this group lives on
            pub fn node(&self) -> &NodeIdentity {
                self.0.node()
            }

            /// The storage tier label
            pub fn tier(&self) -> &str {
                self.0.tier()
            }
        }

        impl fmt::Display for $role {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

group_role!(Source);
group_role!(Target);
