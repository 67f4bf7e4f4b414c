// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Error types for move admission

use thiserror::Error;

/// Setup-time errors.
///
/// Admission rejections and redundant releases are not errors; they are
/// reported as plain booleans (or [`rebalancer_types::RejectReason`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// The concurrency cap must be positive
    #[error("Invalid max concurrent moves: {0} (must be > 0)")]
    InvalidConcurrency(usize),

    /// The tier is already registered as a source on this node
    #[error("Source tier {tier} already registered on node {node}")]
    DuplicateSource { node: String, tier: String },

    /// The tier is already registered as a target on this node
    #[error("Target tier {tier} already registered on node {node}")]
    DuplicateTarget { node: String, tier: String },
}
