// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Rebalancer Move Admission Library
//!
//! This library decides, per storage node, whether a proposed block move may
//! be scheduled now. It tracks moves in flight against a per-node
//! concurrency cap and keeps a node in cooldown after failures. Choosing
//! which blocks to move, and performing the transfer, are left to the
//! dispatcher that drives it.

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod group;
pub mod metrics;
pub mod node;
pub mod pending;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AdmissionConfig;
pub use dispatch::NodeTable;
pub use error::AdmissionError;
pub use group::{Source, StorageGroup, Target};
pub use node::NodeController;
pub use pending::PendingMove;
