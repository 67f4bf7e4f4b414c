// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! End-to-end tests for the node table.
//!
//! A small dispatcher loop hands reserved moves to worker threads over
//! channels and records their outcomes, the way a mover drives the table
//! during a rebalance pass.

// Allow unwrap/expect in tests - panicking on setup failures is acceptable
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use rebalancer_admission::{AdmissionConfig, ManualClock, NodeTable, PendingMove};
use rebalancer_types::{MoveOutcome, NodeIdentity};

const CAP: usize = 2;
const MOVES: usize = 60;

fn node(id: &str) -> NodeIdentity {
    NodeIdentity::new(id, format!("{}:9866", id), "east-1")
}

fn make_table(clock: Arc<ManualClock>) -> Arc<NodeTable> {
    let config = AdmissionConfig {
        max_concurrent_moves: CAP,
        failure_delay_ms: 100,
    };
    Arc::new(NodeTable::with_clock(config, clock).unwrap())
}

#[test]
fn simulated_pass_drains_all_moves() {
    let clock = Arc::new(ManualClock::new());
    let table = make_table(clock.clone());

    let sources: Vec<_> = (1..=3)
        .map(|i| {
            let ctl = table.add_node(node(&format!("{}.stor", i))).unwrap();
            ctl.register_source("DISK").unwrap()
        })
        .collect();
    let targets: Vec<_> = (4..=6)
        .map(|i| {
            let ctl = table.add_node(node(&format!("{}.stor", i))).unwrap();
            ctl.register_target("DISK").unwrap()
        })
        .collect();

    let mut queue: VecDeque<PendingMove> = (0..MOVES)
        .map(|i| PendingMove::new(format!("blk_{}", i), &sources[i % 3], &targets[i % 3]))
        .collect();

    let (work_tx, work_rx) = crossbeam_channel::unbounded::<PendingMove>();
    let (done_tx, done_rx) = crossbeam_channel::unbounded::<(PendingMove, MoveOutcome)>();

    // Every transfer into 6.stor fails
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let rx = work_rx.clone();
            let tx = done_tx.clone();
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for mv in rx.iter() {
                    for id in [
                        &mv.source().node().storage_id,
                        &mv.target().node().storage_id,
                    ] {
                        assert!(table.node(id).unwrap().pending_count() <= CAP);
                    }
                    let outcome = if mv.target().node().storage_id == "6.stor" {
                        MoveOutcome::Failed
                    } else {
                        MoveOutcome::Success
                    };
                    tx.send((mv, outcome)).unwrap();
                }
            })
        })
        .collect();
    drop(done_tx);

    let mut completed = 0;
    let mut abandoned = 0;

    loop {
        let mut deferred = VecDeque::new();
        while let Some(mv) = queue.pop_front() {
            let target_failed = table
                .node(&mv.target().node().storage_id)
                .map(|n| n.has_failure())
                .unwrap_or(true);
            if target_failed {
                abandoned += 1;
                continue;
            }
            if table.try_reserve(&mv) {
                work_tx.send(mv).unwrap();
            } else {
                deferred.push_back(mv);
            }
        }
        queue = deferred;

        if queue.is_empty() && !table.has_pending_moves() {
            break;
        }

        if table.has_pending_moves() {
            let (mv, outcome) = done_rx.recv().unwrap();
            match outcome {
                MoveOutcome::Success => completed += 1,
                _ => abandoned += 1,
            }
            assert!(table.record_outcome(&mv, outcome));
        } else {
            // Everything left is waiting out a cooldown
            clock.advance(Duration::from_millis(101));
        }
    }

    drop(work_tx);
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(completed + abandoned, MOVES);
    assert_eq!(completed, MOVES / 3 * 2);

    let failed: Vec<String> = table
        .statuses()
        .into_iter()
        .filter(|s| s.has_failure)
        .map(|s| s.node)
        .collect();
    assert_eq!(failed, vec!["6.stor"]);
    assert_eq!(table.schedulable_nodes().len(), 5);
}

#[test]
fn concurrent_add_node_yields_one_controller() {
    const WORKERS: usize = 16;

    let table = make_table(Arc::new(ManualClock::new()));
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let table = Arc::clone(&table);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                table.add_node(node("1.stor")).unwrap()
            })
        })
        .collect();

    let controllers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for ctl in &controllers[1..] {
        assert!(Arc::ptr_eq(&controllers[0], ctl));
    }
    assert_eq!(table.len(), 1);
}

#[test]
fn racing_reservations_respect_both_ends() {
    const WORKERS: usize = 24;

    let table = make_table(Arc::new(ManualClock::new()));
    let src = table.add_node(node("1.stor")).unwrap();
    let dst_a = table.add_node(node("2.stor")).unwrap();
    let dst_b = table.add_node(node("3.stor")).unwrap();
    let source = src.register_source("DISK").unwrap();
    let target_a = dst_a.register_target("DISK").unwrap();
    let target_b = dst_b.register_target("DISK").unwrap();

    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = (0..WORKERS)
        .map(|i| {
            let table = Arc::clone(&table);
            let barrier = Arc::clone(&barrier);
            let target = if i % 2 == 0 { &target_a } else { &target_b };
            let mv = PendingMove::new(format!("blk_{}", i), &source, target);
            thread::spawn(move || {
                barrier.wait();
                table.try_reserve(&mv)
            })
        })
        .collect();

    let reserved = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    // The shared source caps the total; rolled-back targets hold nothing extra
    assert_eq!(reserved, CAP);
    assert_eq!(src.pending_count(), CAP);
    assert_eq!(dst_a.pending_count() + dst_b.pending_count(), CAP);
}
