// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2019 Joyent, Inc.
// Copyright 2026 Edgecast Cloud LLC.

/// This module provides helper functions that generate pseudorandom output.
pub mod random {
    use quickcheck::{Arbitrary, Gen};

    /// Tier labels seen on real clusters.
    pub const TIERS: &[&str] = &["ARCHIVE", "DISK", "SSD", "RAM_DISK", "PROVIDED"];

    /// Generate a random [`String`] of size `len` containing only lowercase
    /// alphanumeric characters (a-z, 0-9) using the provided generator `g`.
    pub fn string(g: &mut Gen, len: usize) -> String {
        (0..len)
            .map(|_| {
                let c = u8::arbitrary(g);
                match c % 36 {
                    n @ 0..=25 => (b'a' + n) as char,
                    n => (b'0' + (n - 26)) as char,
                }
            })
            .collect()
    }

    /// Generate a storage node identifier of the form `<n>.stor.<domain>.com`.
    pub fn storage_id(g: &mut Gen) -> String {
        let n = u16::arbitrary(g) % 1000;
        format!("{}.stor.{}.com", n, string(g, 8))
    }

    /// Pick one of the well-known tier labels.
    pub fn tier(g: &mut Gen) -> String {
        g.choose(TIERS).copied().unwrap_or("DISK").to_string()
    }

    /// Generate a value in `1..=max`.
    pub fn positive(g: &mut Gen, max: usize) -> usize {
        usize::arbitrary(g) % max.max(1) + 1
    }
}
