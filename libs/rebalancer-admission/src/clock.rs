// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Monotonic clock sources
//!
//! Cooldown deadlines are measured against a [`Clock`] rather than
//! `Instant::now()` directly so that the dispatcher (and tests) can drive
//! time explicitly.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A source of monotonic time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current monotonic instant. Must never go backward.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Time starts at the instant the clock is created and advances by the
/// durations passed to [`ManualClock::advance`]. Elapsed time saturates at
/// the furthest instant the platform can represent, capped at
/// [`MAX_ELAPSED`].
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    limit: Duration,
    elapsed: Mutex<Duration>,
}

/// Upper bound on how far a [`ManualClock`] can be advanced.
pub const MAX_ELAPSED: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

impl ManualClock {
    /// Create a clock sitting at t=0.
    pub fn new() -> Self {
        let origin = Instant::now();
        let limit = if origin.checked_add(MAX_ELAPSED).is_some() {
            MAX_ELAPSED
        } else {
            Duration::ZERO
        };
        Self {
            origin,
            limit,
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed = elapsed.saturating_add(by).min(self.limit);
    }

    /// Move the clock to `at` past the origin. Ignored if that would go
    /// backward.
    pub fn set_elapsed(&self, at: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        let at = at.min(self.limit);
        if at > *elapsed {
            *elapsed = at;
        }
    }

    /// Time elapsed since the origin.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin
            .checked_add(self.elapsed())
            .unwrap_or(self.origin)
    }
}
