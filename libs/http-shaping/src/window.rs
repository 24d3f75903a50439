use std::num::NonZeroU64;

use serde::Serialize;
use tracing::debug;

/// Byte sums accumulated over one fixed-length interval.
///
/// A window is reset in place once `interval_secs` have elapsed since
/// `begin_timestamp`; it is never replaced.
#[derive(Debug)]
pub struct Window {
    begin_timestamp: i64,
    interval_secs: NonZeroU64,
    sum_in: u64,
    sum_out: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSnapshot {
    pub begin_timestamp: i64,
    pub interval_secs: u64,
    pub sum_in: u64,
    pub sum_out: u64,
}

impl Window {
    pub fn new(begin_timestamp: i64, interval_secs: NonZeroU64) -> Self {
        Self {
            begin_timestamp,
            interval_secs,
            sum_in: 0,
            sum_out: 0,
        }
    }

    /// Starts a fresh window at `now` if the current one has elapsed.
    ///
    /// Returns whether a reset happened. A clock that moved backwards never
    /// resets the window.
    pub fn maybe_reset(&mut self, now: i64) -> bool {
        let elapsed = now.saturating_sub(self.begin_timestamp);
        if elapsed < 0 || (elapsed as u64) < self.interval_secs.get() {
            return false;
        }

        debug!(
            previous_begin = self.begin_timestamp,
            sum_in = self.sum_in,
            sum_out = self.sum_out,
            "Resetting shaping window"
        );

        self.begin_timestamp = now;
        self.sum_in = 0;
        self.sum_out = 0;
        true
    }

    pub fn record_in(&mut self, bytes: u64) {
        self.sum_in = self.sum_in.saturating_add(bytes);
    }

    pub fn record_out(&mut self, bytes: u64) {
        self.sum_out = self.sum_out.saturating_add(bytes);
    }

    pub fn sum_in(&self) -> u64 {
        self.sum_in
    }

    pub fn sum_out(&self) -> u64 {
        self.sum_out
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            begin_timestamp: self.begin_timestamp,
            interval_secs: self.interval_secs.get(),
            sum_in: self.sum_in,
            sum_out: self.sum_out,
        }
    }
}
