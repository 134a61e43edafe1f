//! Server clock offset estimation
//!
//! Each `request-sync` round trip yields one sample: the `sync-state` stamp
//! is taken when the server answers, so the server clock at the midpoint of
//! the round trip is known. The sample with the shortest round trip wins.
//! Until a sample exists there is no estimate; callers measure elapsed time
//! from local receipt instead of trusting the local wall clock.

use std::collections::VecDeque;

/// Samples kept for the estimate
const WINDOW: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    offset_ms: i64,
    rtt_ms: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ClockSync {
    samples: VecDeque<Sample>,
}

impl ClockSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one round trip: request sent at `sent_ms`, answered with
    /// `server_ms`, received at `received_ms` (local clock)
    pub fn record(&mut self, sent_ms: i64, server_ms: i64, received_ms: i64) {
        if received_ms < sent_ms {
            tracing::debug!(sent_ms, received_ms, "Ignoring clock sample with negative round trip");
            return;
        }
        let rtt_ms = received_ms - sent_ms;
        let midpoint = sent_ms + rtt_ms / 2;

        if self.samples.len() == WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            offset_ms: server_ms - midpoint,
            rtt_ms,
        });
    }

    /// Best current estimate of `server - local` (ms); `None` until sampled
    pub fn offset_ms(&self) -> Option<i64> {
        self.samples
            .iter()
            .min_by_key(|s| s.rtt_ms)
            .map(|s| s.offset_ms)
    }

    /// Round trip of the sample the estimate comes from
    pub fn best_rtt_ms(&self) -> Option<i64> {
        self.samples.iter().map(|s| s.rtt_ms).min()
    }

    /// Server clock at `local_now_ms`, once an offset is known
    pub fn server_now(&self, local_now_ms: i64) -> Option<i64> {
        self.offset_ms().map(|offset| local_now_ms + offset)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
