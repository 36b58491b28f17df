use std::time::Duration;

use tokio::time::Instant;

use crate::error::ReplayError;

/// Playback speed multiplier. 1.0 reproduces original timing; values
/// above 1 play faster, below 1 slower. Must be finite and positive,
/// checked at configuration time rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed(f64);

impl Speed {
    pub fn new(value: f64) -> Result<Self, ReplayError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ReplayError::config(format!(
                "speed must be a positive finite number, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// Maps capture timestamps to wall-clock delivery deadlines.
///
/// Anchored at the first record of a run: `anchor_us` maps to `started`,
/// and every later timestamp lands at
/// `started + (timestamp - anchor) / speed`. A deadline already in the
/// past produces no wait; records are never dropped to catch up.
#[derive(Debug, Clone, Copy)]
pub struct ReplayClock {
    started: Instant,
    anchor_us: i64,
    speed: Speed,
}

impl ReplayClock {
    pub fn anchored_at(started: Instant, anchor_us: i64, speed: Speed) -> Self {
        Self {
            started,
            anchor_us,
            speed,
        }
    }

    /// Wall-clock instant at which the record carrying `timestamp_us`
    /// should be delivered.
    pub fn deadline_for(&self, timestamp_us: i64) -> Instant {
        self.started + self.scaled_offset(timestamp_us)
    }

    /// Scaled time from the anchor to `timestamp_us`, in seconds. This is
    /// what the verbose trace line shows.
    pub fn scaled_elapsed_secs(&self, timestamp_us: i64) -> f64 {
        (timestamp_us - self.anchor_us) as f64 / self.speed.get() / 1e6
    }

    fn scaled_offset(&self, timestamp_us: i64) -> Duration {
        // Timestamps are non-decreasing, so the offset never goes negative
        // for a well-formed log; clamp keeps a malformed one from panicking.
        let us = (timestamp_us - self.anchor_us).max(0) as f64 / self.speed.get();
        Duration::from_secs_f64(us / 1e6)
    }
}
