//! Session time base
//!
//! Every device session owns a [`TimeBase`] anchored on the hub's monotonic
//! timeline. Raw event timestamps are rebased against it, or against a
//! caller-supplied clock when one is given to a query.

use serde::{Deserialize, Serialize};

/// Reference instant against which event timestamps are rebased
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBase {
    /// Reference instant, in seconds on this clock's own timeline
    reference_instant: f64,
    /// Origin of the hub timeline expressed on this clock's timeline.
    /// `None` when the clock already runs on the hub timeline.
    external_offset: Option<f64>,
}

impl TimeBase {
    /// Create a time base anchored at `now` on the hub timeline
    pub fn started_at(now: f64) -> Self {
        Self {
            reference_instant: now,
            external_offset: None,
        }
    }

    /// Create a clock that lives on a foreign timeline.
    ///
    /// `hub_origin` is the instant, on the foreign timeline, at which the hub
    /// timeline reads zero.
    pub fn foreign(reference_instant: f64, hub_origin: f64) -> Self {
        Self {
            reference_instant,
            external_offset: Some(hub_origin),
        }
    }

    /// Capture `now` as the new reference instant.
    ///
    /// Only the reference moves; buffered events are the session's business.
    pub fn reset(&mut self, now: f64) {
        self.reference_instant = now;
    }

    /// Reference instant expressed on the hub timeline
    pub fn hub_reference(&self) -> f64 {
        self.reference_instant - self.external_offset.unwrap_or(0.0)
    }

    /// Seconds elapsed on this clock when the hub reads `hub_now`
    pub fn elapsed(&self, hub_now: f64) -> f64 {
        hub_now - self.hub_reference()
    }

    /// Base time subtracted from raw timestamps: this session's reference, or
    /// the external clock's reference when one is supplied.
    pub fn base_time(&self, external: Option<&TimeBase>) -> f64 {
        match external {
            Some(clock) => clock.hub_reference(),
            None => self.reference_instant,
        }
    }

    /// Rebase a raw hub timestamp. Negative results mean the event predates
    /// the reference.
    pub fn rebase(&self, raw_timestamp: f64, external: Option<&TimeBase>) -> f64 {
        raw_timestamp - self.base_time(external)
    }
}
