//! Key press correlation

use super::{close_interval, OrphanPolicy};
use crate::hub::keymap::{is_allowed, normalize, normalize_list};
use crate::hub::RawEvent;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// One key press interval.
///
/// At least one of `t_down`/`t_up` is present. `duration` is `t_up - t_down`
/// exactly when both are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Lowercase key name
    pub key: String,
    pub t_down: Option<f64>,
    pub t_up: Option<f64>,
    pub duration: Option<f64>,
}

impl KeyRecord {
    fn pressed(key: String, t_down: f64) -> Self {
        Self {
            key,
            t_down: Some(t_down),
            t_up: None,
            duration: None,
        }
    }

    fn released_only(key: String, t_up: f64) -> Self {
        Self {
            key,
            t_down: None,
            t_up: Some(t_up),
            duration: None,
        }
    }

    /// Still waiting for its release
    pub fn is_open(&self) -> bool {
        self.t_down.is_some() && self.t_up.is_none()
    }

    /// Release without a recorded press
    pub fn is_orphan(&self) -> bool {
        self.t_down.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.t_down.is_some() && self.t_up.is_some()
    }
}

/// Pairs key presses with releases over one batch of events
#[derive(Debug, Clone)]
pub struct KeyCorrelator {
    allow: Vec<String>,
    policy: OrphanPolicy,
    base_time: f64,
    records: Vec<KeyRecord>,
    orphans_dropped: usize,
}

impl KeyCorrelator {
    /// `allow` is matched case-insensitively; empty accepts every key.
    /// `base_time` is subtracted from every raw timestamp.
    pub fn new<S: AsRef<str>>(allow: &[S], policy: OrphanPolicy, base_time: f64) -> Self {
        Self {
            allow: normalize_list(allow),
            policy,
            base_time,
            records: Vec::new(),
            orphans_dropped: 0,
        }
    }

    pub fn on_event(&mut self, event: &RawEvent) {
        match event {
            RawEvent::KeyDown { key, time } => {
                let key = normalize(key);
                if is_allowed(&self.allow, &key) {
                    self.records.push(KeyRecord::pressed(key, time - self.base_time));
                }
            }
            RawEvent::KeyUp { key, time } => {
                let key = normalize(key);
                if is_allowed(&self.allow, &key) {
                    self.release(key, time - self.base_time);
                }
            }
            RawEvent::ButtonDown { .. }
            | RawEvent::ButtonUp { .. }
            | RawEvent::Motion { .. }
            | RawEvent::Drag { .. } => {}
        }
    }

    pub fn extend<'a>(&mut self, events: impl IntoIterator<Item = &'a RawEvent>) {
        for event in events {
            self.on_event(event);
        }
    }

    fn release(&mut self, key: String, t_up: f64) {
        // Earliest unresolved press wins, so repeated presses resolve in order
        if let Some(record) = self.records.iter_mut().find(|r| r.key == key && r.is_open()) {
            (record.t_up, record.duration) = close_interval(record.t_down, t_up);
            trace!("paired '{}' {:?} -> {:.4}", key, record.t_down, t_up);
            return;
        }

        match self.policy {
            OrphanPolicy::RetainAsUnique => {
                debug!("orphaned release of '{}' at {:.4} retained", key, t_up);
                self.records.push(KeyRecord::released_only(key, t_up));
            }
            OrphanPolicy::Discard => {
                debug!("orphaned release of '{}' at {:.4} discarded", key, t_up);
                self.orphans_dropped += 1;
            }
        }
    }

    pub fn records(&self) -> &[KeyRecord] {
        &self.records
    }

    /// Presses still waiting for a release
    pub fn open_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_open()).count()
    }

    pub fn orphans_dropped(&self) -> usize {
        self.orphans_dropped
    }

    pub fn into_records(self) -> Vec<KeyRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::replay::{button_down, key_down, key_up};
    use crate::hub::Button;

    fn correlate(events: &[RawEvent], allow: &[&str], policy: OrphanPolicy) -> Vec<KeyRecord> {
        let mut correlator = KeyCorrelator::new(allow, policy, 0.0);
        correlator.extend(events);
        correlator.into_records()
    }

    fn assert_invariants(records: &[KeyRecord]) {
        for r in records {
            assert!(r.t_down.is_some() || r.t_up.is_some());
            match (r.t_down, r.t_up) {
                (Some(d), Some(u)) => assert_eq!(r.duration, Some(u - d)),
                _ => assert_eq!(r.duration, None),
            }
        }
    }

    #[test]
    fn press_and_release_pair() {
        let records = correlate(
            &[key_down("j", 0.5), key_up("j", 0.75)],
            &[],
            OrphanPolicy::Discard,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].t_down, Some(0.5));
        assert_eq!(records[0].t_up, Some(0.75));
        assert_eq!(records[0].duration, Some(0.25));
    }

    #[test]
    fn repeated_presses_pair_in_order() {
        let records = correlate(
            &[
                key_down("a", 1.0),
                key_down("a", 3.0),
                key_up("a", 2.0),
                key_up("a", 4.0),
            ],
            &[],
            OrphanPolicy::Discard,
        );
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].t_down, records[0].t_up), (Some(1.0), Some(2.0)));
        assert_eq!((records[1].t_down, records[1].t_up), (Some(3.0), Some(4.0)));
        assert_invariants(&records);
    }

    #[test]
    fn interleaved_keys_pair_independently() {
        let records = correlate(
            &[
                key_down("f", 0.1),
                key_down("j", 0.2),
                key_up("f", 0.3),
                key_up("j", 0.4),
            ],
            &[],
            OrphanPolicy::Discard,
        );
        assert_eq!(records[0].key, "f");
        assert_eq!(records[0].duration, Some(0.3 - 0.1));
        assert_eq!(records[1].key, "j");
        assert_eq!(records[1].duration, Some(0.4 - 0.2));
    }

    #[test]
    fn unreleased_press_stays_open() {
        let records = correlate(&[key_down("y", 0.9)], &[], OrphanPolicy::Discard);
        assert!(records[0].is_open());
        assert_invariants(&records);
    }

    #[test]
    fn orphan_release_discarded_by_default() {
        let mut correlator = KeyCorrelator::new::<&str>(&[], OrphanPolicy::Discard, 0.0);
        correlator.on_event(&key_up("q", 0.2));
        assert!(correlator.records().is_empty());
        assert_eq!(correlator.orphans_dropped(), 1);
    }

    #[test]
    fn orphan_release_retained_when_requested() {
        let records = correlate(&[key_up("q", 0.2)], &[], OrphanPolicy::RetainAsUnique);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_orphan());
        assert_eq!(records[0].t_up, Some(0.2));
        assert_invariants(&records);
    }

    #[test]
    fn allow_list_filters_case_insensitively() {
        let records = correlate(
            &[
                key_down("Return", 0.1),
                key_down("x", 0.2),
                key_up("return", 0.3),
                key_up("x", 0.4),
            ],
            &["RETURN"],
            OrphanPolicy::RetainAsUnique,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "return");
        assert!(records[0].is_complete());
    }

    #[test]
    fn base_time_is_subtracted() {
        let mut correlator = KeyCorrelator::new::<&str>(&[], OrphanPolicy::Discard, 10.0);
        correlator.on_event(&key_down("a", 10.5));
        assert_eq!(correlator.records()[0].t_down, Some(0.5));
    }

    #[test]
    fn mouse_events_are_ignored() {
        let records = correlate(
            &[button_down(Button::Left, 0.0, 0.0, 0.1)],
            &[],
            OrphanPolicy::RetainAsUnique,
        );
        assert!(records.is_empty());
    }
}
