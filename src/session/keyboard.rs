//! Keyboard session

use super::{KeyQuery, KeyTrigger, WaitOptions};
use crate::clock::TimeBase;
use crate::correlate::{KeyCorrelator, KeyRecord};
use crate::error::{Result, TimingError};
use crate::hub::keymap::{is_allowed, normalize, normalize_list};
use crate::hub::{Device, DeviceHub, SharedHub};
use log::debug;
use std::thread;

/// Keyboard responses timed against a resettable zero point
pub struct Keyboard<H: DeviceHub> {
    hub: SharedHub<H>,
    time_base: TimeBase,
}

impl<H: DeviceHub> Keyboard<H> {
    /// Start a session. Keyboard events buffered so far are discarded.
    pub fn new(hub: SharedHub<H>) -> Self {
        let now = {
            let mut h = hub.borrow_mut();
            h.clear_events(Device::Keyboard);
            h.now()
        };
        Self {
            hub,
            time_base: TimeBase::started_at(now),
        }
    }

    /// Discard buffered keyboard events and make now the zero point
    pub fn reset(&mut self) {
        let mut hub = self.hub.borrow_mut();
        let now = hub.now();
        self.time_base.reset(now);
        hub.clear_events(Device::Keyboard);
        debug!("keyboard reset at {:.4}", now);
    }

    pub fn time_base(&self) -> &TimeBase {
        &self.time_base
    }

    /// Key press records since the last clearing query or reset
    pub fn get_keys(&mut self, query: &KeyQuery) -> Vec<KeyRecord> {
        let base = self.time_base.base_time(query.clock.as_ref());
        let events = self
            .hub
            .borrow_mut()
            .get_events(Device::Keyboard, None, query.clear_events);

        let mut correlator = KeyCorrelator::new(&query.keys, query.policy(), base);
        correlator.extend(&events);

        let open = correlator.open_count();
        if query.clear_events && open > 0 {
            debug!("{} open key press(es) cleared before release", open);
        }
        debug!(
            "keyboard query: {} event(s) -> {} record(s)",
            events.len(),
            correlator.records().len()
        );
        correlator.into_records()
    }

    /// Block until the first `trigger` event for an allowed key, then return
    /// `get_keys(query)`.
    ///
    /// The session is reset when the wait starts, so the returned times are
    /// relative to the call unless the query names another clock.
    pub fn wait_keys(
        &mut self,
        query: &KeyQuery,
        trigger: KeyTrigger,
        options: &WaitOptions,
    ) -> Result<Vec<KeyRecord>> {
        self.reset();
        let allow = normalize_list(&query.keys);
        let types = trigger.event_types();
        let started = self.hub.borrow().now();

        loop {
            let found = {
                let mut hub = self.hub.borrow_mut();
                if !hub.is_running() {
                    return Err(TimingError::WaitCancelled);
                }
                hub.get_events(Device::Keyboard, Some(types), false)
                    .iter()
                    .filter_map(|e| e.key())
                    .any(|key| is_allowed(&allow, &normalize(key)))
            };
            if found {
                return Ok(self.get_keys(query));
            }

            if options.is_cancelled() {
                debug!("key wait cancelled");
                return Err(TimingError::WaitCancelled);
            }
            if let Some(timeout) = options.timeout {
                let waited = self.hub.borrow().now() - started;
                if waited >= timeout {
                    return Err(TimingError::WaitTimedOut { after: waited });
                }
            }
            if !options.poll_interval.is_zero() {
                thread::sleep(options.poll_interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::replay::{key_down, key_up};
    use crate::hub::{share, ReplayHub};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn session(events: Vec<crate::hub::RawEvent>) -> (SharedHub<ReplayHub>, Keyboard<ReplayHub>) {
        let hub = share(ReplayHub::default());
        let keyboard = Keyboard::new(hub.clone());
        hub.borrow_mut().schedule_all(events);
        (hub, keyboard)
    }

    #[test]
    fn new_session_discards_earlier_events() {
        let hub = share(ReplayHub::default());
        hub.borrow_mut().schedule(key_down("a", 0.0));
        let mut keyboard = Keyboard::new(hub.clone());
        assert!(keyboard.get_keys(&KeyQuery::new()).is_empty());
    }

    #[test]
    fn clearing_query_empties_the_window() {
        let (_hub, mut keyboard) = session(vec![key_down("a", 0.0), key_up("a", 0.0)]);
        assert_eq!(keyboard.get_keys(&KeyQuery::new()).len(), 1);
        assert!(keyboard.get_keys(&KeyQuery::new()).is_empty());
    }

    #[test]
    fn keep_events_allows_rereading() {
        let (_hub, mut keyboard) = session(vec![key_down("a", 0.0)]);
        let query = KeyQuery::new().keep_events();
        assert_eq!(keyboard.get_keys(&query).len(), 1);
        assert_eq!(keyboard.get_keys(&query).len(), 1);
    }

    #[test]
    fn open_press_is_lost_after_clearing_query() {
        let (hub, mut keyboard) = session(vec![key_down("f", 0.0)]);
        let first = keyboard.get_keys(&KeyQuery::new());
        assert!(first[0].is_open());

        hub.borrow_mut().schedule(key_up("f", 0.0));
        let second = keyboard.get_keys(&KeyQuery::new().release_as_unique(true));
        assert_eq!(second.len(), 1);
        assert!(second[0].is_orphan());
    }

    #[test]
    fn reset_moves_zero_point() {
        let (hub, mut keyboard) = session(Vec::new());
        hub.borrow_mut().set_time(2.0);
        keyboard.reset();
        hub.borrow_mut().schedule(key_down("a", 2.5));
        hub.borrow_mut().run_to_end();
        let records = keyboard.get_keys(&KeyQuery::new());
        assert!((records[0].t_down.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn external_clock_rebases() {
        let (hub, mut keyboard) = session(Vec::new());
        hub.borrow_mut().set_time(1.0);
        hub.borrow_mut().schedule(key_down("a", 1.25));
        hub.borrow_mut().run_to_end();
        let clock = TimeBase::started_at(1.0);
        let records = keyboard.get_keys(&KeyQuery::new().clock(clock));
        assert!((records[0].t_down.unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn wait_returns_on_first_allowed_press() {
        let hub = share(ReplayHub::default().with_tick(0.01));
        let mut keyboard = Keyboard::new(hub.clone());
        hub.borrow_mut()
            .schedule_all([key_down("x", 0.1), key_down("space", 0.2)]);
        let records = keyboard
            .wait_keys(
                &KeyQuery::new().keys(&["space"]),
                KeyTrigger::Down,
                &WaitOptions::default(),
            )
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "space");
        assert!((records[0].t_down.unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn wait_times_out() {
        let hub = share(ReplayHub::default().with_tick(0.05));
        let mut keyboard = Keyboard::new(hub);
        let err = keyboard
            .wait_keys(
                &KeyQuery::new(),
                KeyTrigger::Down,
                &WaitOptions::default().timeout(0.5),
            )
            .unwrap_err();
        assert!(matches!(err, TimingError::WaitTimedOut { after } if after >= 0.5));
    }

    #[test]
    fn wait_stops_when_hub_shuts_down() {
        let hub = share(ReplayHub::default());
        let mut keyboard = Keyboard::new(hub.clone());
        hub.borrow_mut().shutdown();
        let err = keyboard
            .wait_keys(&KeyQuery::new(), KeyTrigger::Any, &WaitOptions::default())
            .unwrap_err();
        assert_eq!(err, TimingError::WaitCancelled);
    }

    #[test]
    fn raised_cancel_flag_ends_wait_on_running_hub() {
        let hub = share(ReplayHub::default().with_tick(0.01));
        let mut keyboard = Keyboard::new(hub.clone());
        hub.borrow_mut().schedule(key_down("space", 5.0));
        let flag = Arc::new(AtomicBool::new(true));
        let err = keyboard
            .wait_keys(
                &KeyQuery::new(),
                KeyTrigger::Down,
                &WaitOptions::default().cancel_on(flag),
            )
            .unwrap_err();
        assert_eq!(err, TimingError::WaitCancelled);
        assert!(hub.borrow().is_running());
        assert_eq!(hub.borrow().pending(), 1);
    }

    #[test]
    fn timeout_follows_hub_clock() {
        let hub = share(ReplayHub::default().with_tick(0.25));
        let mut keyboard = Keyboard::new(hub.clone());
        let err = keyboard
            .wait_keys(
                &KeyQuery::new(),
                KeyTrigger::Down,
                &WaitOptions::default().timeout(1.0),
            )
            .unwrap_err();
        assert_eq!(err, TimingError::WaitTimedOut { after: 1.0 });
        assert_eq!(hub.borrow().now(), 1.0);
    }
}
