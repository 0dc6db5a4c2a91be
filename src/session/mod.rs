//! Device sessions
//!
//! A session owns a [`TimeBase`] and reads its device's events from a shared
//! hub. Each query correlates the batch currently visible upstream. With
//! `clear_events` the batch is removed from the hub, so a press still open at
//! that point can never be paired later: windowing is deliberately lossy.

mod keyboard;
mod mouse;

pub use keyboard::Keyboard;
pub use mouse::{Mouse, MouseState};

use crate::clock::TimeBase;
use crate::correlate::OrphanPolicy;
use crate::error::Result;
use crate::hub::{Button, EventType};
use crate::units::Unit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Parameters of a keyboard query
#[derive(Debug, Clone, PartialEq)]
pub struct KeyQuery {
    /// Keys to register, case-insensitive; empty registers every key
    pub keys: Vec<String>,
    /// Clock to time events against instead of the session's own
    pub clock: Option<TimeBase>,
    /// Keep releases without a matching press as records
    pub release_as_unique: bool,
    /// Remove the returned events from the hub
    pub clear_events: bool,
}

impl Default for KeyQuery {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            clock: None,
            release_as_unique: false,
            clear_events: true,
        }
    }
}

impl KeyQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys<S: AsRef<str>>(mut self, keys: &[S]) -> Self {
        self.keys = keys.iter().map(|k| k.as_ref().to_string()).collect();
        self
    }

    pub fn clock(mut self, clock: TimeBase) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn release_as_unique(mut self, retain: bool) -> Self {
        self.release_as_unique = retain;
        self
    }

    /// Leave events in the hub so the next query sees them again
    pub fn keep_events(mut self) -> Self {
        self.clear_events = false;
        self
    }

    pub(crate) fn policy(&self) -> OrphanPolicy {
        OrphanPolicy::from_release_as_unique(self.release_as_unique)
    }
}

/// Parameters of a mouse button query
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonQuery {
    /// Buttons to register; empty registers every button
    pub buttons: Vec<Button>,
    pub clock: Option<TimeBase>,
    pub release_as_unique: bool,
    /// Reconstruct drag paths for closed presses
    pub include_drag: bool,
    /// Unit of returned positions; the session default when `None`
    pub units: Option<Unit>,
    pub clear_events: bool,
}

impl Default for ButtonQuery {
    fn default() -> Self {
        Self {
            buttons: Vec::new(),
            clock: None,
            release_as_unique: false,
            include_drag: false,
            units: None,
            clear_events: true,
        }
    }
}

impl ButtonQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query restricted to named buttons (`left`, `middle`, `right`, `scroll`)
    pub fn with_button_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        Ok(Self {
            buttons: Button::parse_list(names)?,
            ..Self::default()
        })
    }

    pub fn buttons(mut self, buttons: &[Button]) -> Self {
        self.buttons = buttons.to_vec();
        self
    }

    pub fn clock(mut self, clock: TimeBase) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn release_as_unique(mut self, retain: bool) -> Self {
        self.release_as_unique = retain;
        self
    }

    pub fn include_drag(mut self, include: bool) -> Self {
        self.include_drag = include;
        self
    }

    pub fn units(mut self, units: Unit) -> Self {
        self.units = Some(units);
        self
    }

    pub fn keep_events(mut self) -> Self {
        self.clear_events = false;
        self
    }

    pub(crate) fn policy(&self) -> OrphanPolicy {
        OrphanPolicy::from_release_as_unique(self.release_as_unique)
    }
}

/// Event that ends a key wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyTrigger {
    /// First press of an allowed key
    #[default]
    Down,
    /// First release of an allowed key
    Up,
    /// Either
    Any,
}

impl KeyTrigger {
    pub(crate) fn event_types(&self) -> &'static [EventType] {
        match self {
            Self::Down => &[EventType::KeyDown],
            Self::Up => &[EventType::KeyUp],
            Self::Any => &[EventType::KeyDown, EventType::KeyUp],
        }
    }
}

/// Bounds on a blocking wait.
///
/// The default waits forever with a pure busy poll. The timeout is read
/// off the hub clock, not the wall clock: a [`ReplayHub`](crate::ReplayHub)
/// only moves its clock on reads when built with `with_tick`. Without a
/// tick a replayed wait never times out.
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    /// Give up after this many seconds of hub time (see [`DeviceHub::now`](crate::DeviceHub::now))
    pub timeout: Option<f64>,
    /// Stop as soon as this flag is set
    pub cancel: Option<Arc<AtomicBool>>,
    /// Sleep between polls; zero spins
    pub poll_interval: Duration,
}

impl WaitOptions {
    /// Give up after `seconds` have passed on the hub clock
    pub fn timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn cancel_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimingError;

    #[test]
    fn key_query_defaults_clear_events() {
        let query = KeyQuery::new();
        assert!(query.clear_events);
        assert!(!query.release_as_unique);
        assert!(!query.keep_events().clear_events);
    }

    #[test]
    fn button_query_from_names() {
        let query = ButtonQuery::with_button_names(&["left", "scroll"]).unwrap();
        assert_eq!(query.buttons, vec![Button::Left, Button::Middle]);
    }

    #[test]
    fn button_query_rejects_unknown_names() {
        let err = ButtonQuery::with_button_names(&["left", "back"]).unwrap_err();
        assert_eq!(err, TimingError::InvalidButtonName("back".to_string()));
    }

    #[test]
    fn trigger_event_types() {
        assert_eq!(KeyTrigger::Down.event_types(), &[EventType::KeyDown]);
        assert_eq!(KeyTrigger::Any.event_types().len(), 2);
    }

    #[test]
    fn cancel_flag_is_observed() {
        let flag = Arc::new(AtomicBool::new(false));
        let options = WaitOptions::default().cancel_on(flag.clone());
        assert!(!options.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(options.is_cancelled());
    }
}
