//! Replay hub: a deterministic device hub driven by scripted events
//!
//! Events are scheduled with hub timestamps and become visible once the
//! virtual clock reaches them. Recordings saved as JSON arrays of
//! [`RawEvent`] load with [`ReplayHub::from_json`]. The free functions at
//! the bottom build events tersely for fixtures.

use super::{Button, Device, DeviceHub, EventBuffers, EventType, MouseSnapshot, RawEvent};
use crate::units::{MonitorGeometry, Point};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::Path;

/// Scripted hub with a virtual clock
#[derive(Debug, Clone)]
pub struct ReplayHub {
    /// Virtual hub time in seconds
    now: f64,
    /// Clock advance applied on every feed read
    tick: f64,
    /// Events not yet due, sorted by time
    scheduled: VecDeque<RawEvent>,
    buffers: EventBuffers,
    monitor: MonitorGeometry,
    mouse: MouseSnapshot,
    last_snapshot_position: Point,
    running: bool,
}

impl Default for ReplayHub {
    fn default() -> Self {
        Self::new(MonitorGeometry::default())
    }
}

impl ReplayHub {
    pub fn new(monitor: MonitorGeometry) -> Self {
        Self {
            now: 0.0,
            tick: 0.0,
            scheduled: VecDeque::new(),
            buffers: EventBuffers::default(),
            monitor,
            mouse: MouseSnapshot::default(),
            last_snapshot_position: Point::default(),
            running: true,
        }
    }

    /// Advance the virtual clock by `tick` seconds on every feed read, so
    /// busy waits make progress through the script.
    pub fn with_tick(mut self, tick: f64) -> Self {
        self.tick = tick.max(0.0);
        self
    }

    /// Keep at most `capacity` delivered, unread events per device
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffers.set_capacity(capacity);
        self
    }

    /// Build a hub from a JSON array of raw events
    pub fn from_json(json: &str, monitor: MonitorGeometry) -> serde_json::Result<Self> {
        let events: Vec<RawEvent> = serde_json::from_str(json)?;
        let mut hub = Self::new(monitor);
        hub.schedule_all(events);
        Ok(hub)
    }

    /// Load a JSON recording from disk
    pub fn load(path: &Path, monitor: MonitorGeometry) -> io::Result<Self> {
        let mut hub = Self::new(monitor);
        hub.schedule_all(read_events(path)?);
        Ok(hub)
    }

    /// Schedule an event for delivery at its own timestamp
    pub fn schedule(&mut self, event: RawEvent) {
        let at = self
            .scheduled
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.scheduled.len());
        self.scheduled.insert(at, event);
        self.release_due();
    }

    pub fn schedule_all(&mut self, events: impl IntoIterator<Item = RawEvent>) {
        for event in events {
            self.schedule(event);
        }
    }

    /// Set the virtual clock, delivering everything that became due
    pub fn set_time(&mut self, now: f64) {
        self.now = now;
        self.release_due();
    }

    pub fn advance(&mut self, seconds: f64) {
        self.set_time(self.now + seconds);
    }

    /// Run the clock past the last scheduled event
    pub fn run_to_end(&mut self) {
        if let Some(last) = self.scheduled.back().map(RawEvent::time) {
            self.set_time(self.now.max(last));
        }
    }

    /// Events still waiting for the clock
    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    /// Events delivered and not yet cleared for `device`
    pub fn buffered(&self, device: Device) -> usize {
        self.buffers.len(device)
    }

    /// Override the scroll offset reported in snapshots
    pub fn set_scroll(&mut self, scroll: f64) {
        self.mouse.scroll = scroll;
    }

    fn release_due(&mut self) -> usize {
        if !self.running {
            return 0;
        }
        let mut released = 0;
        while self
            .scheduled
            .front()
            .is_some_and(|e| e.time() <= self.now)
        {
            if let Some(event) = self.scheduled.pop_front() {
                self.track_mouse(&event);
                self.buffers.push(event);
                released += 1;
            }
        }
        released
    }

    fn track_mouse(&mut self, event: &RawEvent) {
        if let Some(position) = event.position() {
            self.mouse.position = position;
        }
        let (button, down) = match event {
            RawEvent::ButtonDown { button, .. } => (*button, true),
            RawEvent::ButtonUp { button, .. } => (*button, false),
            _ => return,
        };
        match button {
            Button::Left => self.mouse.left = down,
            Button::Middle => self.mouse.middle = down,
            Button::Right => self.mouse.right = down,
        }
    }
}

impl DeviceHub for ReplayHub {
    fn now(&self) -> f64 {
        self.now
    }

    fn poll(&mut self) -> usize {
        self.now += self.tick;
        self.release_due()
    }

    fn get_events(
        &mut self,
        device: Device,
        types: Option<&[EventType]>,
        clear: bool,
    ) -> Vec<RawEvent> {
        self.poll();
        self.buffers.take(device, types, clear)
    }

    fn clear_events(&mut self, device: Device) {
        self.buffers.clear(device);
    }

    fn mouse_snapshot(&mut self) -> MouseSnapshot {
        let mut snapshot = self.mouse;
        snapshot.delta = Point::new(
            snapshot.position.x - self.last_snapshot_position.x,
            snapshot.position.y - self.last_snapshot_position.y,
        );
        self.last_snapshot_position = snapshot.position;
        snapshot
    }

    fn monitor(&self) -> &MonitorGeometry {
        &self.monitor
    }

    fn shutdown(&mut self) {
        self.running = false;
        self.scheduled.clear();
        self.buffers.clear_all();
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Read a JSON recording without scheduling it
pub fn read_events(path: &Path) -> io::Result<Vec<RawEvent>> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Key press at hub time `time`
pub fn key_down(key: &str, time: f64) -> RawEvent {
    RawEvent::KeyDown {
        key: key.to_string(),
        time,
    }
}

/// Key release at hub time `time`
pub fn key_up(key: &str, time: f64) -> RawEvent {
    RawEvent::KeyUp {
        key: key.to_string(),
        time,
    }
}

/// Button press at pixel position `(x, y)`
pub fn button_down(button: Button, x: f64, y: f64, time: f64) -> RawEvent {
    RawEvent::ButtonDown {
        button,
        position: Point::new(x, y),
        time,
    }
}

/// Button release at pixel position `(x, y)`
pub fn button_up(button: Button, x: f64, y: f64, time: f64) -> RawEvent {
    RawEvent::ButtonUp {
        button,
        position: Point::new(x, y),
        time,
    }
}

/// Pointer move with no button held
pub fn motion(x: f64, y: f64, time: f64) -> RawEvent {
    RawEvent::Motion {
        position: Point::new(x, y),
        time,
    }
}

/// Pointer move while a button is held
pub fn drag(x: f64, y: f64, time: f64) -> RawEvent {
    RawEvent::Drag {
        position: Point::new(x, y),
        time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_become_visible_when_due() {
        let mut hub = ReplayHub::default();
        hub.schedule(key_down("a", 0.5));
        assert!(hub.get_events(Device::Keyboard, None, false).is_empty());
        hub.set_time(0.5);
        assert_eq!(hub.get_events(Device::Keyboard, None, false).len(), 1);
    }

    #[test]
    fn schedule_keeps_time_order() {
        let mut hub = ReplayHub::default();
        hub.schedule(key_up("a", 0.3));
        hub.schedule(key_down("a", 0.1));
        hub.run_to_end();
        let events = hub.get_events(Device::Keyboard, None, true);
        assert_eq!(events, vec![key_down("a", 0.1), key_up("a", 0.3)]);
        assert!(hub.get_events(Device::Keyboard, None, true).is_empty());
    }

    #[test]
    fn tick_advances_clock_per_read() {
        let mut hub = ReplayHub::default().with_tick(0.1);
        hub.schedule(key_down("space", 0.2));
        assert!(hub.get_events(Device::Keyboard, None, false).is_empty());
        assert_eq!(hub.get_events(Device::Keyboard, None, false).len(), 1);
        assert!((hub.now() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn snapshot_follows_delivered_mouse_events() {
        let mut hub = ReplayHub::default();
        hub.schedule_all([
            motion(10.0, 5.0, 0.1),
            button_down(Button::Right, 12.0, 5.0, 0.2),
        ]);
        hub.run_to_end();
        let snapshot = hub.mouse_snapshot();
        assert_eq!(snapshot.position, Point::new(12.0, 5.0));
        assert_eq!(snapshot.delta, Point::new(12.0, 5.0));
        assert!(snapshot.right && !snapshot.left);
        assert_eq!(hub.mouse_snapshot().delta, Point::default());
    }

    #[test]
    fn shutdown_empties_feeds() {
        let mut hub = ReplayHub::default();
        hub.schedule_all([key_down("a", 0.0), key_down("b", 1.0)]);
        hub.shutdown();
        hub.set_time(2.0);
        assert!(!hub.is_running());
        assert!(hub.get_events(Device::Keyboard, None, false).is_empty());
    }

    #[test]
    fn loads_json_recording() {
        let json = r#"[{"type": "key_down", "key": "f", "time": 0.0}]"#;
        let mut hub = ReplayHub::from_json(json, MonitorGeometry::default()).unwrap();
        assert_eq!(hub.get_events(Device::Keyboard, None, false).len(), 1);
    }
}
