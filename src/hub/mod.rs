//! Device hub: the collaborator that owns the physical devices
//!
//! A hub buffers raw events per device and exposes them through a pull
//! model. Sessions never create a hub themselves; one is built up front,
//! shared with [`share`], handed to every session that needs it, and shut
//! down explicitly when the experiment ends.

mod event;
pub mod keymap;
mod live;
pub mod replay;

pub use event::{Button, Device, EventType, RawEvent};
pub use live::LiveHub;
pub use replay::ReplayHub;

use crate::units::{MonitorGeometry, Point};
use log::warn;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Hub handle shared by the sessions of one experiment
pub type SharedHub<H> = Rc<RefCell<H>>;

/// Wrap a hub for sharing between sessions
pub fn share<H: DeviceHub>(hub: H) -> SharedHub<H> {
    Rc::new(RefCell::new(hub))
}

/// Instantaneous mouse state in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MouseSnapshot {
    /// Pointer position
    pub position: Point,
    /// Movement since the previous snapshot
    pub delta: Point,
    pub left: bool,
    pub middle: bool,
    pub right: bool,
    /// Vertical scroll offset
    pub scroll: f64,
}

/// Source of raw device events and the monotonic clock they are stamped with
pub trait DeviceHub {
    /// Current time in seconds on the hub timeline
    fn now(&self) -> f64;

    /// Pump pending device input into the event buffers.
    /// Returns the number of new events.
    fn poll(&mut self) -> usize;

    /// Buffered events for `device` in arrival order, optionally filtered by
    /// type. With `clear`, exactly the returned events leave the buffer.
    fn get_events(
        &mut self,
        device: Device,
        types: Option<&[EventType]>,
        clear: bool,
    ) -> Vec<RawEvent>;

    /// Drop every buffered event for `device`. Clearing an empty buffer is a
    /// no-op.
    fn clear_events(&mut self, device: Device);

    /// Current mouse state
    fn mouse_snapshot(&mut self) -> MouseSnapshot;

    /// Geometry of the display positions refer to
    fn monitor(&self) -> &MonitorGeometry;

    /// End the hub's lifecycle. Afterwards feeds stay empty.
    fn shutdown(&mut self);

    fn is_running(&self) -> bool;
}

/// Events kept per device before the oldest are dropped
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Per-device event buffers shared by the hub implementations.
///
/// Each buffer holds at most `capacity` events; pushing onto a full buffer
/// drops its oldest event.
#[derive(Debug, Clone)]
pub(crate) struct EventBuffers {
    keyboard: VecDeque<RawEvent>,
    mouse: VecDeque<RawEvent>,
    capacity: usize,
    dropped: usize,
}

impl Default for EventBuffers {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }
}

impl EventBuffers {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            keyboard: VecDeque::new(),
            mouse: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }

    fn buffer_mut(&mut self, device: Device) -> &mut VecDeque<RawEvent> {
        match device {
            Device::Keyboard => &mut self.keyboard,
            Device::Mouse => &mut self.mouse,
        }
    }

    pub(crate) fn push(&mut self, event: RawEvent) {
        let capacity = self.capacity;
        let device = event.device();
        let buffer = self.buffer_mut(device);
        let overflow = buffer.len() + 1 > capacity;
        if overflow {
            buffer.pop_front();
        }
        buffer.push_back(event);
        if overflow {
            if self.dropped == 0 {
                warn!(
                    "{:?} buffer full at {} events, dropping oldest",
                    device, capacity
                );
            }
            self.dropped += 1;
        }
    }

    pub(crate) fn take(
        &mut self,
        device: Device,
        types: Option<&[EventType]>,
        clear: bool,
    ) -> Vec<RawEvent> {
        let buffer = self.buffer_mut(device);
        if !clear {
            return buffer.iter().filter(|e| e.matches(types)).cloned().collect();
        }
        let (taken, kept): (VecDeque<_>, VecDeque<_>) =
            buffer.drain(..).partition(|e| e.matches(types));
        *buffer = kept;
        taken.into()
    }

    pub(crate) fn clear(&mut self, device: Device) {
        self.buffer_mut(device).clear();
    }

    pub(crate) fn clear_all(&mut self) {
        self.keyboard.clear();
        self.mouse.clear();
    }

    pub(crate) fn len(&self, device: Device) -> usize {
        match device {
            Device::Keyboard => self.keyboard.len(),
            Device::Mouse => self.mouse.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(t: f64) -> RawEvent {
        RawEvent::Motion {
            position: Point::default(),
            time: t,
        }
    }

    fn press(t: f64) -> RawEvent {
        RawEvent::ButtonDown {
            button: Button::Left,
            position: Point::default(),
            time: t,
        }
    }

    #[test]
    fn take_without_clear_keeps_events() {
        let mut buffers = EventBuffers::default();
        buffers.push(motion(0.1));
        buffers.push(press(0.2));
        let seen = buffers.take(Device::Mouse, None, false);
        assert_eq!(seen.len(), 2);
        assert_eq!(buffers.len(Device::Mouse), 2);
    }

    #[test]
    fn clearing_take_removes_only_matching_types() {
        let mut buffers = EventBuffers::default();
        buffers.push(motion(0.1));
        buffers.push(press(0.2));
        buffers.push(motion(0.3));
        let taken = buffers.take(Device::Mouse, Some(&[EventType::Motion][..]), true);
        assert_eq!(taken.len(), 2);
        assert!(taken[0].time() < taken[1].time());
        let left = buffers.take(Device::Mouse, None, false);
        assert_eq!(left, vec![press(0.2)]);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut buffers = EventBuffers::default();
        buffers.push(motion(0.1));
        buffers.clear(Device::Mouse);
        buffers.clear(Device::Mouse);
        assert_eq!(buffers.len(Device::Mouse), 0);
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let mut buffers = EventBuffers::with_capacity(3);
        for i in 0..5 {
            buffers.push(motion(i as f64));
        }
        buffers.push(RawEvent::KeyDown {
            key: "a".to_string(),
            time: 5.0,
        });
        assert_eq!(buffers.len(Device::Mouse), 3);
        assert_eq!(buffers.len(Device::Keyboard), 1);
        let times: Vec<f64> = buffers
            .take(Device::Mouse, None, true)
            .iter()
            .map(RawEvent::time)
            .collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0]);
    }
}
