//! Live hub backed by device_query polling
//!
//! device_query reports instantaneous key and button state, so events are
//! synthesised by diffing consecutive polls. Timing resolution is therefore
//! the poll rate; call [`DeviceHub::poll`] from the trial loop as often as
//! the frame loop allows.

use super::keymap::key_name;
use super::{Button, Device, DeviceHub, EventBuffers, EventType, MouseSnapshot, RawEvent};
use crate::units::{MonitorGeometry, Point};
use device_query::{DeviceQuery, DeviceState, Keycode, MouseState};
use log::{debug, info};
use std::time::Instant;

/// device_query button slots and the buttons they report
const BUTTON_SLOTS: [(usize, Button); 3] = [
    (1, Button::Left),
    (2, Button::Right),
    (3, Button::Middle),
];

fn pressed_buttons(mouse: &MouseState) -> [bool; 3] {
    let mut pressed = [false; 3];
    for (i, (slot, _)) in BUTTON_SLOTS.iter().enumerate() {
        pressed[i] = mouse.button_pressed.get(*slot).copied().unwrap_or(false);
    }
    pressed
}

/// Convert top-left screen coordinates to centred pixels, y up
fn centred(coords: (i32, i32), [w, h]: [u32; 2]) -> Point {
    Point::new(
        coords.0 as f64 - w as f64 / 2.0,
        h as f64 / 2.0 - coords.1 as f64,
    )
}

/// Hub polling the OS keyboard and mouse state
pub struct LiveHub {
    device_state: DeviceState,
    origin: Instant,
    monitor: MonitorGeometry,
    buffers: EventBuffers,
    last_keys: Vec<Keycode>,
    last_buttons: [bool; 3],
    last_position: Option<Point>,
    last_snapshot_position: Point,
    running: bool,
}

impl LiveHub {
    /// Start the hub. The hub timeline starts at zero now.
    pub fn new(monitor: MonitorGeometry) -> Self {
        info!(
            "live hub started ({}x{} px, {:.1} cm wide)",
            monitor.size_pix()[0],
            monitor.size_pix()[1],
            monitor.width_cm()
        );
        let mut hub = Self {
            device_state: DeviceState::new(),
            origin: Instant::now(),
            monitor,
            buffers: EventBuffers::default(),
            last_keys: Vec::new(),
            last_buttons: [false; 3],
            last_position: None,
            last_snapshot_position: Point::default(),
            running: true,
        };
        // Prime state so keys already held at start do not produce presses
        hub.last_keys = hub.device_state.get_keys();
        hub.last_buttons = hub.read_buttons();
        hub
    }

    /// Keep at most `capacity` unread events per device
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffers.set_capacity(capacity);
        self
    }

    fn to_centred(&self, coords: (i32, i32)) -> Point {
        centred(coords, self.monitor.size_pix())
    }

    fn read_buttons(&self) -> [bool; 3] {
        pressed_buttons(&self.device_state.get_mouse())
    }

    fn poll_keys(&mut self, now: f64) -> usize {
        let current = self.device_state.get_keys();
        let mut count = 0;

        for key in &current {
            if !self.last_keys.contains(key) {
                self.buffers.push(RawEvent::KeyDown {
                    key: key_name(*key).into_owned(),
                    time: now,
                });
                count += 1;
            }
        }
        for key in &self.last_keys {
            if !current.contains(key) {
                self.buffers.push(RawEvent::KeyUp {
                    key: key_name(*key).into_owned(),
                    time: now,
                });
                count += 1;
            }
        }

        self.last_keys = current;
        count
    }

    fn poll_mouse(&mut self, now: f64) -> usize {
        let mouse = self.device_state.get_mouse();
        let position = self.to_centred(mouse.coords);
        let mut count = 0;

        let buttons = pressed_buttons(&mouse);
        let held_before = self.last_buttons.iter().any(|b| *b);

        if self.last_position.is_some_and(|p| p != position) {
            let event = if held_before {
                RawEvent::Drag { position, time: now }
            } else {
                RawEvent::Motion { position, time: now }
            };
            self.buffers.push(event);
            count += 1;
        }

        for (i, (_, button)) in BUTTON_SLOTS.iter().enumerate() {
            match (self.last_buttons[i], buttons[i]) {
                (false, true) => self.buffers.push(RawEvent::ButtonDown {
                    button: *button,
                    position,
                    time: now,
                }),
                (true, false) => self.buffers.push(RawEvent::ButtonUp {
                    button: *button,
                    position,
                    time: now,
                }),
                _ => continue,
            }
            count += 1;
        }

        self.last_buttons = buttons;
        self.last_position = Some(position);
        count
    }
}

impl DeviceHub for LiveHub {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn poll(&mut self) -> usize {
        if !self.running {
            return 0;
        }
        let now = self.now();
        self.poll_keys(now) + self.poll_mouse(now)
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
        self.poll();
        self.buffers.clear(device);
    }

    fn mouse_snapshot(&mut self) -> MouseSnapshot {
        let mouse = self.device_state.get_mouse();
        let position = self.to_centred(mouse.coords);
        let [left, right, middle] = pressed_buttons(&mouse);
        let snapshot = MouseSnapshot {
            position,
            delta: Point::new(
                position.x - self.last_snapshot_position.x,
                position.y - self.last_snapshot_position.y,
            ),
            left,
            middle,
            right,
            // device_query has no wheel state
            scroll: 0.0,
        };
        self.last_snapshot_position = position;
        snapshot
    }

    fn monitor(&self) -> &MonitorGeometry {
        &self.monitor
    }

    fn shutdown(&mut self) {
        if self.running {
            debug!("live hub shut down after {:.3} s", self.now());
        }
        self.running = false;
        self.buffers.clear_all();
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
