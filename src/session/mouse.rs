//! Mouse session

use super::ButtonQuery;
use crate::clock::TimeBase;
use crate::correlate::{ButtonCorrelator, ButtonRecord, MotionTrace};
use crate::error::Result;
use crate::hub::{Device, DeviceHub, EventType, SharedHub};
use crate::units::{PixelConverter, Point, Unit};
use log::debug;
use serde::{Deserialize, Serialize};

const BUTTON_EVENTS: &[EventType] = &[EventType::ButtonDown, EventType::ButtonUp];
const DRAG_EVENTS: &[EventType] = &[EventType::Drag];
const MOTION_EVENTS: &[EventType] = &[EventType::Motion];

/// Instantaneous mouse state in the requested unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseState {
    pub position: Point,
    /// Movement since the previous state query
    pub velocity: Point,
    pub left: bool,
    pub middle: bool,
    pub right: bool,
    pub scroll: f64,
}

/// Mouse clicks, drags and movement timed against a resettable zero point
pub struct Mouse<H: DeviceHub> {
    hub: SharedHub<H>,
    time_base: TimeBase,
    units: Unit,
}

impl<H: DeviceHub> Mouse<H> {
    /// Start a session reporting positions in `units` by default.
    /// Mouse events buffered so far are discarded.
    pub fn new(hub: SharedHub<H>, units: Unit) -> Self {
        let now = {
            let mut h = hub.borrow_mut();
            h.clear_events(Device::Mouse);
            h.now()
        };
        Self {
            hub,
            time_base: TimeBase::started_at(now),
            units,
        }
    }

    pub fn reset(&mut self) {
        let mut hub = self.hub.borrow_mut();
        let now = hub.now();
        self.time_base.reset(now);
        hub.clear_events(Device::Mouse);
        debug!("mouse reset at {:.4}", now);
    }

    pub fn time_base(&self) -> &TimeBase {
        &self.time_base
    }

    pub fn units(&self) -> Unit {
        self.units
    }

    fn converter(&self, units: Option<Unit>) -> Result<PixelConverter> {
        let geometry = *self.hub.borrow().monitor();
        PixelConverter::new(geometry, units.unwrap_or(self.units))
    }

    /// Button press records since the last clearing query or reset
    pub fn get_buttons(&mut self, query: &ButtonQuery) -> Result<Vec<ButtonRecord>> {
        let converter = self.converter(query.units)?;
        let base = self.time_base.base_time(query.clock.as_ref());

        let events = self.hub.borrow_mut().get_events(
            Device::Mouse,
            Some(BUTTON_EVENTS),
            query.clear_events,
        );
        let mut correlator = ButtonCorrelator::new(&query.buttons, query.policy(), base, converter);
        correlator.extend(&events);

        // A clearing query also consumes drag samples, attached or not
        if query.include_drag || query.clear_events {
            let drags = self.hub.borrow_mut().get_events(
                Device::Mouse,
                Some(DRAG_EVENTS),
                query.clear_events,
            );
            if query.include_drag {
                correlator.attach_drags(&drags);
            }
        }

        let open = correlator.open_count();
        if query.clear_events && open > 0 {
            debug!("{} open button press(es) cleared before release", open);
        }
        Ok(correlator.into_records())
    }

    /// Pointer positions recorded since the previous call, oldest first.
    ///
    /// Reading consumes the motion buffer; conversion happens lazily as the
    /// trace is iterated.
    pub fn get_motion(
        &mut self,
        clock: Option<&TimeBase>,
        units: Option<Unit>,
    ) -> Result<MotionTrace> {
        let converter = self.converter(units)?;
        let base = self.time_base.base_time(clock);
        let events = self
            .hub
            .borrow_mut()
            .get_events(Device::Mouse, Some(MOTION_EVENTS), true);
        Ok(MotionTrace::new(events, base, converter))
    }

    /// Current position, movement, button and scroll state.
    ///
    /// A direct read of the device, independent of buffered events.
    pub fn current_state(&mut self, units: Option<Unit>) -> Result<MouseState> {
        let converter = self.converter(units)?;
        let snapshot = self.hub.borrow_mut().mouse_snapshot();
        let position = converter.apply(snapshot.position);
        let previous = converter.apply(Point::new(
            snapshot.position.x - snapshot.delta.x,
            snapshot.position.y - snapshot.delta.y,
        ));
        Ok(MouseState {
            position,
            velocity: Point::new(position.x - previous.x, position.y - previous.y),
            left: snapshot.left,
            middle: snapshot.middle,
            right: snapshot.right,
            scroll: snapshot.scroll,
        })
    }
}
