//! Mouse button correlation and drag reconstruction

use super::{close_interval, MotionSample, OrphanPolicy};
use crate::hub::{Button, RawEvent};
use crate::units::{PixelConverter, Point};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// One button press interval with positions in the requested unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonRecord {
    pub button: Button,
    pub pos_down: Option<Point>,
    pub pos_up: Option<Point>,
    pub t_down: Option<f64>,
    pub t_up: Option<f64>,
    pub duration: Option<f64>,
    /// Path from press to release, endpoints included. `None` when drag
    /// was not requested or no samples fell inside the interval.
    pub drag: Option<Vec<MotionSample>>,
}

impl ButtonRecord {
    fn pressed(button: Button, position: Point, t_down: f64) -> Self {
        Self {
            button,
            pos_down: Some(position),
            pos_up: None,
            t_down: Some(t_down),
            t_up: None,
            duration: None,
            drag: None,
        }
    }

    fn released_only(button: Button, position: Point, t_up: f64) -> Self {
        Self {
            button,
            pos_down: None,
            pos_up: Some(position),
            t_down: None,
            t_up: Some(t_up),
            duration: None,
            drag: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.t_down.is_some() && self.t_up.is_none()
    }

    pub fn is_orphan(&self) -> bool {
        self.t_down.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.t_down.is_some() && self.t_up.is_some()
    }

    /// Press and release endpoints, for closed records
    fn endpoints(&self) -> Option<(MotionSample, MotionSample)> {
        Some((
            MotionSample::new(self.pos_down?, self.t_down?),
            MotionSample::new(self.pos_up?, self.t_up?),
        ))
    }
}

/// Pairs button presses with releases over one batch of events
#[derive(Debug, Clone)]
pub struct ButtonCorrelator {
    /// Buttons to register; empty registers all
    filter: Vec<Button>,
    policy: OrphanPolicy,
    base_time: f64,
    converter: PixelConverter,
    records: Vec<ButtonRecord>,
}

impl ButtonCorrelator {
    pub fn new(
        filter: &[Button],
        policy: OrphanPolicy,
        base_time: f64,
        converter: PixelConverter,
    ) -> Self {
        Self {
            filter: filter.to_vec(),
            policy,
            base_time,
            converter,
            records: Vec::new(),
        }
    }

    fn accepts(&self, button: Button) -> bool {
        self.filter.is_empty() || self.filter.contains(&button)
    }

    pub fn on_event(&mut self, event: &RawEvent) {
        match event {
            RawEvent::ButtonDown {
                button,
                position,
                time,
            } => {
                if self.accepts(*button) {
                    let position = self.converter.apply(*position);
                    self.records
                        .push(ButtonRecord::pressed(*button, position, time - self.base_time));
                }
            }
            RawEvent::ButtonUp {
                button,
                position,
                time,
            } => {
                if self.accepts(*button) {
                    let position = self.converter.apply(*position);
                    self.release(*button, position, time - self.base_time);
                }
            }
            // Drag samples are folded in afterwards by `attach_drags`
            RawEvent::Motion { .. }
            | RawEvent::Drag { .. }
            | RawEvent::KeyDown { .. }
            | RawEvent::KeyUp { .. } => {}
        }
    }

    pub fn extend<'a>(&mut self, events: impl IntoIterator<Item = &'a RawEvent>) {
        for event in events {
            self.on_event(event);
        }
    }

    fn release(&mut self, button: Button, position: Point, t_up: f64) {
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r.button == button && r.is_open())
        {
            (record.t_up, record.duration) = close_interval(record.t_down, t_up);
            record.pos_up = Some(position);
            trace!("paired {} button {:?} -> {:.4}", button, record.t_down, t_up);
            return;
        }

        match self.policy {
            OrphanPolicy::RetainAsUnique => {
                debug!("orphaned {} release at {:.4} retained", button, t_up);
                self.records
                    .push(ButtonRecord::released_only(button, position, t_up));
            }
            OrphanPolicy::Discard => {
                debug!("orphaned {} release at {:.4} discarded", button, t_up);
            }
        }
    }

    /// Fold drag samples into every closed record.
    ///
    /// Samples strictly inside `(t_down, t_up)` form the interior of the
    /// path; the press and release points are added as its endpoints.
    /// Records without interior samples keep `drag = None`.
    pub fn attach_drags(&mut self, events: &[RawEvent]) {
        let samples: Vec<MotionSample> = events
            .iter()
            .filter_map(|event| match event {
                RawEvent::Drag { position, time } => Some(MotionSample::new(
                    self.converter.apply(*position),
                    time - self.base_time,
                )),
                _ => None,
            })
            .collect();

        for record in &mut self.records {
            let Some((start, end)) = record.endpoints() else {
                continue;
            };
            let interior: Vec<MotionSample> = samples
                .iter()
                .filter(|s| start.t < s.t && s.t < end.t)
                .copied()
                .collect();
            if interior.is_empty() {
                continue;
            }
            let mut path = Vec::with_capacity(interior.len() + 2);
            path.push(start);
            path.extend(interior);
            path.push(end);
            record.drag = Some(path);
        }
    }

    pub fn records(&self) -> &[ButtonRecord] {
        &self.records
    }

    pub fn open_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_open()).count()
    }

    pub fn into_records(self) -> Vec<ButtonRecord> {
        self.records
    }
}
