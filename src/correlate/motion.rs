//! Pointer motion samples

use crate::hub::RawEvent;
use crate::units::{PixelConverter, Point};
use serde::{Deserialize, Serialize};

/// Rebased, unit-converted pointer position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub position: Point,
    pub t: f64,
}

impl MotionSample {
    pub fn new(position: Point, t: f64) -> Self {
        Self { position, t }
    }
}

/// Lazy, order-preserving sequence of motion samples.
///
/// Holds the pointer positions read from the hub and converts each one only
/// when it is pulled. Events other than `Motion` are dropped up front.
#[derive(Debug, Clone)]
pub struct MotionTrace {
    samples: std::vec::IntoIter<(Point, f64)>,
    base_time: f64,
    converter: PixelConverter,
}

impl MotionTrace {
    pub fn new(events: Vec<RawEvent>, base_time: f64, converter: PixelConverter) -> Self {
        let samples: Vec<(Point, f64)> = events
            .into_iter()
            .filter_map(|event| match event {
                RawEvent::Motion { position, time } => Some((position, time)),
                _ => None,
            })
            .collect();
        Self {
            samples: samples.into_iter(),
            base_time,
            converter,
        }
    }
}

impl Iterator for MotionTrace {
    type Item = MotionSample;

    fn next(&mut self) -> Option<MotionSample> {
        let (position, time) = self.samples.next()?;
        Some(MotionSample::new(
            self.converter.apply(position),
            time - self.base_time,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.samples.size_hint()
    }
}

impl ExactSizeIterator for MotionTrace {}
