//! Press/release correlation
//!
//! Correlators consume a batch of raw events in arrival order and pair each
//! release with the earliest unresolved press of the same key or button.
//! Times in the produced records are already rebased.

mod buttons;
mod keys;
mod motion;

pub use buttons::{ButtonCorrelator, ButtonRecord};
pub use keys::{KeyCorrelator, KeyRecord};
pub use motion::{MotionSample, MotionTrace};

use serde::{Deserialize, Serialize};

/// What to do with a release that has no open press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Drop it
    #[default]
    Discard,
    /// Keep it as a record with only the release side filled in
    RetainAsUnique,
}

impl OrphanPolicy {
    pub fn from_release_as_unique(release_as_unique: bool) -> Self {
        if release_as_unique {
            Self::RetainAsUnique
        } else {
            Self::Discard
        }
    }
}

/// Release time and duration for a press at `t_down` released at `t_up`
pub(crate) fn close_interval(t_down: Option<f64>, t_up: f64) -> (Option<f64>, Option<f64>) {
    (Some(t_up), t_down.map(|down| t_up - down))
}
