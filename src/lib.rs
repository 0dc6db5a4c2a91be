//! Response Timing - keyboard and mouse response collection for experiments
//!
//! Raw device events are buffered by a [`hub::DeviceHub`] and turned into
//! press/release records by the sessions in [`session`]. Times are seconds
//! relative to a resettable [`clock::TimeBase`]; mouse positions can be
//! reported in pixels, centimetres, degrees of visual angle or normalised
//! display units.

pub mod clock;
pub mod config;
pub mod correlate;
pub mod error;
pub mod hub;
pub mod report;
pub mod session;
pub mod units;

pub use clock::TimeBase;
pub use config::Config;
pub use correlate::{ButtonRecord, KeyRecord, MotionSample, OrphanPolicy};
pub use error::{Result, TimingError};
pub use hub::{share, Button, DeviceHub, LiveHub, ReplayHub, SharedHub};
pub use report::TrialReport;
pub use session::{ButtonQuery, KeyQuery, KeyTrigger, Keyboard, Mouse, MouseState, WaitOptions};
pub use units::{convert, MonitorGeometry, Point, Unit};
