//! Raw device events as delivered by a hub

use crate::error::{Result, TimingError};
use crate::units::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical device an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Keyboard,
    Mouse,
}

/// Kind of raw event, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    KeyDown,
    KeyUp,
    ButtonDown,
    ButtonUp,
    Motion,
    Drag,
}

impl EventType {
    pub fn device(&self) -> Device {
        match self {
            Self::KeyDown | Self::KeyUp => Device::Keyboard,
            Self::ButtonDown | Self::ButtonUp | Self::Motion | Self::Drag => Device::Mouse,
        }
    }
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Left,
    Right,
    /// Wheel button; also accepted under the name `scroll`
    #[serde(alias = "scroll")]
    Middle,
}

impl Button {
    /// Device button id
    pub fn id(&self) -> u8 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Left),
            2 => Some(Self::Right),
            4 => Some(Self::Middle),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }

    /// Parse a list of button names, failing on the first unknown one
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Button>> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Button {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "middle" | "scroll" => Ok(Self::Middle),
            _ => Err(TimingError::InvalidButtonName(s.to_string())),
        }
    }
}

/// A timestamped device event.
///
/// `time` is in seconds on the hub's monotonic timeline; positions are device
/// pixels with the origin at the display centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawEvent {
    KeyDown {
        key: String,
        time: f64,
    },
    KeyUp {
        key: String,
        time: f64,
    },
    ButtonDown {
        button: Button,
        position: Point,
        time: f64,
    },
    ButtonUp {
        button: Button,
        position: Point,
        time: f64,
    },
    Motion {
        position: Point,
        time: f64,
    },
    Drag {
        position: Point,
        time: f64,
    },
}

impl RawEvent {
    pub fn time(&self) -> f64 {
        match self {
            Self::KeyDown { time, .. }
            | Self::KeyUp { time, .. }
            | Self::ButtonDown { time, .. }
            | Self::ButtonUp { time, .. }
            | Self::Motion { time, .. }
            | Self::Drag { time, .. } => *time,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::KeyDown { .. } => EventType::KeyDown,
            Self::KeyUp { .. } => EventType::KeyUp,
            Self::ButtonDown { .. } => EventType::ButtonDown,
            Self::ButtonUp { .. } => EventType::ButtonUp,
            Self::Motion { .. } => EventType::Motion,
            Self::Drag { .. } => EventType::Drag,
        }
    }

    pub fn device(&self) -> Device {
        self.event_type().device()
    }

    pub fn position(&self) -> Option<Point> {
        match self {
            Self::ButtonDown { position, .. }
            | Self::ButtonUp { position, .. }
            | Self::Motion { position, .. }
            | Self::Drag { position, .. } => Some(*position),
            Self::KeyDown { .. } | Self::KeyUp { .. } => None,
        }
    }

    /// Key name for keyboard events
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::KeyDown { key, .. } | Self::KeyUp { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Whether this event passes an optional type filter
    pub fn matches(&self, types: Option<&[EventType]>) -> bool {
        types.map_or(true, |t| t.contains(&self.event_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_parse() {
        assert_eq!("Left".parse::<Button>().unwrap(), Button::Left);
        assert_eq!("scroll".parse::<Button>().unwrap(), Button::Middle);
        assert_eq!(
            "thumb".parse::<Button>().unwrap_err(),
            TimingError::InvalidButtonName("thumb".to_string())
        );
    }

    #[test]
    fn button_ids_round_trip() {
        for b in [Button::Left, Button::Right, Button::Middle] {
            assert_eq!(Button::from_id(b.id()), Some(b));
        }
        assert_eq!(Button::from_id(3), None);
    }

    #[test]
    fn parse_list_reports_first_bad_name() {
        let err = Button::parse_list(&["left", "wheel", "nope"]).unwrap_err();
        assert_eq!(err, TimingError::InvalidButtonName("wheel".to_string()));
    }

    #[test]
    fn event_accessors() {
        let event = RawEvent::ButtonDown {
            button: Button::Right,
            position: Point::new(1.0, 2.0),
            time: 0.5,
        };
        assert_eq!(event.time(), 0.5);
        assert_eq!(event.device(), Device::Mouse);
        assert_eq!(event.position(), Some(Point::new(1.0, 2.0)));
        assert!(event.matches(None));
        assert!(event.matches(Some(&[EventType::ButtonDown][..])));
        assert!(!event.matches(Some(&[EventType::Drag][..])));
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let json = r#"[
            {"type": "key_down", "key": "space", "time": 0.2},
            {"type": "drag", "position": {"x": 3.0, "y": -1.0}, "time": 0.4}
        ]"#;
        let events: Vec<RawEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events[0].key(), Some("space"));
        assert_eq!(events[1].event_type(), EventType::Drag);
    }
}
