//! Coordinate unit conversion
//!
//! Positions arrive from the hub in device pixels (origin at the display
//! centre, y up). Conversions go through centimetres on the display surface:
//! `from -> cm -> to`, so adding a unit means adding two arms, not a table.

use crate::error::{Result, TimingError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coordinate space of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Device pixels
    #[serde(alias = "pixel")]
    Pix,
    /// Centimetres on the display surface
    Cm,
    /// Degrees of visual angle
    Deg,
    /// Normalised device coordinates, each axis in [-1, 1]
    Norm,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "pix",
            Self::Cm => "cm",
            Self::Deg => "deg",
            Self::Norm => "norm",
        }
    }

    pub fn all() -> &'static [Unit] {
        &[Self::Pix, Self::Cm, Self::Deg, Self::Norm]
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pix" | "pixel" | "pixels" => Ok(Self::Pix),
            "cm" => Ok(Self::Cm),
            "deg" => Ok(Self::Deg),
            "norm" => Ok(Self::Norm),
            _ => Err(TimingError::InvalidUnit(s.to_string())),
        }
    }
}

/// A 2-D position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y))
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Static monitor geometry used for conversions.
///
/// Deserialized values pass through [`MonitorGeometry::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeometryFields")]
pub struct MonitorGeometry {
    /// Display size in pixels (width, height)
    size_pix: [u32; 2],
    /// Visible display width in centimetres
    width_cm: f64,
    /// Eye-to-screen distance in centimetres
    distance_cm: Option<f64>,
}

impl Default for MonitorGeometry {
    /// A 24" 1080p panel viewed from 57 cm
    fn default() -> Self {
        Self {
            size_pix: [1920, 1080],
            width_cm: 53.0,
            distance_cm: Some(57.0),
        }
    }
}

/// Unchecked geometry as written in a file
#[derive(Deserialize)]
struct GeometryFields {
    size_pix: [u32; 2],
    width_cm: f64,
    #[serde(default)]
    distance_cm: Option<f64>,
}

impl TryFrom<GeometryFields> for MonitorGeometry {
    type Error = TimingError;

    fn try_from(fields: GeometryFields) -> Result<Self> {
        Self::new(fields.size_pix, fields.width_cm, fields.distance_cm)
    }
}

impl MonitorGeometry {
    /// Build a geometry. Pixel sizes and the physical width must be positive.
    pub fn new(size_pix: [u32; 2], width_cm: f64, distance_cm: Option<f64>) -> Result<Self> {
        if size_pix[0] == 0 || size_pix[1] == 0 {
            return Err(TimingError::MissingGeometry { field: "size_pix" });
        }
        if !(width_cm > 0.0) {
            return Err(TimingError::MissingGeometry { field: "width_cm" });
        }
        Ok(Self {
            size_pix,
            width_cm,
            distance_cm: distance_cm.filter(|d| *d > 0.0),
        })
    }

    pub fn size_pix(&self) -> [u32; 2] {
        self.size_pix
    }

    pub fn width_cm(&self) -> f64 {
        self.width_cm
    }

    pub fn distance_cm(&self) -> Option<f64> {
        self.distance_cm
    }

    /// Pixels per centimetre, taken from the horizontal axis
    pub fn pix_per_cm(&self) -> f64 {
        self.size_pix[0] as f64 / self.width_cm
    }

    fn require_distance(&self) -> Result<f64> {
        self.distance_cm.ok_or(TimingError::MissingGeometry {
            field: "distance_cm",
        })
    }

    /// Distance needed by a conversion between `from` and `to`, if any
    fn distance_for(&self, from: Unit, to: Unit) -> Result<f64> {
        if from == Unit::Deg || to == Unit::Deg {
            self.require_distance()
        } else {
            Ok(0.0)
        }
    }

    fn half_size(&self) -> Point {
        Point::new(self.size_pix[0] as f64 / 2.0, self.size_pix[1] as f64 / 2.0)
    }

    fn to_cm(&self, point: Point, unit: Unit, distance: f64) -> Point {
        let pix_per_cm = self.pix_per_cm();
        match unit {
            Unit::Pix => point.map(|v| v / pix_per_cm),
            Unit::Cm => point,
            Unit::Deg => point.map(|v| v.to_radians().tan() * distance),
            Unit::Norm => {
                let half = self.half_size();
                Point::new(point.x * half.x, point.y * half.y).map(|v| v / pix_per_cm)
            }
        }
    }

    fn from_cm(&self, cm: Point, unit: Unit, distance: f64) -> Point {
        let pix_per_cm = self.pix_per_cm();
        match unit {
            Unit::Pix => cm.map(|v| v * pix_per_cm),
            Unit::Cm => cm,
            Unit::Deg => cm.map(|v| (v / distance).atan().to_degrees()),
            Unit::Norm => {
                let half = self.half_size();
                let pix = cm.map(|v| v * pix_per_cm);
                Point::new(pix.x / half.x, pix.y / half.y)
            }
        }
    }

    /// Convert a point between units
    pub fn convert(&self, point: Point, from: Unit, to: Unit) -> Result<Point> {
        if from == to {
            return Ok(point);
        }
        let distance = self.distance_for(from, to)?;
        Ok(self.from_cm(self.to_cm(point, from, distance), to, distance))
    }
}

/// Convert a point between units using `geometry`
pub fn convert(point: Point, from: Unit, to: Unit, geometry: &MonitorGeometry) -> Result<Point> {
    geometry.convert(point, from, to)
}

/// Convert a point between unit names, as read from configuration or a CLI
pub fn convert_named(
    point: Point,
    from: &str,
    to: &str,
    geometry: &MonitorGeometry,
) -> Result<Point> {
    geometry.convert(point, from.parse()?, to.parse()?)
}

/// Converter from device pixels to a fixed target unit.
///
/// Geometry requirements are checked once, at construction, so per-sample
/// conversion cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct PixelConverter {
    geometry: MonitorGeometry,
    target: Unit,
    distance: f64,
}

impl PixelConverter {
    pub fn new(geometry: MonitorGeometry, target: Unit) -> Result<Self> {
        let distance = geometry.distance_for(Unit::Pix, target)?;
        Ok(Self {
            geometry,
            target,
            distance,
        })
    }

    pub fn target(&self) -> Unit {
        self.target
    }

    pub fn apply(&self, pixels: Point) -> Point {
        if self.target == Unit::Pix {
            return pixels;
        }
        let cm = self.geometry.to_cm(pixels, Unit::Pix, self.distance);
        self.geometry.from_cm(cm, self.target, self.distance)
    }
}
