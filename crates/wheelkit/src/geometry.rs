//! Wheel geometry shared by the expander, the renderer and the hit-tester.
//!
//! The poster zone constants here are read both when deciding how many
//! fragments an item needs and when the renderer sizes the artwork, so the two
//! always agree on how wide a poster is.

use std::f64::consts::{PI, TAU};

/// Gap between the widget edge and the wheel rim.
pub const MARGIN: f64 = 12.0;
/// Radial overscan of the poster zone past the rim (clipped away when drawn).
pub const OVER: f64 = 8.0;
/// Poster width as a fraction of the poster zone height (2:3 artwork).
pub const POSTER_WIDTH_RATIO: f64 = 2.0 / 3.0;
/// How much wider than a poster a wedge may get before it is split.
pub const OVERSCAN: f64 = 1.15;
/// Centre hub (roll button) as a fraction of the wheel radius.
pub const HUB_RATIO: f64 = 0.22;
/// Angle at which segment `0` starts on screen: straight up.
pub const POINTER_ANGLE: f64 = -PI / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelGeometry {
    pub center: Point,
    pub radius: f64,
}

impl WheelGeometry {
    /// Geometry for a widget of the given size, or `None` when the wheel would
    /// have no area (unmapped or collapsed widget).
    pub fn from_size(width: f64, height: f64) -> Option<Self> {
        if !width.is_finite() || !height.is_finite() {
            return None;
        }
        let radius = width.min(height) / 2.0 - MARGIN;
        (radius.is_finite() && radius > 0.0).then(|| Self {
            center: Point::new(width / 2.0, height / 2.0),
            radius,
        })
    }

    pub fn hub_radius(&self) -> f64 {
        self.radius * HUB_RATIO
    }

    /// Poster zone `(width, height)`; the zone is anchored at the rim.
    pub fn poster_zone(&self) -> (f64, f64) {
        let height = self.radius + OVER;
        (height * POSTER_WIDTH_RATIO, height)
    }

    /// Rotation offset applied to every segment angle.
    pub fn rot0(rotation: f64) -> f64 {
        POINTER_ANGLE + rotation
    }

    /// Polar coordinates of `point` relative to the centre: `(distance, angle)`.
    pub fn polar(&self, point: Point) -> (f64, f64) {
        let (dx, dy) = (point.x - self.center.x, point.y - self.center.y);
        (dx.hypot(dy), dy.atan2(dx))
    }
}

/// Width a single poster occupies on a wheel of `outer_radius`.
pub fn poster_width(outer_radius: f64) -> f64 {
    (outer_radius + OVER) * POSTER_WIDTH_RATIO
}

/// Straight-line distance between the rim endpoints of a wedge of `span` radians.
pub fn chord(outer_radius: f64, span: f64) -> f64 {
    2.0 * outer_radius * (span / 2.0).sin()
}

/// Normalize an angle to `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}
