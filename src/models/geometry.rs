//! Canvas geometry primitives.
//!
//! Coordinates are abstract canvas units: pixels for the reference metrics,
//! terminal cells for the TUI.

use serde::{Deserialize, Serialize};

/// A point in canvas (or client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the point shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset_by(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Width and height of a surface or footprint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Size {
    /// Creates a new size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether this size describes a real, non-empty area.
    #[must_use]
    pub fn is_measurable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// An origin plus a size, e.g. the canvas as seen from client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Region {
    /// Top-left corner in client coordinates
    pub origin: Point,
    /// Extent
    pub size: Size,
}

impl Region {
    /// Creates a new region.
    #[must_use]
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Whether `point` lies inside the region (right and bottom edges exclusive).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.origin.x + self.size.width
            && point.y < self.origin.y + self.size.height
    }

    /// Converts a client point into coordinates relative to the region origin.
    #[must_use]
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(point.x - self.origin.x, point.y - self.origin.y)
    }
}
