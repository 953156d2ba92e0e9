//! Coordinates for the two layout engines: continuous points for the tree
//! layout and integral grid points for circuit diagrams.

use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Default, Serialize, Debug)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned box, top-left anchored.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Debug)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn top_center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y)
    }

    pub fn bottom_center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}

/// Running bounding box; empty until the first rect is added.
#[derive(Clone, Copy, Default, Debug)]
pub struct Bounds {
    extent: Option<(Point, Point)>,
}

impl Bounds {
    pub fn add(&mut self, rect: &Rect) {
        let (lo, hi) = (
            Point::new(rect.x, rect.y),
            Point::new(rect.x + rect.width, rect.y + rect.height),
        );
        self.extent = Some(match self.extent {
            None => (lo, hi),
            Some((min, max)) => (
                Point::new(min.x.min(lo.x), min.y.min(lo.y)),
                Point::new(max.x.max(hi.x), max.y.max(hi.y)),
            ),
        });
    }

    pub fn min(&self) -> Point {
        self.extent.map(|(min, _)| min).unwrap_or_default()
    }

    pub fn width(&self) -> f64 {
        self.extent.map_or(0.0, |(min, max)| max.x - min.x)
    }

    pub fn height(&self) -> f64 {
        self.extent.map_or(0.0, |(min, max)| max.y - min.y)
    }
}

/// A point on the circuit grid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Debug)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    pub fn new(x: u32, y: u32) -> Self {
        GridPoint { x, y }
    }

    pub fn scaled(self, scale: f64) -> Point {
        Point::new(f64::from(self.x) * scale, f64::from(self.y) * scale)
    }
}

pub fn view_box(width: f64, height: f64) -> String {
    format!("0 0 {width} {height}")
}
