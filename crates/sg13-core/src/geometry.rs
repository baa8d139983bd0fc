use serde::{Deserialize, Serialize};

use crate::LayerHandle;

/// A 2D point in layout coordinates (micrometers).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Builds a box from two opposite corners given in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: Point::new(x1.min(x2), y1.min(y2)),
            max: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether `other` lies inside this box, with `tol` slack on every side.
    pub fn contains_bbox(&self, other: &BBox, tol: f64) -> bool {
        other.min.x >= self.min.x - tol
            && other.min.y >= self.min.y - tol
            && other.max.x <= self.max.x + tol
            && other.max.y <= self.max.y + tol
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Grows the box by `dx` horizontally and `dy` vertically on each side.
    pub fn expand(&self, dx: f64, dy: f64) -> Self {
        Self {
            min: self.min.translate(-dx, -dy),
            max: self.max.translate(dx, dy),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            min: self.min.translate(dx, dy),
            max: self.max.translate(dx, dy),
        }
    }

    /// Edge-to-edge distance to another box; zero when they touch or overlap.
    pub fn distance_to(&self, other: &BBox) -> f64 {
        let dx = (other.min.x - self.max.x).max(self.min.x - other.max.x).max(0.0);
        let dy = (other.min.y - self.max.y).max(self.min.y - other.max.y).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

/// A rectangle on a layer, stored as lower-left and upper-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub layer: LayerHandle,
    pub lower_left: Point,
    pub upper_right: Point,
}

impl Rect {
    pub fn new(layer: LayerHandle, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            layer,
            lower_left: Point::new(x1.min(x2), y1.min(y2)),
            upper_right: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn from_bbox(layer: LayerHandle, bbox: BBox) -> Self {
        Self::new(layer, bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y)
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.lower_left, self.upper_right)
    }

    pub fn width(&self) -> f64 {
        self.upper_right.x - self.lower_left.x
    }

    pub fn height(&self) -> f64 {
        self.upper_right.y - self.lower_left.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// A rectangle with no interior cannot be drawn on a mask.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.bbox().contains_point(p)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            layer: self.layer,
            lower_left: self.lower_left.translate(dx, dy),
            upper_right: self.upper_right.translate(dx, dy),
        }
    }
}

/// A polygon defined by a list of vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub layer: LayerHandle,
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(layer: LayerHandle, vertices: Vec<Point>) -> Self {
        Self { layer, vertices }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            layer: self.layer,
            vertices: self.vertices.iter().map(|p| p.translate(dx, dy)).collect(),
        }
    }
}

/// One unit of mask output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
}

impl Shape {
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            Shape::Rect(r) => Some(r.bbox()),
            Shape::Polygon(p) => p.bbox(),
        }
    }

    pub fn layer(&self) -> LayerHandle {
        match self {
            Shape::Rect(r) => r.layer,
            Shape::Polygon(p) => p.layer,
        }
    }

    pub fn as_rect(&self) -> Option<&Rect> {
        match self {
            Shape::Rect(r) => Some(r),
            Shape::Polygon(_) => None,
        }
    }

    /// Every vertex of the shape, in drawing order.
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            Shape::Rect(r) => vec![
                r.lower_left,
                Point::new(r.upper_right.x, r.lower_left.y),
                r.upper_right,
                Point::new(r.lower_left.x, r.upper_right.y),
            ],
            Shape::Polygon(p) => p.vertices.clone(),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        match self {
            Shape::Rect(r) => Shape::Rect(r.translate(dx, dy)),
            Shape::Polygon(p) => Shape::Polygon(p.translate(dx, dy)),
        }
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Shape::Rect(rect)
    }
}
