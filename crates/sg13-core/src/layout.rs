use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geometry::{BBox, Point, Rect, Shape};
use crate::grid::Grid;
use crate::spatial::{SpatialEntry, SpatialIndex};
use crate::LayerHandle;

/// Direction a port faces, in degrees counter-clockwise from east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortOrientation {
    East,
    North,
    West,
    South,
}

impl PortOrientation {
    pub fn degrees(&self) -> u16 {
        match self {
            PortOrientation::East => 0,
            PortOrientation::North => 90,
            PortOrientation::West => 180,
            PortOrientation::South => 270,
        }
    }
}

/// A named electrical terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub center: Point,
    pub width: f64,
    pub orientation: PortOrientation,
    pub layer: LayerHandle,
}

/// Append-only shape and port collection owned by one generator call.
#[derive(Debug)]
pub struct LayoutBuilder {
    name: String,
    shapes: Vec<Shape>,
    ports: Vec<Port>,
}

impl LayoutBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shapes: Vec::new(),
            ports: Vec::new(),
        }
    }

    /// Records one rectangle, normalizing corner order.
    ///
    /// Zero-area rectangles are dropped and reported as `None`.
    pub fn add_rect(
        &mut self,
        layer: LayerHandle,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    ) -> Option<Rect> {
        let rect = Rect::new(layer, x1, y1, x2, y2);
        if rect.is_degenerate() {
            return None;
        }
        self.shapes.push(Shape::Rect(rect));
        Some(rect)
    }

    pub fn add_bbox(&mut self, layer: LayerHandle, bbox: BBox) -> Option<Rect> {
        self.add_rect(layer, bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y)
    }

    pub fn add_shape(&mut self, shape: Shape) {
        match &shape {
            Shape::Rect(r) if r.is_degenerate() => {}
            Shape::Polygon(p) if p.vertex_count() < 3 => {}
            _ => self.shapes.push(shape),
        }
    }

    pub fn extend<I: IntoIterator<Item = Shape>>(&mut self, shapes: I) {
        for shape in shapes {
            self.add_shape(shape);
        }
    }

    pub fn add_port(&mut self, port: Port) -> CoreResult<()> {
        if self.ports.iter().any(|p| p.name == port.name) {
            return Err(CoreError::DuplicatePort(port.name));
        }
        self.ports.push(port);
        Ok(())
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Seals the accumulator into an immutable layout.
    pub fn finish(self) -> Layout {
        log::debug!(
            "{}: {} shapes, {} ports",
            self.name,
            self.shapes.len(),
            self.ports.len()
        );
        Layout {
            name: self.name,
            shapes: self.shapes,
            ports: self.ports,
        }
    }
}

/// The finished geometry of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    name: String,
    shapes: Vec<Shape>,
    ports: Vec<Port>,
}

impl Layout {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn shapes_on_layer(&self, layer: LayerHandle) -> Vec<&Shape> {
        self.shapes.iter().filter(|s| s.layer() == layer).collect()
    }

    pub fn rects_on_layer(&self, layer: LayerHandle) -> Vec<&Rect> {
        self.shapes
            .iter()
            .filter_map(Shape::as_rect)
            .filter(|r| r.layer == layer)
            .collect()
    }

    /// Bounding box of all shapes.
    pub fn bbox(&self) -> Option<BBox> {
        self.shapes
            .iter()
            .filter_map(|s| s.bbox())
            .reduce(|a, b| a.union(&b))
    }

    pub fn layer_bbox(&self, layer: LayerHandle) -> Option<BBox> {
        self.shapes
            .iter()
            .filter(|s| s.layer() == layer)
            .filter_map(|s| s.bbox())
            .reduce(|a, b| a.union(&b))
    }

    /// Vertices that sit further than epsilon from the grid.
    pub fn off_grid_vertices(&self, grid: &Grid) -> Vec<Point> {
        self.shapes
            .iter()
            .flat_map(|s| s.vertices())
            .filter(|p| !grid.is_aligned(p.x) || !grid.is_aligned(p.y))
            .collect()
    }

    pub fn spatial_index(&self) -> SpatialIndex {
        SpatialIndex::build(
            self.shapes
                .iter()
                .enumerate()
                .filter_map(|(i, s)| {
                    s.bbox().map(|bbox| SpatialEntry {
                        shape_index: i,
                        layer: s.layer(),
                        bbox,
                    })
                })
                .collect(),
        )
    }

    /// Pairs of shapes on `layer` closer than `min_gap` without overlapping.
    pub fn spacing_violations(&self, layer: LayerHandle, min_gap: f64) -> Vec<(usize, usize)> {
        let index = self.spatial_index();
        let mut out = Vec::new();
        for entry in index.entries_on_layer(layer) {
            for other in index.closer_than(entry, min_gap) {
                if other.shape_index > entry.shape_index {
                    out.push((entry.shape_index, other.shape_index));
                }
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
