use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::BBox;
use crate::LayerHandle;

/// Distances below this are treated as floating-point noise.
const DISTANCE_TOLERANCE: f64 = 1e-9;

/// An entry in the R-tree spatial index, referencing a shape by its index.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    /// Index into the layout's shape list.
    pub shape_index: usize,
    pub layer: LayerHandle,
    /// Bounding box of the shape.
    pub bbox: BBox,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Spatial index over emitted shapes, used for region and spacing queries.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    /// Build the index from a list of shape bounding boxes.
    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Find all entries that intersect the given region.
    pub fn query_region(&self, region: &BBox) -> Vec<&SpatialEntry> {
        let envelope = AABB::from_corners(
            [region.min.x, region.min.y],
            [region.max.x, region.max.y],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    pub fn entries_on_layer(&self, layer: LayerHandle) -> impl Iterator<Item = &SpatialEntry> {
        self.tree.iter().filter(move |e| e.layer == layer)
    }

    /// Same-layer entries that are separated from `entry` by a gap smaller
    /// than `gap`. Touching or overlapping shapes are merged on the mask and
    /// are not reported.
    pub fn closer_than(&self, entry: &SpatialEntry, gap: f64) -> Vec<&SpatialEntry> {
        self.query_region(&entry.bbox.expand(gap, gap))
            .into_iter()
            .filter(|other| other.shape_index != entry.shape_index && other.layer == entry.layer)
            .filter(|other| {
                let d = entry.bbox.distance_to(&other.bbox);
                d > DISTANCE_TOLERANCE && d < gap - DISTANCE_TOLERANCE
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    const L: LayerHandle = LayerHandle::new(3);

    #[test]
    fn test_spatial_query() {
        let entries = vec![
            SpatialEntry {
                shape_index: 0,
                layer: L,
                bbox: BBox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0)),
            },
            SpatialEntry {
                shape_index: 1,
                layer: L,
                bbox: BBox::new(Point::new(20.0, 20.0), Point::new(30.0, 30.0)),
            },
        ];
        let index = SpatialIndex::build(entries);

        assert_eq!(index.len(), 2);
        let corner = BBox::new(Point::new(24.0, 24.0), Point::new(26.0, 26.0));
        let results = index.query_region(&corner);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].shape_index, 1);
        assert_eq!(index.entries_on_layer(L).count(), 2);

        let region = BBox::new(Point::new(-5.0, -5.0), Point::new(15.0, 15.0));
        assert_eq!(index.query_region(&region).len(), 1);
    }

    #[test]
    fn test_closer_than_skips_touching() {
        let a = SpatialEntry {
            shape_index: 0,
            layer: L,
            bbox: BBox::from_corners(0.0, 0.0, 1.0, 1.0),
        };
        let touching = SpatialEntry {
            shape_index: 1,
            layer: L,
            bbox: BBox::from_corners(1.0, 0.0, 2.0, 1.0),
        };
        let near = SpatialEntry {
            shape_index: 2,
            layer: L,
            bbox: BBox::from_corners(-0.5, 0.0, -0.1, 1.0),
        };
        let index = SpatialIndex::build(vec![a.clone(), touching, near]);
        let close = index.closer_than(&a, 0.2);
        assert_eq!(close.len(), 1);
        assert_eq!(close[0].shape_index, 2);
    }
}
