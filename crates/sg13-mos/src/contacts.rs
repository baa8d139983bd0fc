//! Contact tiling.
//!
//! [`ContactArray`] fills a box with a 2-D grid of square cuts;
//! [`ContactRun`] lines cuts up along one axis-aligned segment and can cover
//! them with a metal strip. Both share [`distribute`]: the first and last cut
//! sit exactly at the enclosure and the slack is split evenly between the
//! gaps, except that a single cut is centred.

use sg13_core::{BBox, Grid, LayerHandle, Point, Rect};

use crate::error::{MosError, MosResult};

/// Offsets from the start of a span at which cuts of `size` begin.
///
/// Returns an empty list when not even one cut fits; that is a valid
/// outcome, not an error.
pub fn distribute(span: f64, enc: f64, size: f64, gap: f64, epsilon: f64) -> Vec<f64> {
    let n = ((span - 2.0 * enc + gap) / (size + gap) + epsilon).floor();
    if n < 1.0 {
        return Vec::new();
    }
    let n = n as usize;
    if n == 1 {
        return vec![(span - size) / 2.0];
    }
    let spread = (span - 2.0 * enc - n as f64 * size) / (n - 1) as f64;
    (0..n).map(|i| enc + i as f64 * (size + spread)).collect()
}

/// Square cuts tiled into a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactArray {
    pub size: f64,
    pub min_gap: f64,
    pub enc_x: f64,
    pub enc_y: f64,
}

impl ContactArray {
    pub fn new(size: f64, min_gap: f64, enc_x: f64, enc_y: f64) -> Self {
        Self {
            size,
            min_gap,
            enc_x,
            enc_y,
        }
    }

    /// Lower-left corners of the cuts, snapped, in column-major order.
    pub fn place(&self, grid: &Grid, bbox: &BBox) -> Vec<Point> {
        let xs = distribute(bbox.width(), self.enc_x, self.size, self.min_gap, grid.epsilon);
        let ys = distribute(bbox.height(), self.enc_y, self.size, self.min_gap, grid.epsilon);
        let mut out = Vec::with_capacity(xs.len() * ys.len());
        for x in &xs {
            for y in &ys {
                let (px, py) = grid.snap_point(bbox.min.x + x, bbox.min.y + y);
                out.push(Point::new(px, py));
            }
        }
        out
    }

    /// The cuts as `size x size` rectangles on `layer`.
    pub fn rects(&self, grid: &Grid, bbox: &BBox, layer: LayerHandle) -> Vec<Rect> {
        self.place(grid, bbox)
            .into_iter()
            .map(|p| Rect::new(layer, p.x, p.y, p.x + self.size, p.y + self.size))
            .collect()
    }
}

/// Cuts along a straight segment, with an optional covering strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRun {
    pub metal: Option<LayerHandle>,
    pub cut: LayerHandle,
    pub strip_width: f64,
    /// Cut extent across the segment.
    pub cut_size: f64,
    /// Cut extent along the segment.
    pub cut_length: f64,
    /// Minimum distance from either segment end to the nearest cut.
    pub edge_offset: f64,
    pub gap: f64,
}

/// Output of one [`ContactRun`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunShapes {
    pub cuts: Vec<Rect>,
    pub metal: Option<Rect>,
}

impl RunShapes {
    pub fn into_rects(self) -> impl Iterator<Item = Rect> {
        self.cuts.into_iter().chain(self.metal)
    }
}

impl ContactRun {
    fn offsets(&self, grid: &Grid, span: f64) -> Vec<f64> {
        distribute(span, self.edge_offset, self.cut_length, self.gap, grid.epsilon)
    }

    /// Tiles cuts from `p1` to `p2`, shifted by `shift` before snapping.
    pub fn place(&self, grid: &Grid, p1: Point, p2: Point, shift: Point) -> MosResult<RunShapes> {
        let vertical = (p1.x - p2.x).abs() <= grid.epsilon;
        let horizontal = (p1.y - p2.y).abs() <= grid.epsilon;
        if !vertical && !horizontal {
            return Err(MosError::NonAxisAligned {
                x1: p1.x,
                y1: p1.y,
                x2: p2.x,
                y2: p2.y,
            });
        }

        let half_strip = self.strip_width / 2.0;
        let half_cut = self.cut_size / 2.0;
        let (sx, sy) = (shift.x, shift.y);
        let mut out = RunShapes::default();

        if vertical {
            let (lo, hi) = (p1.y.min(p2.y), p1.y.max(p2.y));
            for y in self.offsets(grid, hi - lo) {
                out.cuts.push(Rect::new(
                    self.cut,
                    grid.snap(sx + p1.x - half_cut),
                    grid.snap(sy + lo + y),
                    grid.snap(sx + p1.x + half_cut),
                    grid.snap(sy + lo + y + self.cut_length),
                ));
            }
            out.metal = self.metal.map(|layer| {
                Rect::new(
                    layer,
                    grid.snap(sx + p1.x - half_strip),
                    grid.snap(sy + lo),
                    grid.snap(sx + p1.x + half_strip),
                    grid.snap(sy + hi),
                )
            });
        } else {
            let (lo, hi) = (p1.x.min(p2.x), p1.x.max(p2.x));
            for x in self.offsets(grid, hi - lo) {
                out.cuts.push(Rect::new(
                    self.cut,
                    grid.snap(sx + lo + x),
                    grid.snap(sy + p1.y - half_cut),
                    grid.snap(sx + lo + x + self.cut_length),
                    grid.snap(sy + p1.y + half_cut),
                ));
            }
            out.metal = self.metal.map(|layer| {
                Rect::new(
                    layer,
                    grid.snap(sx + lo),
                    grid.snap(sy + p1.y - half_strip),
                    grid.snap(sx + hi),
                    grid.snap(sy + p1.y + half_strip),
                )
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONT: LayerHandle = LayerHandle::new(6);
    const M1: LayerHandle = LayerHandle::new(8);

    fn grid() -> Grid {
        Grid::new(0.005, 0.001, 0.001).unwrap()
    }

    fn run() -> ContactRun {
        ContactRun {
            metal: Some(M1),
            cut: CONT,
            strip_width: 0.26,
            cut_size: 0.16,
            cut_length: 0.16,
            edge_offset: 0.07,
            gap: 0.18,
        }
    }

    #[test]
    fn test_multi_count_distribution() {
        let xs = distribute(10.0, 0.1, 1.0, 1.0, 0.001);
        assert_eq!(xs.len(), 5);
        assert!((xs[0] - 0.1).abs() < 1e-9);
        assert!((10.0 - (xs[4] + 1.0) - 0.1).abs() < 1e-9);
        for pair in xs.windows(2) {
            assert!((pair[1] - pair[0] - 1.0 - 1.2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_cut_is_centred() {
        let xs = distribute(1.0, 0.1, 0.5, 0.6, 0.001);
        assert_eq!(xs.len(), 1);
        assert!((xs[0] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_fits() {
        assert!(distribute(0.2, 0.1, 0.5, 0.6, 0.001).is_empty());
        assert!(distribute(0.0, 0.07, 0.16, 0.18, 0.001).is_empty());
        let array = ContactArray::new(0.16, 0.18, 0.07, 0.07);
        assert!(array
            .place(&grid(), &BBox::from_corners(0.0, 0.0, 0.2, 1.0))
            .is_empty());
    }

    #[test]
    fn test_exact_fit_counts() {
        // 0.30 holds exactly one cut with 0.07 enclosure
        assert_eq!(distribute(0.30, 0.07, 0.16, 0.18, 0.001).len(), 1);
        // 0.64 holds exactly two
        let ys = distribute(0.64, 0.07, 0.16, 0.18, 0.001);
        assert_eq!(ys.len(), 2);
        assert!((ys[1] - 0.41).abs() < 1e-9);
    }

    #[test]
    fn test_array_containment_and_spacing() {
        let g = grid();
        let bbox = BBox::from_corners(0.5, -0.2, 2.35, 3.1);
        let array = ContactArray::new(0.16, 0.18, 0.07, 0.07);
        let rects = array.rects(&g, &bbox, CONT);
        assert!(rects.len() > 4);
        for r in &rects {
            assert!(bbox.contains_bbox(&r.bbox(), 1e-9));
            assert!(g.is_aligned(r.lower_left.x) && g.is_aligned(r.lower_left.y));
        }
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(a.bbox().distance_to(&b.bbox()) >= 0.18 - 1e-9);
            }
        }
    }

    #[test]
    fn test_array_column_of_standard_device() {
        // column box of a 0.15 wide finger widened to 0.30
        let array = ContactArray::new(0.16, 0.18, 0.0, 0.07);
        let pts = array.place(&grid(), &BBox::from_corners(0.07, 0.0, 0.23, 0.30));
        assert_eq!(pts.len(), 1);
        assert!((pts[0].x - 0.07).abs() < 1e-9);
        assert!((pts[0].y - 0.07).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_run() {
        let shapes = run()
            .place(&grid(), Point::new(0.0, 0.5), Point::new(2.0, 0.5), Point::zero())
            .unwrap();
        // (2.0 - 0.14 + 0.18) / 0.34 = 6
        assert_eq!(shapes.cuts.len(), 6);
        let first = shapes.cuts[0];
        assert!((first.lower_left.x - 0.07).abs() < 1e-9);
        assert!((first.lower_left.y - 0.42).abs() < 1e-9);
        let last = shapes.cuts[5];
        assert!((last.upper_right.x - 1.93).abs() < 1e-9);
        let metal = shapes.metal.unwrap();
        assert!((metal.lower_left.y - 0.37).abs() < 1e-9);
        assert!((metal.upper_right.y - 0.63).abs() < 1e-9);
        assert!((metal.width() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_run_reversed_endpoints() {
        let g = grid();
        let r = run();
        let up = r
            .place(&g, Point::new(1.0, 0.0), Point::new(1.0, 1.0), Point::zero())
            .unwrap();
        let down = r
            .place(&g, Point::new(1.0, 1.0), Point::new(1.0, 0.0), Point::zero())
            .unwrap();
        assert_eq!(up, down);
        for c in &up.cuts {
            assert!((c.lower_left.x - 0.92).abs() < 1e-9);
            assert!((c.width() - 0.16).abs() < 1e-9);
        }
    }

    #[test]
    fn test_run_shift_applies_before_snap() {
        let g = grid();
        let r = run();
        let base = r
            .place(&g, Point::new(0.0, 0.5), Point::new(2.0, 0.5), Point::zero())
            .unwrap();
        let shifted = r
            .place(&g, Point::new(0.0, 0.5), Point::new(2.0, 0.5), Point::new(1.5, -0.25))
            .unwrap();
        for (a, b) in base.cuts.iter().zip(&shifted.cuts) {
            assert!((b.lower_left.x - a.lower_left.x - 1.5).abs() < 1e-9);
            assert!((b.lower_left.y - a.lower_left.y + 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_run_without_metal() {
        let mut r = run();
        r.metal = None;
        let shapes = r
            .place(&grid(), Point::new(0.0, 0.0), Point::new(0.3, 0.0), Point::zero())
            .unwrap();
        assert_eq!(shapes.cuts.len(), 1);
        assert!(shapes.metal.is_none());
        assert!((shapes.cuts[0].lower_left.x - 0.07).abs() < 1e-9);
    }

    #[test]
    fn test_diagonal_run_rejected() {
        let err = run()
            .place(&grid(), Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::zero())
            .unwrap_err();
        assert!(matches!(err, MosError::NonAxisAligned { .. }));
    }
}
