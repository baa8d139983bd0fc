//! # SG13 Core
//!
//! Geometry primitives, manufacturing-grid arithmetic, opaque layer handles,
//! and the append-only layout accumulator shared by the SG13 device
//! generators. Also provides an R-tree index over emitted shapes for probing
//! and spacing queries.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod layer;
pub mod layout;
pub mod spatial;

pub use error::{CoreError, CoreResult};
pub use geometry::{BBox, Point, Polygon, Rect, Shape};
pub use grid::Grid;
pub use layer::{LayerHandle, LayerInfo, LayerMap, LayerPurpose};
pub use layout::{Layout, LayoutBuilder, Port, PortOrientation};
