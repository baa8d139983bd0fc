use sg13_core::{BBox, Grid, LayerHandle, Port, PortOrientation};

/// Which pin extent becomes the port width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortExtent {
    /// The pin's x-extent.
    Horizontal,
    /// The pin's y-extent.
    Vertical,
}

impl PortExtent {
    /// The extent perpendicular to the direction the port faces.
    pub fn across(orientation: PortOrientation) -> Self {
        match orientation {
            PortOrientation::East | PortOrientation::West => PortExtent::Vertical,
            PortOrientation::North | PortOrientation::South => PortExtent::Horizontal,
        }
    }

    fn of(&self, pin: &BBox) -> f64 {
        match self {
            PortExtent::Horizontal => pin.width(),
            PortExtent::Vertical => pin.height(),
        }
    }
}

/// Port centred on `pin` whose width is an even number of database units.
///
/// The centre is the analytic midpoint and is not snapped.
pub fn derive_port(
    grid: &Grid,
    name: &str,
    pin: &BBox,
    orientation: PortOrientation,
    extent: PortExtent,
    layer: LayerHandle,
) -> Port {
    Port {
        name: name.to_string(),
        center: pin.center(),
        width: grid.even_dbu(extent.of(pin)),
        orientation,
        layer,
    }
}
