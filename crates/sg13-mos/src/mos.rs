//! Standard multi-finger MOS body.
//!
//! The body is drawn left to right: a source contact column, then for every
//! finger a gate and the next S/D column, then the diffusion that spans them
//! all, the class layers and the ports. The x-cursor is carried through an
//! explicit fold over the fingers, so each gate is placed from the column
//! before it and gate-to-contact spacing holds by construction.

use sg13_core::{BBox, Grid, LayerHandle, LayerMap, Layout, LayoutBuilder, PortOrientation};
use sg13_tech::{layers, DesignRuleSet, Technology};

use crate::class::{body_layers, BodyFrame, BodyLayers, DeviceClass};
use crate::contacts::ContactArray;
use crate::error::MosResult;
use crate::params::DeviceParameters;
use crate::ports::{derive_port, PortExtent};

/// Layer handles used by the standard body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosLayers {
    pub activ: LayerHandle,
    pub gatpoly: LayerHandle,
    pub gatpoly_pin: LayerHandle,
    pub cont: LayerHandle,
    pub metal1: LayerHandle,
    pub metal1_pin: LayerHandle,
    pub psd: LayerHandle,
    pub nwell: LayerHandle,
    pub thick_gate_ox: LayerHandle,
    pub heat_trans: LayerHandle,
    pub substrate: LayerHandle,
}

impl MosLayers {
    pub fn resolve(map: &LayerMap) -> MosResult<Self> {
        Ok(Self {
            activ: map.drawing(layers::ACTIV)?,
            gatpoly: map.drawing(layers::GATPOLY)?,
            gatpoly_pin: map.pin(layers::GATPOLY)?,
            cont: map.drawing(layers::CONT)?,
            metal1: map.drawing(layers::METAL1)?,
            metal1_pin: map.pin(layers::METAL1)?,
            psd: map.drawing(layers::PSD)?,
            nwell: map.drawing(layers::NWELL)?,
            thick_gate_ox: map.drawing(layers::THICK_GATE_OX)?,
            heat_trans: map.drawing(layers::HEAT_TRANS)?,
            substrate: map.drawing(layers::SUBSTRATE)?,
        })
    }
}

/// Values derived once from the request before anything is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosDims {
    pub fingers: u32,
    /// Per-finger width.
    pub w: f64,
    pub gate_length: f64,
    pub gate_cont_dist: f64,
    /// Upward shift of narrow devices, so the column box can hold a contact.
    pub diffoffset: f64,
    pub well_offset: f64,
    pub contacts_per_column: u32,
    /// Metal1 y-extent shared by every S/D column.
    pub metal_y: (f64, f64),
}

impl MosDims {
    pub fn derive(params: &DeviceParameters, rules: &DesignRuleSet, table: &BodyLayers) -> Self {
        let grid = rules.grid();
        let c = &rules.contact;
        let eps = grid.epsilon;
        let fingers = params.fingers.max(1);
        let w = grid.snap(params.width / fingers as f64);
        let gate_length = grid.snap(params.length);
        let cont_act_min = rules.min_contacted_active();

        let gate_cont_dist = if w < cont_act_min - eps {
            c.enc_active + rules.mos.gat_d
        } else {
            rules.mos.cont_gate_dist
        };
        let diffoffset = if w < cont_act_min {
            grid.snap((cont_act_min - w) / 2.0)
        } else {
            0.0
        };
        let well_offset = grid.snap((cont_act_min - w) / 2.0).max(0.0);

        let n = (table.contact_count)(w, rules);
        let pitch = c.size + c.spacing;
        let endcap = rules.metal1_endcap();
        let slack = grid.snap(
            (w - 2.0 * c.enc_active - n as f64 * c.size - (n - 1) as f64 * c.spacing) / 2.0,
        );
        let y_cont = c.enc_active + diffoffset + slack;
        let metal_y = (
            (y_cont - endcap).min(diffoffset),
            (y_cont + c.size + (n - 1) as f64 * pitch + endcap).max(w + diffoffset),
        );

        Self {
            fingers,
            w,
            gate_length,
            gate_cont_dist,
            diffoffset,
            well_offset,
            contacts_per_column: n,
            metal_y,
        }
    }

    /// Centre-to-centre distance of neighbouring gates.
    pub fn finger_pitch(&self, rules: &DesignRuleSet) -> f64 {
        rules.contact.size + 2.0 * self.gate_cont_dist + self.gate_length
    }
}

/// Shapes of one S/D column.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Column {
    x1: f64,
    metal: BBox,
    activ: BBox,
}

/// Accumulator threaded through the finger loop.
struct FingerFold {
    out: LayoutBuilder,
    column: Column,
    /// Gate of finger 1.
    gate_pin: BBox,
    /// Metal of the column right of finger 1.
    drain_pin: BBox,
}

pub struct MosBodyBuilder<'a> {
    params: &'a DeviceParameters,
    rules: &'a DesignRuleSet,
    grid: Grid,
    layers: MosLayers,
    class: DeviceClass,
    table: BodyLayers,
    dims: MosDims,
}

impl<'a> MosBodyBuilder<'a> {
    /// Validates the request and derives the body dimensions.
    pub fn new(params: &'a DeviceParameters, tech: &'a Technology) -> MosResult<Self> {
        params.validate(&tech.rules)?;
        let class = params.kind.class();
        let table = body_layers(class.polarity, class.voltage);
        Ok(Self {
            params,
            rules: &tech.rules,
            grid: tech.rules.grid(),
            layers: MosLayers::resolve(&tech.layers)?,
            class,
            table,
            dims: MosDims::derive(params, &tech.rules, &table),
        })
    }

    pub fn dims(&self) -> &MosDims {
        &self.dims
    }

    fn pin_layers(&self) -> (LayerHandle, LayerHandle) {
        if self.table.pins_on_drawing {
            (self.layers.metal1, self.layers.gatpoly)
        } else {
            (self.layers.metal1_pin, self.layers.gatpoly_pin)
        }
    }

    pub fn build(&self) -> MosResult<Layout> {
        let d = &self.dims;
        log::debug!(
            "{}: w={} l={} ng={} contacts/column={}",
            self.params.kind,
            d.w,
            d.gate_length,
            d.fingers,
            d.contacts_per_column
        );
        let (pin_m1, pin_poly) = self.pin_layers();
        let mut out = LayoutBuilder::new(self.params.kind.name());

        let source = self.emit_column(&mut out, self.rules.contact.enc_active);
        out.add_bbox(pin_m1, source.metal);

        // finger 1 carries the gate and drain pins
        let (gate, drain) = self.emit_finger(&mut out, &source, 1);
        out.add_bbox(pin_poly, gate);
        out.add_bbox(pin_m1, drain.metal);

        let start = FingerFold {
            out,
            column: drain,
            gate_pin: gate,
            drain_pin: drain.metal,
        };
        let mut fold = (2..=d.fingers).fold(start, |mut acc, i| {
            acc.column = self.emit_finger(&mut acc.out, &acc.column, i).1;
            acc
        });

        let frame = self.emit_spanning_diffusion(&mut fold.out, &fold.column);
        self.emit_class_layers(&mut fold.out, &frame, &fold.column);
        self.emit_ports(&mut fold.out, &source.metal, &fold.drain_pin, &fold.gate_pin)?;
        Ok(fold.out.finish())
    }

    /// Metal, contacts and local diffusion of a column starting at `x0`.
    fn emit_column(&self, out: &mut LayoutBuilder, x0: f64) -> Column {
        let c = &self.rules.contact;
        let d = &self.dims;
        let x1 = x0 + c.size;
        let metal = BBox::from_corners(
            x0 - c.metal1_over,
            d.metal_y.0,
            x1 + c.metal1_over,
            d.metal_y.1,
        );
        out.add_bbox(self.layers.metal1, metal);

        let array = ContactArray::new(c.size, c.spacing, 0.0, c.enc_active);
        let box_ = BBox::from_corners(x0, 0.0, x1, d.w + 2.0 * d.diffoffset);
        for rect in array.rects(&self.grid, &box_, self.layers.cont) {
            out.add_shape(rect.into());
        }

        let activ = BBox::from_corners(
            x0 - c.enc_active,
            0.0,
            x1 + c.enc_active,
            c.enc_active + c.size + c.enc_active,
        );
        out.add_bbox(self.layers.activ, activ);
        Column {
            x1,
            metal,
            activ,
        }
    }

    /// Gate right of `prev` and the S/D column after it.
    fn emit_finger(&self, out: &mut LayoutBuilder, prev: &Column, i: u32) -> (BBox, Column) {
        let d = &self.dims;
        let gpo = self.rules.mos.gatpoly_activ_over;

        let gx0 = prev.x1 + d.gate_cont_dist;
        let gate = BBox::from_corners(
            gx0,
            -gpo + d.diffoffset,
            gx0 + d.gate_length,
            d.w + gpo + d.diffoffset,
        );
        log::trace!("finger {i}: gate x {:.3}..{:.3}", gate.min.x, gate.max.x);
        out.add_bbox(self.layers.gatpoly, gate);
        out.add_bbox(self.layers.heat_trans, gate);

        let column = self.emit_column(out, gate.max.x + d.gate_cont_dist);
        (gate, column)
    }

    fn emit_spanning_diffusion(&self, out: &mut LayoutBuilder, last: &Column) -> BodyFrame {
        let d = &self.dims;
        let gpo = self.rules.mos.gatpoly_activ_over;
        let frame = BodyFrame {
            diff_x0: 0.0,
            diff_x1: last.x1 + self.rules.contact.enc_active,
            diff_y0: 0.0,
            diff_y1: d.w,
            poly_y0: -gpo,
            poly_y1: d.w + gpo,
            diffoffset: d.diffoffset,
            well_offset: d.well_offset,
        };
        out.add_rect(
            self.layers.activ,
            frame.diff_x0,
            frame.diff_y0 + d.diffoffset,
            frame.diff_x1,
            frame.diff_y1 + d.diffoffset,
        );
        frame
    }

    fn emit_class_layers(&self, out: &mut LayoutBuilder, frame: &BodyFrame, last: &Column) {
        let voltage = self.class.voltage;
        let rules = self.rules;
        if let Some(rule) = self.table.implant {
            out.add_bbox(self.layers.psd, rule(frame, rules, voltage));
        }
        if let Some(rule) = self.table.well {
            out.add_bbox(self.layers.nwell, rule(frame, rules, voltage));
        }
        if self.table.bulk_marker {
            out.add_bbox(self.layers.substrate, last.activ);
        }
        if let Some(rule) = self.table.thick_oxide {
            out.add_bbox(self.layers.thick_gate_ox, rule(frame, rules, voltage));
        }
    }

    fn emit_ports(
        &self,
        out: &mut LayoutBuilder,
        source: &BBox,
        drain: &BBox,
        gate: &BBox,
    ) -> MosResult<()> {
        let g = &self.grid;
        let (m1, poly) = (self.layers.metal1_pin, self.layers.gatpoly_pin);
        let vertical = PortExtent::Vertical;
        out.add_port(derive_port(g, "S", source, PortOrientation::West, vertical, m1))?;
        out.add_port(derive_port(g, "D", drain, PortOrientation::East, vertical, m1))?;
        // gate width is the poly height, not its length
        out.add_port(derive_port(g, "G", gate, PortOrientation::South, vertical, poly))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::DeviceKind;

    fn build(params: &DeviceParameters) -> (Layout, MosLayers, MosDims) {
        let tech = Technology::sg13g2();
        let builder = MosBodyBuilder::new(params, &tech).unwrap();
        let dims = *builder.dims();
        (builder.build().unwrap(), builder.layers, dims)
    }

    fn sorted_x0(rects: Vec<&sg13_core::Rect>) -> Vec<f64> {
        let mut xs: Vec<f64> = rects.iter().map(|r| r.lower_left.x).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        xs
    }

    #[test]
    fn test_default_nmos_dimensions() {
        let params = DeviceParameters::new(DeviceKind::Nmos);
        let (layout, layers, dims) = build(&params);
        assert!((dims.gate_cont_dist - 0.14).abs() < 1e-9);
        assert!((dims.diffoffset - 0.075).abs() < 1e-9);

        let cuts = layout.rects_on_layer(layers.cont);
        assert_eq!(cuts.len(), 2);
        assert!((cuts[0].lower_left.x - 0.07).abs() < 1e-9);
        assert!((cuts[0].lower_left.y - 0.07).abs() < 1e-9);
        assert!((cuts[0].upper_right.y - 0.23).abs() < 1e-9);

        let gates = layout.rects_on_layer(layers.gatpoly);
        assert_eq!(gates.len(), 1);
        assert!((gates[0].lower_left.x - 0.37).abs() < 1e-9);
        assert!((gates[0].upper_right.x - 0.50).abs() < 1e-9);
        assert!((gates[0].lower_left.y + 0.105).abs() < 1e-9);
        assert!((gates[0].upper_right.y - 0.405).abs() < 1e-9);

        assert!((cuts[1].lower_left.x - 0.64).abs() < 1e-9);

        let activ = layout.layer_bbox(layers.activ).unwrap();
        assert!((activ.min.x - 0.0).abs() < 1e-9);
        assert!((activ.max.x - 0.87).abs() < 1e-9);
    }

    #[test]
    fn test_default_nmos_ports() {
        let (layout, layers, _) = build(&DeviceParameters::new(DeviceKind::Nmos));
        let s = layout.port("S").unwrap();
        assert!((s.center.x - 0.15).abs() < 1e-9);
        assert!((s.center.y - 0.15).abs() < 1e-9);
        assert!((s.width - 0.26).abs() < 1e-9);
        assert_eq!(s.orientation, PortOrientation::West);
        assert_eq!(s.layer, layers.metal1_pin);

        let dport = layout.port("D").unwrap();
        assert!((dport.center.x - 0.72).abs() < 1e-9);
        assert!((dport.center.y - s.center.y).abs() < 1e-12);
        assert_eq!(dport.orientation, PortOrientation::East);

        let g = layout.port("G").unwrap();
        assert!((g.center.x - 0.435).abs() < 1e-9);
        assert!((g.center.y - 0.15).abs() < 1e-9);
        assert!((g.width - 0.51).abs() < 1e-9);
        assert_eq!(g.layer, layers.gatpoly_pin);
        assert!(layout.port("TIE").is_none());
    }

    #[test]
    fn test_finger_pitch() {
        let params = DeviceParameters::new(DeviceKind::Nmos)
            .with_width(4.0)
            .with_length(0.2)
            .with_fingers(4);
        let (layout, layers, dims) = build(&params);
        let rules = DesignRuleSet::sg13g2();
        let pitch = dims.finger_pitch(&rules);
        assert!((pitch - (0.16 + 2.0 * 0.11 + 0.2)).abs() < 1e-9);
        let gates = sorted_x0(layout.rects_on_layer(layers.gatpoly));
        assert_eq!(gates.len(), 4);
        for pair in gates.windows(2) {
            assert!((pair[1] - pair[0] - pitch).abs() < 1e-9);
        }
        assert_eq!(layout.rects_on_layer(layers.heat_trans).len(), 4);
    }

    #[test]
    fn test_ports_come_from_first_finger() {
        let params = DeviceParameters::new(DeviceKind::Nmos)
            .with_width(4.0)
            .with_length(0.2)
            .with_fingers(4);
        let (layout, layers, dims) = build(&params);
        assert_eq!(dims.fingers, 4);
        assert_eq!(layout.ports().len(), 3);
        // source 0.07..0.23, gate 0.34..0.54, drain 0.65..0.81
        let g = layout.port("G").unwrap();
        assert!((g.center.x - 0.44).abs() < 1e-9);
        let dport = layout.port("D").unwrap();
        assert!((dport.center.x - 0.73).abs() < 1e-9);
        assert_eq!(layout.rects_on_layer(layers.gatpoly_pin).len(), 1);
        assert_eq!(layout.rects_on_layer(layers.metal1_pin).len(), 2);
    }

    #[test]
    fn test_columns_and_contacts() {
        let params = DeviceParameters::new(DeviceKind::Nmos)
            .with_width(3.0)
            .with_fingers(3);
        let (layout, layers, dims) = build(&params);
        assert!((dims.w - 1.0).abs() < 1e-9);
        assert_eq!(dims.contacts_per_column, 3);
        // four columns of three cuts
        assert_eq!(layout.rects_on_layer(layers.cont).len(), 12);
        assert!(layout.spacing_violations(layers.cont, 0.18).is_empty());

        let activ = layout.layer_bbox(layers.activ).unwrap();
        for cut in layout.rects_on_layer(layers.cont) {
            assert!(activ.contains_bbox(&cut.bbox(), 1e-9));
        }
        // metal1 columns plus source and drain pins on the pin layer
        assert_eq!(layout.rects_on_layer(layers.metal1).len(), 4);
        assert_eq!(layout.rects_on_layer(layers.metal1_pin).len(), 2);
    }

    #[test]
    fn test_gate_contact_spacing() {
        let params = DeviceParameters::new(DeviceKind::Pmos)
            .with_width(2.0)
            .with_fingers(5);
        let (layout, layers, dims) = build(&params);
        let gates = layout.rects_on_layer(layers.gatpoly);
        for cut in layout.rects_on_layer(layers.cont) {
            for gate in &gates {
                assert!(cut.bbox().distance_to(&gate.bbox()) >= dims.gate_cont_dist - 1e-9);
            }
        }
    }

    #[test]
    fn test_pmos_class_layers() {
        let params = DeviceParameters::new(DeviceKind::Pmos).with_width(1.0);
        let (layout, layers, _) = build(&params);
        assert_eq!(layout.rects_on_layer(layers.psd).len(), 1);
        assert_eq!(layout.rects_on_layer(layers.nwell).len(), 1);
        assert!(layout.rects_on_layer(layers.thick_gate_ox).is_empty());

        // bulk marker sits on the last column
        let sub = layout.rects_on_layer(layers.substrate);
        assert_eq!(sub.len(), 1);
        let activ = layout.layer_bbox(layers.activ).unwrap();
        assert!((sub[0].upper_right.x - activ.max.x).abs() < 1e-9);

        // LV pmos draws pin shapes on the drawing layers, ports stay on pins
        assert!(layout.rects_on_layer(layers.metal1_pin).is_empty());
        assert!(layout.rects_on_layer(layers.gatpoly_pin).is_empty());
        assert_eq!(layout.rects_on_layer(layers.gatpoly).len(), 2);
        assert_eq!(layout.port("S").unwrap().layer, layers.metal1_pin);

        let nwell = layout.layer_bbox(layers.nwell).unwrap();
        let psd = layout.layer_bbox(layers.psd).unwrap();
        assert!(nwell.contains_bbox(&activ, 1e-9));
        assert!(psd.contains_bbox(&activ, 1e-9));
    }

    #[test]
    fn test_hv_thick_oxide() {
        let (nhv, layers, _) = build(&DeviceParameters::new(DeviceKind::NmosHv));
        let tgo = nhv.layer_bbox(layers.thick_gate_ox).unwrap();
        let poly = nhv.layer_bbox(layers.gatpoly).unwrap();
        assert!(tgo.contains_bbox(&poly, 1e-9));
        assert!(nhv.rects_on_layer(layers.nwell).is_empty());

        let (phv, layers, _) = build(&DeviceParameters::new(DeviceKind::PmosHv));
        let tgo = phv.layer_bbox(layers.thick_gate_ox).unwrap();
        let nwell = phv.layer_bbox(layers.nwell).unwrap();
        assert!(tgo.contains_bbox(&nwell, 1e-9));
        assert_eq!(phv.rects_on_layer(layers.metal1_pin).len(), 2);
    }

    #[test]
    fn test_narrow_pmos_well_offset() {
        let (layout, layers, dims) = build(&DeviceParameters::new(DeviceKind::Pmos));
        assert!((dims.well_offset - 0.075).abs() < 1e-9);
        let nwell = layout.layer_bbox(layers.nwell).unwrap();
        assert!((nwell.min.y + 0.31).abs() < 1e-9);
        assert!((nwell.max.y - 0.61).abs() < 1e-9);
    }

    #[test]
    fn test_grid_alignment_all_kinds() {
        let tech = Technology::sg13g2();
        let grid = tech.rules.grid();
        for kind in [DeviceKind::Nmos, DeviceKind::Pmos, DeviceKind::NmosHv, DeviceKind::PmosHv] {
            let cases = [(0.15_f64, 0.13_f64, 1), (0.35, 0.5, 1), (7.3, 0.45, 3), (10.0, 1.0, 7)];
            for (w, l, nf) in cases {
                let params = DeviceParameters::new(kind)
                    .with_width(w.max(kind.limits(&tech.rules).min_width))
                    .with_length(l.max(kind.limits(&tech.rules).min_length))
                    .with_fingers(nf);
                let layout = MosBodyBuilder::new(&params, &tech).unwrap().build().unwrap();
                assert!(layout.off_grid_vertices(&grid).is_empty(), "{kind} {w} {l} {nf}");
                for port in layout.ports() {
                    assert_eq!(grid.to_dbu(port.width).map(|u| u % 2), Some(0));
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let params = DeviceParameters::new(DeviceKind::PmosHv)
            .with_width(5.0)
            .with_fingers(4);
        let (a, _, _) = build(&params);
        let (b, _, _) = build(&params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_request_emits_nothing() {
        let tech = Technology::sg13g2();
        let params = DeviceParameters::new(DeviceKind::Nmos).with_width(0.1);
        assert!(MosBodyBuilder::new(&params, &tech).is_err());
    }
}
