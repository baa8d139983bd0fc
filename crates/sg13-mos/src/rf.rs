//! RF MOS body.
//!
//! Gates run horizontally across one active, stacked bottom to top. The
//! body is wrapped in a gate ring, a guard ring and the substrate isolation
//! layers, and the whole device is then moved so that the outermost layer
//! starts at the origin.

use sg13_core::{
    BBox, Grid, LayerHandle, LayerMap, Layout, LayoutBuilder, Point, PortOrientation, Rect,
};
use sg13_tech::{layers, DesignRuleSet, Technology};

use crate::class::{rf_isolation, DeviceClass, PsdStyle, RfIsolation};
use crate::contacts::ContactRun;
use crate::error::MosResult;
use crate::params::DeviceParameters;
use crate::ports::{derive_port, PortExtent};
use crate::replay::{replay, CommandList};

/// Layer handles used by the RF body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfLayers {
    pub activ: LayerHandle,
    pub gatpoly: LayerHandle,
    pub cont: LayerHandle,
    pub metal1: LayerHandle,
    pub metal1_pin: LayerHandle,
    pub metal2: LayerHandle,
    pub via1: LayerHandle,
    pub psd: LayerHandle,
    pub nwell: LayerHandle,
    pub thick_gate_ox: LayerHandle,
}

impl RfLayers {
    pub fn resolve(map: &LayerMap) -> MosResult<Self> {
        Ok(Self {
            activ: map.drawing(layers::ACTIV)?,
            gatpoly: map.drawing(layers::GATPOLY)?,
            cont: map.drawing(layers::CONT)?,
            metal1: map.drawing(layers::METAL1)?,
            metal1_pin: map.pin(layers::METAL1)?,
            metal2: map.drawing(layers::METAL2)?,
            via1: map.drawing(layers::VIA1)?,
            psd: map.drawing(layers::PSD)?,
            nwell: map.drawing(layers::NWELL)?,
            thick_gate_ox: map.drawing(layers::THICK_GATE_OX)?,
        })
    }
}

/// A rectangular frame of constant width inside `outer`.
///
/// The bottom and top sides span the full width; left and right fill the
/// space between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub outer: BBox,
    pub width: f64,
}

impl Ring {
    pub fn new(outer: BBox, width: f64) -> Self {
        Self { outer, width }
    }

    pub fn bottom(&self) -> BBox {
        let o = &self.outer;
        BBox::from_corners(o.min.x, o.min.y, o.max.x, o.min.y + self.width)
    }

    pub fn top(&self) -> BBox {
        let o = &self.outer;
        BBox::from_corners(o.min.x, o.max.y - self.width, o.max.x, o.max.y)
    }

    pub fn left(&self) -> BBox {
        let o = &self.outer;
        BBox::from_corners(
            o.min.x,
            o.min.y + self.width,
            o.min.x + self.width,
            o.max.y - self.width,
        )
    }

    pub fn right(&self) -> BBox {
        let o = &self.outer;
        BBox::from_corners(
            o.max.x - self.width,
            o.min.y + self.width,
            o.max.x,
            o.max.y - self.width,
        )
    }

    pub fn rects(&self) -> [BBox; 4] {
        [self.bottom(), self.top(), self.left(), self.right()]
    }
}

/// Values derived once from the request, in unshifted body coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfDims {
    pub fingers: u32,
    pub rows: u32,
    /// Per-finger width.
    pub w: f64,
    pub gate_length: f64,
    /// Channel distance between neighbouring gates.
    pub dc: f64,
    /// Active end piece below the first and above the last gate.
    pub ec: f64,
    /// Short-wide adjustment, zero when it does not apply.
    pub dce: f64,
    pub dgatx: f64,
    pub dgaty: f64,
    pub hact: f64,
    /// Gate-stripe margin to the active ends.
    pub stripe_margin: f64,
    /// Outer box of the guard ring.
    pub guard: BBox,
    /// Translation that puts the outermost layer at the origin.
    pub shift: Point,
}

impl RfDims {
    pub fn derive(
        params: &DeviceParameters,
        rules: &DesignRuleSet,
        isolation: &RfIsolation,
    ) -> Self {
        let grid = rules.grid();
        let rf = &rules.rf;
        let fingers = params.fingers.max(1);
        let rows = params.contact_rows.max(1);
        let w = grid.snap(params.width / fingers as f64);
        let gate_length = grid.snap(params.length);

        let r = rows as f64;
        let mut dc = (rf.channel_dist_base + rf.channel_dist_step) * r - rf.channel_dist_step;
        let mut ec = (rf.endpiece_base + rf.endpiece_step) * r - rf.endpiece_step;
        let mut dce = 0.0;
        if gate_length < rf.short_wide_l_threshold && w >= rf.short_wide_w_threshold {
            dce = rf.short_wide_adjust;
            dc += 2.0 * dce;
            ec += dce;
        }

        let dgatx = if rows > 2 {
            rf.active_gate_dist_x_wide
        } else {
            rf.active_gate_dist_x
        };
        let dgaty = rf.active_gate_dist_y;
        let hact = 2.0 * ec + (fingers - 1) as f64 * dc + fingers as f64 * gate_length;
        let stripe_margin = if rows == 1 {
            rf.gate_cont_margin_single
        } else {
            rf.gate_cont_margin_multi
        };

        let xl = -dgatx - rf.gate_ring_width - rf.gate_guard_dist - rf.guard_ring_width;
        let yb = -dgaty - rf.gate_ring_width - rf.gate_guard_dist - rf.guard_ring_width;
        let guard = BBox::from_corners(xl, yb, -xl + w, -yb + hact);
        let outer = isolation.outer(guard);

        Self {
            fingers,
            rows,
            w,
            gate_length,
            dc,
            ec,
            dce,
            dgatx,
            dgaty,
            hact,
            stripe_margin,
            guard,
            shift: Point::new(-outer.min.x, -outer.min.y),
        }
    }

    /// Distance between neighbouring gates and between S/D regions.
    pub fn pitch(&self) -> f64 {
        self.dc + self.gate_length
    }
}

pub struct RfMosBodyBuilder<'a> {
    params: &'a DeviceParameters,
    rules: &'a DesignRuleSet,
    grid: Grid,
    layers: RfLayers,
    class: DeviceClass,
    isolation: RfIsolation,
    dims: RfDims,
}

impl<'a> RfMosBodyBuilder<'a> {
    /// Validates the request and derives the body dimensions.
    pub fn new(params: &'a DeviceParameters, tech: &'a Technology) -> MosResult<Self> {
        params.validate(&tech.rules)?;
        let class = params.kind.class();
        let isolation = rf_isolation(class.polarity, class.voltage, &tech.rules);
        Ok(Self {
            params,
            rules: &tech.rules,
            grid: tech.rules.grid(),
            layers: RfLayers::resolve(&tech.layers)?,
            class,
            isolation,
            dims: RfDims::derive(params, &tech.rules, &isolation),
        })
    }

    pub fn dims(&self) -> &RfDims {
        &self.dims
    }

    fn shifted(&self, bbox: BBox) -> BBox {
        bbox.translate(self.dims.shift.x, self.dims.shift.y)
    }

    fn add(&self, out: &mut LayoutBuilder, layer: LayerHandle, bbox: BBox) {
        out.add_bbox(layer, self.shifted(bbox));
    }

    fn add_run(
        &self,
        out: &mut LayoutBuilder,
        run: &ContactRun,
        p1: Point,
        p2: Point,
    ) -> MosResult<()> {
        let shapes = run.place(&self.grid, p1, p2, self.dims.shift)?;
        out.extend(shapes.into_rects().map(Into::into));
        Ok(())
    }

    pub fn build(&self) -> MosResult<Layout> {
        let d = &self.dims;
        log::debug!(
            "{}: w={} l={} ng={} rows={} guard={} gate_ring={} metal2={}",
            self.params.kind,
            d.w,
            d.gate_length,
            d.fingers,
            d.rows,
            self.params.guard_ring,
            self.params.gate_ring,
            self.params.metal2_overlay
        );
        let mut out = LayoutBuilder::new(self.params.kind.name());

        self.emit_channel(&mut out);

        let region = self.sd_template().render(&self.grid, d.shift)?;
        for k in 0..=d.fingers {
            log::trace!("S/D region {k}");
            out.extend(replay(&region, 0.0, k as f64 * d.pitch()).map(Into::into));
        }
        let (source_pin, drain_pin) = self.emit_sd_pins(&mut out);

        if self.params.gate_ring {
            self.emit_gate_ring(&mut out);
        }
        let gate_pin = self.emit_gate_contacts(&mut out)?;
        let tie = self.emit_guard_ring(&mut out)?;
        self.emit_isolation(&mut out);

        let g = &self.grid;
        let m1 = self.layers.metal1_pin;
        out.add_port(derive_port(
            g,
            "S",
            &source_pin,
            PortOrientation::South,
            PortExtent::Horizontal,
            m1,
        ))?;
        out.add_port(derive_port(
            g,
            "D",
            &drain_pin,
            PortOrientation::South,
            PortExtent::Horizontal,
            m1,
        ))?;
        out.add_port(derive_port(
            g,
            "G",
            &gate_pin,
            PortOrientation::West,
            PortExtent::Vertical,
            m1,
        ))?;
        if let Some((pin, orientation, extent)) = tie {
            out.add_port(derive_port(g, "TIE", &pin, orientation, extent, m1))?;
        }
        Ok(out.finish())
    }

    /// Active, gate fingers and the two poly stripes joining them.
    fn emit_channel(&self, out: &mut LayoutBuilder) {
        let d = &self.dims;
        let wgat = self.rules.rf.gate_ring_width;
        self.add(out, self.layers.activ, BBox::from_corners(0.0, 0.0, d.w, d.hact));
        for i in 0..d.fingers {
            let y = d.ec + i as f64 * d.pitch();
            self.add(
                out,
                self.layers.gatpoly,
                BBox::from_corners(-d.dgatx, y, d.w + d.dgatx, y + d.gate_length),
            );
        }
        let (y0, y1) = (d.stripe_margin, d.hact - d.stripe_margin);
        self.add(
            out,
            self.layers.gatpoly,
            BBox::from_corners(-d.dgatx - wgat, y0, -d.dgatx, y1),
        );
        self.add(
            out,
            self.layers.gatpoly,
            BBox::from_corners(d.w + d.dgatx, y0, d.w + d.dgatx + wgat, y1),
        );
    }

    /// Connecting strip of one S/D region, in unshifted coordinates.
    fn sd_strip(&self) -> BBox {
        let d = &self.dims;
        let rf = &self.rules.rf;
        BBox::from_corners(
            rf.sd_margin_x,
            rf.sd_margin_y,
            d.w - rf.sd_margin_x,
            d.ec - rf.sd_margin_x - d.dce,
        )
    }

    /// Everything drawn in S/D region 0 apart from active and gates.
    pub fn sd_template(&self) -> CommandList {
        let d = &self.dims;
        let rf = &self.rules.rf;
        let c = &self.rules.contact;
        let v = &self.rules.via1;
        let metal_width = c.size + rf.sd_metal_width_over;
        let row_y0 = rf.sd_margin_y + metal_width / 2.0 - v.enc;
        let row_pitch = metal_width - rf.sd_metal_adjust + rf.sd_row_spacing;
        let (x0, x1) = (rf.sd_margin_x, d.w - rf.sd_margin_x);
        let multi_row = d.rows > 1;

        let mut list = CommandList::new();
        let cont_run = ContactRun {
            metal: Some(self.layers.metal1),
            cut: self.layers.cont,
            strip_width: metal_width - rf.sd_metal_adjust,
            cut_size: c.size,
            cut_length: c.size,
            edge_offset: rf.sd_margin_x,
            gap: c.spacing,
        };
        if multi_row {
            list.push_rect(self.layers.metal1, self.sd_strip());
        }
        for row in 0..d.rows {
            let y = row_y0 + row as f64 * row_pitch;
            list.push_run(cont_run, Point::new(x0, y), Point::new(x1, y));
        }

        if self.params.metal2_overlay {
            let via_run = ContactRun {
                metal: Some(self.layers.metal2),
                cut: self.layers.via1,
                strip_width: v.size + v.enc,
                cut_size: v.size,
                cut_length: v.size,
                edge_offset: rf.sd_margin_x,
                gap: self.via_spacing(),
            };
            if multi_row {
                list.push_rect(self.layers.metal2, self.sd_strip());
            }
            for row in 0..d.rows {
                let y = row_y0 + row as f64 * row_pitch;
                list.push_run(via_run, Point::new(x0, y), Point::new(x1, y));
            }
        }
        list
    }

    fn via_spacing(&self) -> f64 {
        let v = &self.rules.via1;
        if self.dims.w < v.width_threshold {
            v.spacing_narrow
        } else {
            v.spacing_wide
        }
    }

    /// Source and drain pins on the first two S/D regions, shifted.
    fn emit_sd_pins(&self, out: &mut LayoutBuilder) -> (BBox, BBox) {
        let source = self.shifted(self.sd_strip());
        let drain = source.translate(0.0, self.dims.pitch());
        out.add_bbox(self.layers.metal1_pin, source);
        out.add_bbox(self.layers.metal1_pin, drain);
        (source, drain)
    }

    fn emit_gate_ring(&self, out: &mut LayoutBuilder) {
        let d = &self.dims;
        let wgat = self.rules.rf.gate_ring_width;
        let outer = BBox::from_corners(
            -d.dgatx - wgat,
            -d.dgaty - wgat,
            d.w + d.dgatx + wgat,
            d.hact + d.dgaty + wgat,
        );
        for side in Ring::new(outer, wgat).rects() {
            self.add(out, self.layers.metal1, side);
        }
    }

    /// Poly-to-metal1 contact runs on both gate stripes; returns the gate pin.
    fn emit_gate_contacts(&self, out: &mut LayoutBuilder) -> MosResult<BBox> {
        let d = &self.dims;
        let rf = &self.rules.rf;
        let v = &self.rules.via1;
        let c = &self.rules.contact;
        let wgat = rf.gate_ring_width;
        let run = ContactRun {
            metal: Some(self.layers.metal1),
            cut: self.layers.cont,
            strip_width: v.size + v.enc,
            cut_size: c.size,
            cut_length: c.size,
            edge_offset: rf.sd_margin_x,
            gap: self.via_spacing(),
        };
        let y0 = d.stripe_margin + rf.gate_cont_offset;
        let y1 = d.hact - d.stripe_margin - rf.gate_cont_offset;
        let left = -d.dgatx - wgat / 2.0;
        let right = d.w + d.dgatx + wgat / 2.0;
        self.add_run(out, &run, Point::new(left, y0), Point::new(left, y1))?;
        self.add_run(out, &run, Point::new(right, y0), Point::new(right, y1))?;

        let half = rf.gate_pin_half_width;
        let pin = self.shifted(BBox::from_corners(left - half, y0, left + half, y1));
        out.add_bbox(self.layers.metal1_pin, pin);
        Ok(pin)
    }

    /// Guard-ring contact rows and columns for the enabled sides, the TIE
    /// pin, and the Activ frame. Returns the TIE pin and how to derive its
    /// port, if the mode has one.
    fn emit_guard_ring(
        &self,
        out: &mut LayoutBuilder,
    ) -> MosResult<Option<(BBox, PortOrientation, PortExtent)>> {
        let d = &self.dims;
        let rf = &self.rules.rf;
        let c = &self.rules.contact;
        let mode = self.params.guard_ring;
        let wguard = rf.guard_ring_width;
        let g = d.guard;
        let row = ContactRun {
            metal: Some(self.layers.metal1),
            cut: self.layers.cont,
            strip_width: rf.guard_ring_m1_width,
            cut_size: c.size,
            cut_length: c.size,
            edge_offset: rf.guard_cont_offset_h,
            gap: c.spacing,
        };
        let column = ContactRun {
            edge_offset: rf.guard_cont_offset_v,
            ..row
        };

        let bottom_y = g.min.y + wguard / 2.0;
        let top_y = g.max.y - wguard / 2.0;
        let left_x = g.min.x + wguard / 2.0;
        let right_x = g.max.x - wguard / 2.0;
        let (col_y0, col_y1) = (g.min.y + wguard, g.max.y - wguard);

        let mut tie = None;
        if mode.has_bottom() {
            self.add_run(out, &row, Point::new(g.min.x, bottom_y), Point::new(g.max.x, bottom_y))?;
            let pin = self.shifted(BBox::from_corners(
                g.min.x,
                bottom_y - wguard / 4.0,
                g.max.x,
                bottom_y + wguard / 4.0,
            ));
            out.add_bbox(self.layers.metal1_pin, pin);
            tie = Some((pin, PortOrientation::South, PortExtent::Vertical));
        }
        if mode.has_top() {
            self.add_run(out, &row, Point::new(g.min.x, top_y), Point::new(g.max.x, top_y))?;
        }
        if mode.has_left() {
            self.add_run(out, &column, Point::new(left_x, col_y0), Point::new(left_x, col_y1))?;
            if tie.is_none() {
                let pin = self.shifted(BBox::from_corners(
                    left_x - wguard / 4.0,
                    col_y0,
                    left_x + wguard / 4.0,
                    col_y1,
                ));
                out.add_bbox(self.layers.metal1_pin, pin);
                tie = Some((pin, PortOrientation::West, PortExtent::Horizontal));
            }
        }
        if mode.has_right() {
            self.add_run(out, &column, Point::new(right_x, col_y0), Point::new(right_x, col_y1))?;
        }

        for side in Ring::new(g, wguard).rects() {
            self.add(out, self.layers.activ, side);
        }
        Ok(tie)
    }

    /// pSD, thick oxide and NWell, each grown from the box before it.
    fn emit_isolation(&self, out: &mut LayoutBuilder) {
        let g = self.dims.guard;
        let rf = &self.rules.rf;
        let iso = &self.isolation;
        let mut cur = match iso.psd {
            PsdStyle::Ring { expansion } => {
                let outer = g.expand(expansion, expansion);
                for side in Ring::new(outer, rf.psd_ring_width).rects() {
                    self.add(out, self.layers.psd, side);
                }
                outer
            }
            PsdStyle::Inset { dx, dy } => {
                self.add(out, self.layers.psd, g.expand(-dx, -dy));
                g
            }
        };
        if let Some(margin) = iso.thick_oxide {
            cur = cur.expand(margin, margin);
            self.add(out, self.layers.thick_gate_ox, cur);
        }
        if let Some(margin) = iso.nwell {
            cur = cur.expand(margin, margin);
            self.add(out, self.layers.nwell, cur);
        }
        log::trace!(
            "{:?} isolation ends at {:.3} x {:.3}",
            self.class.polarity,
            cur.width(),
            cur.height()
        );
    }

    /// Rendered region `k`, as it appears in the finished layout.
    pub fn sd_region(&self, k: u32) -> MosResult<Vec<Rect>> {
        let region = self.sd_template().render(&self.grid, self.dims.shift)?;
        Ok(replay(&region, 0.0, k as f64 * self.dims.pitch()).collect())
    }
}
