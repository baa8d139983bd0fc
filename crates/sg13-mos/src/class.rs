//! Device classes and the per-class offset table.
//!
//! Polarity and voltage class decide which extra layers a MOS body gets and
//! how far they reach. Each combination maps to a row of plain functions in
//! [`body_layers`] and [`rf_isolation`], so every formula can be tested on
//! its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sg13_core::BBox;
use sg13_tech::{DesignRuleSet, DeviceLimits};

use crate::error::MosError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    N,
    P,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoltageClass {
    Lv,
    Hv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceClass {
    pub polarity: Polarity,
    pub voltage: VoltageClass,
    pub rf: bool,
}

/// The eight generator entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Nmos,
    Pmos,
    NmosHv,
    PmosHv,
    Rfnmos,
    Rfpmos,
    RfnmosHv,
    RfpmosHv,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 8] = [
        DeviceKind::Nmos,
        DeviceKind::Pmos,
        DeviceKind::NmosHv,
        DeviceKind::PmosHv,
        DeviceKind::Rfnmos,
        DeviceKind::Rfpmos,
        DeviceKind::RfnmosHv,
        DeviceKind::RfpmosHv,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DeviceKind::Nmos => "nmos",
            DeviceKind::Pmos => "pmos",
            DeviceKind::NmosHv => "nmos_hv",
            DeviceKind::PmosHv => "pmos_hv",
            DeviceKind::Rfnmos => "rfnmos",
            DeviceKind::Rfpmos => "rfpmos",
            DeviceKind::RfnmosHv => "rfnmos_hv",
            DeviceKind::RfpmosHv => "rfpmos_hv",
        }
    }

    pub fn class(&self) -> DeviceClass {
        use Polarity::*;
        use VoltageClass::*;
        let (polarity, voltage, rf) = match self {
            DeviceKind::Nmos => (N, Lv, false),
            DeviceKind::Pmos => (P, Lv, false),
            DeviceKind::NmosHv => (N, Hv, false),
            DeviceKind::PmosHv => (P, Hv, false),
            DeviceKind::Rfnmos => (N, Lv, true),
            DeviceKind::Rfpmos => (P, Lv, true),
            DeviceKind::RfnmosHv => (N, Hv, true),
            DeviceKind::RfpmosHv => (P, Hv, true),
        };
        DeviceClass {
            polarity,
            voltage,
            rf,
        }
    }

    pub fn limits<'a>(&self, rules: &'a DesignRuleSet) -> &'a DeviceLimits {
        let t = &rules.limits;
        match self {
            DeviceKind::Nmos => &t.nmos,
            DeviceKind::Pmos => &t.pmos,
            DeviceKind::NmosHv => &t.nmos_hv,
            DeviceKind::PmosHv => &t.pmos_hv,
            DeviceKind::Rfnmos => &t.rfnmos,
            DeviceKind::Rfpmos => &t.rfpmos,
            DeviceKind::RfnmosHv => &t.rfnmos_hv,
            DeviceKind::RfpmosHv => &t.rfpmos_hv,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceKind {
    type Err = MosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MosError::UnknownName {
                what: "device kind",
                value: s.to_string(),
            })
    }
}

/// Extents of a standard MOS body that the class layers are sized from.
///
/// Diffusion and poly y-extents are unshifted; `diffoffset` is the narrow
/// device centering shift and `well_offset` the extra NWell growth that goes
/// with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyFrame {
    pub diff_x0: f64,
    pub diff_x1: f64,
    pub diff_y0: f64,
    pub diff_y1: f64,
    pub poly_y0: f64,
    pub poly_y1: f64,
    pub diffoffset: f64,
    pub well_offset: f64,
}

pub type LayerRule = fn(&BodyFrame, &DesignRuleSet, VoltageClass) -> BBox;
pub type ContactCount = fn(f64, &DesignRuleSet) -> u32;

/// One row of the standard-body class table.
#[derive(Clone, Copy)]
pub struct BodyLayers {
    pub implant: Option<LayerRule>,
    pub well: Option<LayerRule>,
    pub thick_oxide: Option<LayerRule>,
    /// Marks the last S/D column on the Substrate layer.
    pub bulk_marker: bool,
    /// Pin shapes go on drawing layers instead of pin layers.
    pub pins_on_drawing: bool,
    pub contact_count: ContactCount,
}

pub fn body_layers(polarity: Polarity, voltage: VoltageClass) -> BodyLayers {
    match (polarity, voltage) {
        (Polarity::N, VoltageClass::Lv) => BodyLayers {
            implant: None,
            well: None,
            thick_oxide: None,
            bulk_marker: false,
            pins_on_drawing: false,
            contact_count: nmos_contact_count,
        },
        (Polarity::N, VoltageClass::Hv) => BodyLayers {
            implant: None,
            well: None,
            thick_oxide: Some(nmos_hv_oxide),
            bulk_marker: false,
            pins_on_drawing: false,
            contact_count: nmos_contact_count,
        },
        (Polarity::P, VoltageClass::Lv) => BodyLayers {
            implant: Some(pmos_implant),
            well: Some(pmos_well),
            thick_oxide: None,
            bulk_marker: true,
            pins_on_drawing: true,
            contact_count: pmos_contact_count,
        },
        (Polarity::P, VoltageClass::Hv) => BodyLayers {
            implant: Some(pmos_implant),
            well: Some(pmos_well),
            thick_oxide: Some(pmos_hv_oxide),
            bulk_marker: true,
            pins_on_drawing: false,
            contact_count: pmos_contact_count,
        },
    }
}

fn psd_gate_over(rules: &DesignRuleSet, voltage: VoltageClass) -> f64 {
    match voltage {
        VoltageClass::Lv => rules.mos.psd_gate_over_lv,
        VoltageClass::Hv => rules.mos.psd_gate_over_hv,
    }
}

fn nwell_over(rules: &DesignRuleSet, voltage: VoltageClass) -> f64 {
    match voltage {
        VoltageClass::Lv => rules.mos.nw_activ_over_lv,
        VoltageClass::Hv => rules.mos.nw_activ_over_hv,
    }
}

/// Contacts per S/D column, at least one.
pub fn nmos_contact_count(w: f64, rules: &DesignRuleSet) -> u32 {
    let c = &rules.contact;
    let n = ((w - 2.0 * c.enc_active + c.spacing) / (c.size + c.spacing) + rules.grid.epsilon)
        .floor();
    n.max(1.0) as u32
}

/// Like [`nmos_contact_count`], but the Metal1 endcaps must also fit.
pub fn pmos_contact_count(w: f64, rules: &DesignRuleSet) -> u32 {
    let c = &rules.contact;
    let lcon = w - 2.0 * c.enc_active;
    let n = ((lcon + c.spacing - 2.0 * rules.metal1_endcap()) / (c.size + c.spacing)
        + rules.grid.epsilon)
        .floor();
    n.max(1.0) as u32
}

/// pSD over the diffusion in x and over the gate channel in y.
pub fn pmos_implant(f: &BodyFrame, rules: &DesignRuleSet, voltage: VoltageClass) -> BBox {
    let over_x = rules.mos.psd_activ_over;
    let over_gate = psd_gate_over(rules, voltage);
    let gpo = rules.mos.gatpoly_activ_over;
    BBox::from_corners(
        f.diff_x0 - over_x,
        f.poly_y0 - over_gate + gpo + f.diffoffset,
        f.diff_x1 + over_x,
        f.poly_y1 + over_gate - gpo + f.diffoffset,
    )
}

pub fn pmos_well(f: &BodyFrame, rules: &DesignRuleSet, voltage: VoltageClass) -> BBox {
    let nw = nwell_over(rules, voltage);
    BBox::from_corners(
        f.diff_x0 - nw,
        f.diff_y0 - nw + f.diffoffset - f.well_offset,
        f.diff_x1 + nw,
        f.diff_y1 + nw + f.diffoffset + f.well_offset,
    )
}

/// Standard ThickGateOx margins: over Activ in x, over the poly endcaps in y.
pub fn nmos_hv_oxide(f: &BodyFrame, rules: &DesignRuleSet, _voltage: VoltageClass) -> BBox {
    let m = &rules.mos;
    BBox::from_corners(
        f.diff_x0 - m.tgo_activ,
        f.diff_y0 - m.gatpoly_activ_over - m.tgo_gatpoly,
        f.diff_x1 + m.tgo_activ,
        f.diff_y1 + m.gatpoly_activ_over + m.tgo_gatpoly,
    )
}

/// ThickGateOx of a PMOS-HV body: per axis, the NWell-driven box replaces the
/// standard one when the NWell margin is the larger.
///
/// The y comparison is kept exactly as the reference layout evaluates it;
/// it was matched empirically, not taken from the rule deck.
pub fn pmos_hv_oxide(f: &BodyFrame, rules: &DesignRuleSet, voltage: VoltageClass) -> BBox {
    let m = &rules.mos;
    let nw = nwell_over(rules, voltage);
    let standard = nmos_hv_oxide(f, rules, voltage);
    let (x0, x1) = if nw > m.tgo_activ {
        (f.diff_x0 - nw, f.diff_x1 + nw)
    } else {
        (standard.min.x, standard.max.x)
    };
    let (y0, y1) = if nw + f.diffoffset - f.well_offset > m.gatpoly_activ_over - m.tgo_gatpoly {
        (
            f.diff_y0 - nw + f.diffoffset - f.well_offset,
            f.diff_y1 + nw + f.diffoffset + f.well_offset,
        )
    } else {
        (standard.min.y, standard.max.y)
    };
    BBox::from_corners(x0, y0, x1, y1)
}

/// How pSD is drawn around an RF body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PsdStyle {
    /// A ring of `rf.psd_ring_width` centred on the guard ring.
    Ring { expansion: f64 },
    /// A single rectangle inset inside the guard ring.
    Inset { dx: f64, dy: f64 },
}

/// Substrate isolation of an RF body, as successive margin expansions of the
/// guard-ring box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfIsolation {
    pub psd: PsdStyle,
    pub thick_oxide: Option<f64>,
    pub nwell: Option<f64>,
}

pub fn rf_isolation(
    polarity: Polarity,
    voltage: VoltageClass,
    rules: &DesignRuleSet,
) -> RfIsolation {
    let rf = &rules.rf;
    let hv = voltage == VoltageClass::Hv;
    match polarity {
        Polarity::N => RfIsolation {
            psd: PsdStyle::Ring {
                expansion: (rf.psd_ring_width - rf.guard_ring_width) / 2.0,
            },
            thick_oxide: hv.then_some(rf.tgo_nmos),
            nwell: None,
        },
        Polarity::P => RfIsolation {
            psd: PsdStyle::Inset {
                dx: rf.psd_pmos_inset_x,
                dy: rf.psd_pmos_inset_y,
            },
            thick_oxide: hv.then_some(rf.tgo_pmos),
            nwell: Some(if hv { rf.nw_pmos_hv } else { rf.nw_pmos_lv }),
        },
    }
}

impl RfIsolation {
    /// The box the isolation chain ends on, which is the outermost extent of
    /// the device.
    pub fn outer(&self, guard: BBox) -> BBox {
        let mut cur = match self.psd {
            PsdStyle::Ring { expansion } => guard.expand(expansion, expansion),
            PsdStyle::Inset { .. } => guard,
        };
        if let Some(d) = self.thick_oxide {
            cur = cur.expand(d, d);
        }
        if let Some(d) = self.nwell {
            cur = cur.expand(d, d);
        }
        cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: f64, diffoffset: f64, well_offset: f64) -> BodyFrame {
        BodyFrame {
            diff_x0: 0.0,
            diff_x1: 1.0,
            diff_y0: 0.0,
            diff_y1: w,
            poly_y0: -0.18,
            poly_y1: w + 0.18,
            diffoffset,
            well_offset,
        }
    }

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in DeviceKind::ALL {
            assert_eq!(kind.name().parse::<DeviceKind>().unwrap(), kind);
        }
        assert!("bjt".parse::<DeviceKind>().is_err());
        assert!(DeviceKind::RfpmosHv.class().rf);
        assert_eq!(DeviceKind::NmosHv.class().voltage, VoltageClass::Hv);
    }

    #[test]
    fn test_table_rows() {
        let n = body_layers(Polarity::N, VoltageClass::Lv);
        assert!(n.implant.is_none() && n.well.is_none() && n.thick_oxide.is_none());
        let p = body_layers(Polarity::P, VoltageClass::Lv);
        assert!(p.implant.is_some() && p.well.is_some() && p.pins_on_drawing);
        let phv = body_layers(Polarity::P, VoltageClass::Hv);
        assert!(phv.thick_oxide.is_some() && !phv.pins_on_drawing && phv.bulk_marker);
    }

    #[test]
    fn test_contact_counts() {
        let rules = DesignRuleSet::sg13g2();
        // (1.0 - 0.14 + 0.18) / 0.34 = 3.06
        assert_eq!(nmos_contact_count(1.0, &rules), 3);
        // (1.0 - 0.14 + 0.18 - 0.10) / 0.34 = 2.76
        assert_eq!(pmos_contact_count(1.0, &rules), 2);
        assert_eq!(nmos_contact_count(0.15, &rules), 1);
        assert_eq!(pmos_contact_count(0.15, &rules), 1);
    }

    #[test]
    fn test_pmos_implant() {
        let rules = DesignRuleSet::sg13g2();
        let b = pmos_implant(&frame(1.0, 0.0, 0.0), &rules, VoltageClass::Lv);
        assert!((b.min.x + 0.03).abs() < 1e-12);
        // poly endcap 0.18 traded for the 0.30 gate overlap
        assert!((b.min.y + 0.30).abs() < 1e-12);
        assert!((b.max.y - 1.30).abs() < 1e-12);
    }

    #[test]
    fn test_pmos_well_grows_for_narrow_devices() {
        let rules = DesignRuleSet::sg13g2();
        let wide = pmos_well(&frame(1.0, 0.0, 0.0), &rules, VoltageClass::Lv);
        assert!((wide.min.y + 0.31).abs() < 1e-12);
        let narrow = pmos_well(&frame(0.15, 0.075, 0.075), &rules, VoltageClass::Lv);
        assert!((narrow.min.y + 0.31).abs() < 1e-12);
        assert!((narrow.max.y - (0.15 + 0.31 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn test_nmos_hv_oxide() {
        let rules = DesignRuleSet::sg13g2();
        let b = nmos_hv_oxide(&frame(1.0, 0.0, 0.0), &rules, VoltageClass::Hv);
        assert!((b.min.x + 0.27).abs() < 1e-12);
        assert!((b.min.y + 0.52).abs() < 1e-12);
        assert!((b.max.y - 1.52).abs() < 1e-12);
    }

    #[test]
    fn test_pmos_hv_oxide_larger_margin_wins() {
        let rules = DesignRuleSet::sg13g2();
        let f = frame(1.0, 0.0, 0.0);
        let standard = nmos_hv_oxide(&f, &rules, VoltageClass::Hv);
        let b = pmos_hv_oxide(&f, &rules, VoltageClass::Hv);
        // NWell HV margin 0.62 beats both 0.27 (x) and 0.52 (y)
        assert!((b.min.x + 0.62).abs() < 1e-12);
        assert!((b.min.y + 0.62).abs() < 1e-12);
        assert!(b.min.x < standard.min.x && b.max.y > standard.max.y);

        let mut small_well = rules.clone();
        small_well.mos.nw_activ_over_hv = 0.2;
        let b = pmos_hv_oxide(&f, &small_well, VoltageClass::Hv);
        assert!((b.min.x + 0.27).abs() < 1e-12);
    }

    #[test]
    fn test_rf_isolation_outer() {
        let rules = DesignRuleSet::sg13g2();
        let guard = BBox::from_corners(0.0, 0.0, 1.0, 1.0);
        let n = rf_isolation(Polarity::N, VoltageClass::Lv, &rules);
        assert!((n.outer(guard).min.x + 0.15).abs() < 1e-12);
        let nhv = rf_isolation(Polarity::N, VoltageClass::Hv, &rules);
        assert!((nhv.outer(guard).min.x + 0.42).abs() < 1e-12);
        let phv = rf_isolation(Polarity::P, VoltageClass::Hv, &rules);
        assert!((phv.outer(guard).min.x + 0.93).abs() < 1e-12);
    }
}
